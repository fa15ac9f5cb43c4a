//! The orientation resolver (C5): turns a barcode's per-scaffold tally
//! into a (valid?, head?) verdict.

use crate::barcode_index::ScaffoldTally;

/// Which end of the scaffold is being queried when resolving a long
/// scaffold's tally (the tagged-variant re-architecture from the design
/// notes, dispatched on scaffold length rather than an untyped flag).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Head,
    Tail,
}

/// Resolve one (barcode, scaffold, side) query into (valid, head?).
///
/// `size` is the scaffold's length; `end_length` and `min_reads` and
/// `error_percent` are read from configuration.
pub fn resolve(
    tally: &ScaffoldTally,
    size: i64,
    side: Side,
    end_length: i64,
    min_reads: i64,
    error_percent: f64,
) -> (bool, bool) {
    if size <= 2 * end_length {
        resolve_short(tally, size, end_length, min_reads, error_percent)
    } else {
        resolve_long(tally, side, min_reads)
    }
}

fn resolve_short(
    tally: &ScaffoldTally,
    size: i64,
    _end_length: i64,
    min_reads: i64,
    error_percent: f64,
) -> (bool, bool) {
    let count = tally.sum_or_tail;
    if count < min_reads {
        return (false, false);
    }
    let avg = tally.head_evidence as f64 / count as f64;
    let percent = avg / size as f64;
    let err = error_percent / 100.0;
    if (percent - 0.5).abs() > err {
        (true, percent < 0.5)
    } else {
        (false, false)
    }
}

fn resolve_long(tally: &ScaffoldTally, side: Side, min_reads: i64) -> (bool, bool) {
    let (c, opposite) = match side {
        Side::Head => (tally.head_evidence, tally.sum_or_tail),
        Side::Tail => (tally.sum_or_tail, tally.head_evidence),
    };
    if c < min_reads {
        return (false, false);
    }
    if opposite >= min_reads {
        // barcode ambiguously anchored to both ends
        return (false, false);
    }
    (true, side == Side::Head)
}

/// Convenience used by the pair accumulator (C6): resolve a scaffold's
/// tally to `Some(head?)` if valid under either queryable side, `None`
/// otherwise. For a short scaffold there's only one meaningful query
/// (the head side always reports invalid by construction); for a long
/// scaffold, at most one of head/tail can ever resolve valid, since a
/// barcode anchored at sufficient strength on both ends is ambiguous by
/// definition (see `resolve_long`).
pub fn resolve_scaffold(
    tally: &ScaffoldTally,
    size: i64,
    end_length: i64,
    min_reads: i64,
    error_percent: f64,
) -> Option<bool> {
    if size <= 2 * end_length {
        let (valid, head) = resolve(tally, size, Side::Head, end_length, min_reads, error_percent);
        return valid.then_some(head);
    }
    let (valid_head, _) = resolve(tally, size, Side::Head, end_length, min_reads, error_percent);
    if valid_head {
        return Some(true);
    }
    let (valid_tail, _) = resolve(tally, size, Side::Tail, end_length, min_reads, error_percent);
    if valid_tail {
        return Some(false);
    }
    None
}
