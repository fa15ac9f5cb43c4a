//! The barcode-to-scaffold index (C3) and barcode multiplicity index (C4).
//!
//! A barcode's per-scaffold tally reuses one physical container for two
//! different semantics depending on scaffold length: for short scaffolds
//! `head_evidence` accumulates a *sum* of mid-positions and `sum_or_tail`
//! counts how many reads contributed to that sum; for long scaffolds
//! `head_evidence`/`sum_or_tail` are themselves head/tail *counts*. The
//! orientation resolver (C5) is what knows which interpretation applies.

use std::collections::HashMap;

/// One barcode's accumulated evidence for one scaffold. Field meaning
/// depends on whether the scaffold is "short" (`length <= 2*end_length`)
/// or "long" — see module docs and the orientation resolver.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScaffoldTally {
    pub head_evidence: i64,
    pub sum_or_tail: i64,
}

/// barcode -> (scaffold_id -> tally). Grows monotonically while the
/// alignment streams are consumed.
pub type BarcodeIndex = HashMap<String, HashMap<i64, ScaffoldTally>>;

/// barcode -> count of alignment records bearing that barcode, independent
/// of whether any observation involving it was ever accepted.
pub type MultiplicityMap = HashMap<String, i64>;

/// A single accepted pair observation, staged by the pair-joiner (C2) and
/// applied to the barcode index on commit.
#[derive(Debug, Clone)]
pub struct PendingObservation {
    pub barcode: String,
    pub scaffold_id: i64,
    pub mid_pos: i64,
}

/// Apply one committed observation to the barcode index, per the
/// short/long scaffold rules. `min_size` and `end_length` are read from
/// configuration; scaffolds shorter than `min_size`, or whose length is
/// unknown, are discarded without creating an entry.
pub fn apply_observation(
    index: &mut BarcodeIndex,
    lengths: &HashMap<i64, i64>,
    obs: &PendingObservation,
    min_size: i64,
    end_length: i64,
) {
    let Some(&size) = lengths.get(&obs.scaffold_id) else {
        return;
    };
    if size < min_size {
        return;
    }

    // Don't materialize a barcode-index entry until we know something will
    // actually be recorded into it: a long scaffold's ambiguous middle
    // region is a true discard, not a zero-valued entry, per spec.
    if size <= 2 * end_length {
        // Short scaffold: head_evidence accumulates a position sum;
        // sum_or_tail counts how many reads contributed.
        let tally = index.entry(obs.barcode.clone()).or_default().entry(obs.scaffold_id).or_default();
        tally.head_evidence += obs.mid_pos;
        tally.sum_or_tail += 1;
    } else if obs.mid_pos <= end_length {
        let tally = index.entry(obs.barcode.clone()).or_default().entry(obs.scaffold_id).or_default();
        tally.head_evidence += 1;
    } else if obs.mid_pos >= size - end_length {
        let tally = index.entry(obs.barcode.clone()).or_default().entry(obs.scaffold_id).or_default();
        tally.sum_or_tail += 1;
    }
    // else: falls in the ambiguous middle region of a long scaffold, discard.
}
