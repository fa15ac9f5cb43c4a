//! The alignment pair-joiner (C2): a streaming state machine over
//! name-sorted SAM-text records that distills accepted mate pairs into
//! (barcode, scaffold, mid-position) observations.

use crate::barcode_index::{MultiplicityMap, PendingObservation};
use crate::errors::{ArcsError, Result};
use crate::scaffold::scaffold_id;

/// SAM flags that mark a primary alignment of a proper read pair.
const ACCEPTED_FLAGS: [i64; 4] = [83, 99, 147, 163];

fn is_accepted_flag(flag: i64) -> bool {
    ACCEPTED_FLAGS.contains(&flag)
}

/// One parsed alignment line: the eleven SAM columns the pipeline uses,
/// plus the raw line for the `NM:i:` substring scan.
#[derive(Debug, Clone)]
pub struct AlignmentRecord<'a> {
    pub read_name: &'a str,
    pub flag: i64,
    pub reference_name: &'a str,
    pub pos: i64,
    pub cigar: &'a str,
    pub seq: &'a str,
    pub raw_line: &'a str,
}

impl<'a> AlignmentRecord<'a> {
    /// Parse one non-header SAM line. Returns `None` if it doesn't carry
    /// at least the first eleven whitespace-separated columns.
    pub fn parse(line: &'a str) -> Option<Self> {
        let mut cols = line.split_whitespace();
        let read_name = cols.next()?;
        let flag: i64 = cols.next()?.parse().ok()?;
        let reference_name = cols.next()?;
        let pos: i64 = cols.next()?.parse().ok()?;
        let _mapping_quality = cols.next()?;
        let cigar = cols.next()?;
        let _rnext = cols.next()?;
        let _pnext = cols.next()?;
        let _tlen = cols.next()?;
        let seq = cols.next()?;
        let _quality = cols.next()?;
        Some(AlignmentRecord {
            read_name,
            flag,
            reference_name,
            pos,
            cigar,
            seq,
            raw_line: line,
        })
    }
}

/// Walk a CIGAR string, summing the integer of every `M`/`=`/`X`/`I` token
/// into the query-aligned length. Other ops are skipped (their integer is
/// still consumed, just not added).
fn query_aligned_length(cigar: &str) -> i64 {
    let mut qalen = 0i64;
    let mut acc = 0i64;
    for c in cigar.chars() {
        if let Some(d) = c.to_digit(10) {
            acc = acc * 10 + d as i64;
        } else {
            if matches!(c, 'M' | '=' | 'X' | 'I') {
                qalen += acc;
            }
            acc = 0;
        }
    }
    qalen
}

/// Extract the integer following the first `NM:i:` substring anywhere in
/// the raw line. 0 if the tag is absent or malformed.
fn edit_distance(raw_line: &str) -> i64 {
    let Some(idx) = raw_line.find("NM:i:") else {
        return 0;
    };
    let rest = &raw_line[idx + "NM:i:".len()..];
    let digits: String = rest
        .chars()
        .take_while(|c| c.is_ascii_digit() || *c == '-')
        .collect();
    digits.parse().unwrap_or(0)
}

/// Percent sequence identity: `(qalen - edit_dist) / |seq| * 100`, or 0
/// when `qalen == 0`.
pub fn sequence_identity(raw_line: &str, cigar: &str, seq: &str) -> f64 {
    let qalen = query_aligned_length(cigar);
    if qalen == 0 {
        return 0.0;
    }
    let edit_dist = edit_distance(raw_line);
    ((qalen - edit_dist) as f64 / seq.len() as f64) * 100.0
}

/// Split `read_name` at its first `_`; the suffix must be exactly
/// `index_len` characters from {A,T,G,C} after upper-casing, else the
/// barcode is empty.
pub fn extract_barcode(read_name: &str, index_len: usize) -> Option<String> {
    let (_, suffix) = read_name.split_once('_')?;
    if suffix.chars().count() != index_len {
        return None;
    }
    let upper = suffix.to_uppercase();
    if upper.chars().all(|c| matches!(c, 'A' | 'T' | 'G' | 'C')) {
        Some(upper)
    } else {
        None
    }
}

#[derive(Debug, Clone)]
struct PrevRecord {
    name: String,
    si: f64,
    flag: i64,
    scaffold: i64,
    pos: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PairState {
    ExpectFirst,
    ExpectSecond,
}

/// The streaming pair-joiner. One instance carries state across every
/// alignment file named in the file-of-filenames, per spec: "state ...
/// carries across sources".
pub struct AlignmentPairJoiner {
    state: PairState,
    prev: Option<PrevRecord>,
    pending: Option<PendingObservation>,
    seq_id_threshold: f64,
    index_len: usize,
}

/// Outcome of feeding one alignment line to the joiner.
pub enum StepOutcome {
    /// No observation was committed this step.
    NoCommit,
    /// A previously staged observation was just committed.
    Commit(PendingObservation),
}

impl AlignmentPairJoiner {
    pub fn new(seq_id_threshold: f64, index_len: usize) -> Self {
        AlignmentPairJoiner {
            state: PairState::ExpectFirst,
            prev: None,
            pending: None,
            seq_id_threshold,
            index_len,
        }
    }

    /// Feed one non-header line. `mult_map` is updated with the current
    /// record's barcode regardless of acceptance, per spec. `source_name`
    /// is used only to name the offending records on a protocol violation.
    pub fn feed(
        &mut self,
        line: &str,
        mult_map: &mut MultiplicityMap,
        source_name: &str,
    ) -> Result<StepOutcome> {
        let Some(rec) = AlignmentRecord::parse(line) else {
            return Ok(StepOutcome::NoCommit);
        };

        let barcode = extract_barcode(rec.read_name, self.index_len);
        if let Some(bc) = &barcode {
            *mult_map.entry(bc.clone()).or_insert(0) += 1;
        }

        let si = sequence_identity(rec.raw_line, rec.cigar, rec.seq);
        let scaffold = scaffold_id(rec.reference_name);

        match self.state {
            PairState::ExpectFirst => {
                let is_new_name = self
                    .prev
                    .as_ref()
                    .map(|p| p.name != rec.read_name)
                    .unwrap_or(true);
                if is_new_name {
                    let committed = self.pending.take();
                    self.prev = Some(PrevRecord {
                        name: rec.read_name.to_string(),
                        si,
                        flag: rec.flag,
                        scaffold,
                        pos: rec.pos,
                    });
                    self.state = PairState::ExpectSecond;
                    Ok(match committed {
                        Some(obs) => StepOutcome::Commit(obs),
                        None => StepOutcome::NoCommit,
                    })
                } else {
                    // Three (or more) consecutive records sharing a name:
                    // drop any staged pending observation and stay put so
                    // the next record is treated as a fresh first-of-pair.
                    self.pending = None;
                    Ok(StepOutcome::NoCommit)
                }
            }
            PairState::ExpectSecond => {
                let prev = self.prev.as_ref().expect("ExpectSecond implies prev is set");
                if prev.name != rec.read_name {
                    return Err(ArcsError::ProtocolViolation {
                        path: source_name.into(),
                        prev: prev.name.clone(),
                        curr: rec.read_name.to_string(),
                    });
                }

                if !rec.seq.is_empty()
                    && is_accepted_flag(rec.flag)
                    && is_accepted_flag(prev.flag)
                    && si >= self.seq_id_threshold
                    && prev.si >= self.seq_id_threshold
                    && prev.scaffold == scaffold
                    && scaffold != 0
                {
                    if let Some(bc) = barcode {
                        self.pending = Some(PendingObservation {
                            barcode: bc,
                            scaffold_id: scaffold,
                            mid_pos: (prev.pos + rec.pos) / 2,
                        });
                    }
                }

                self.state = PairState::ExpectFirst;
                Ok(StepOutcome::NoCommit)
            }
        }
    }

    /// Any pending observation still staged at end-of-stream is discarded,
    /// never committed, per spec.
    pub fn finish(self) {}
}
