//! Scaffold identifiers and the scaffold length index (C1).

use std::collections::HashMap;
use std::fs::File;
use std::path::Path;

use log::{debug, info};

use crate::errors::{ArcsError, Result};
use crate::sequence::FastaRecords;

/// Mapping scaffold_id -> length in base pairs. Built once from the
/// sequence source, read-only thereafter.
pub type ScaffoldLengths = HashMap<i64, i64>;

/// Concatenate all decimal digits found in `name`, in order, into a
/// non-zero integer. Returns 0 ("no usable identifier") if `name`
/// contains no digits at all.
pub fn scaffold_id(name: &str) -> i64 {
    let digits: String = name.chars().filter(|c| c.is_ascii_digit()).collect();
    digits.parse().unwrap_or(0)
}

/// Build the scaffold length index from a sequence source. Identifier 0
/// ("unmapped" sentinel, or any name with no digits) is skipped. On a
/// duplicate id, the last writer wins.
pub fn load_scaffold_lengths(file: &Path) -> Result<ScaffoldLengths> {
    let reader = File::open(file).map_err(|source| ArcsError::InputOpen {
        path: file.to_path_buf(),
        source,
    })?;

    let mut map = ScaffoldLengths::new();
    let mut seen = 0usize;
    for rec in FastaRecords::new(reader) {
        let rec = rec?;
        seen += 1;
        let id = scaffold_id(&rec.id);
        if id == 0 {
            debug!("skipping scaffold '{}' (no usable identifier)", rec.id);
            continue;
        }
        if let Some(prev) = map.insert(id, rec.seq.len() as i64) {
            debug!("duplicate scaffold id {id}: replacing length {prev} with {}", rec.seq.len());
        }
    }
    info!("loaded {} scaffold sequences ({} with usable ids)", seen, map.len());
    Ok(map)
}
