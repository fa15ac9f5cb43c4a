//! Orchestrates the alignment pair-joiner (C2) across every file named in
//! the file-of-filenames, carrying the barcode index (C3), multiplicity
//! map (C4) and pending-observation state across file boundaries.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use log::{debug, info};

use crate::alignment::{AlignmentPairJoiner, StepOutcome};
use crate::barcode_index::{apply_observation, BarcodeIndex, MultiplicityMap};
use crate::config::ArcsParams;
use crate::errors::{ArcsError, Result};
use crate::scaffold::ScaffoldLengths;

fn read_fof(fof_name: &Path) -> Result<Vec<String>> {
    let file = File::open(fof_name).map_err(|source| ArcsError::InputOpen {
        path: fof_name.to_path_buf(),
        source,
    })?;
    let mut paths = Vec::new();
    for line in BufReader::new(file).lines() {
        let line = line.map_err(|source| ArcsError::InputOpen {
            path: fof_name.to_path_buf(),
            source,
        })?;
        let line = line.trim();
        if !line.is_empty() {
            paths.push(line.to_string());
        }
    }
    Ok(paths)
}

/// Stream every alignment file named in `params.fof_name`, in order,
/// accumulating into a single barcode index and multiplicity map. State
/// (the pair-joiner, including any pending observation) carries across
/// files, per spec.
pub fn process_alignment_files(
    params: &ArcsParams,
    lengths: &ScaffoldLengths,
) -> Result<(BarcodeIndex, MultiplicityMap)> {
    let alignment_files = read_fof(&params.fof_name)?;
    info!("processing {} alignment file(s)", alignment_files.len());

    let mut joiner = AlignmentPairJoiner::new(params.seq_id, params.index_len);
    let mut barcode_index = BarcodeIndex::new();
    let mut mult_map = MultiplicityMap::new();

    for path_str in &alignment_files {
        info!("reading alignment file {path_str}");
        let path = Path::new(path_str);
        let file = File::open(path).map_err(|source| ArcsError::InputOpen {
            path: path.to_path_buf(),
            source,
        })?;

        let mut line_count = 0usize;
        for line in BufReader::new(file).lines() {
            let line = line.map_err(|source| ArcsError::InputOpen {
                path: path.to_path_buf(),
                source,
            })?;
            if line.starts_with('@') {
                continue;
            }
            line_count += 1;

            match joiner.feed(&line, &mut mult_map, path_str)? {
                StepOutcome::Commit(obs) => {
                    apply_observation(&mut barcode_index, lengths, &obs, params.min_size, params.end_length);
                }
                StepOutcome::NoCommit => {}
            }

            if params.verbose && line_count % 10_000_000 == 0 {
                debug!("{path_str}: {line_count} records processed");
            }
        }
        info!("{path_str}: {line_count} alignment records processed");
    }

    joiner.finish();

    info!(
        "barcode index has {} barcodes; multiplicity map has {} barcodes",
        barcode_index.len(),
        mult_map.len()
    );

    Ok((barcode_index, mult_map))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(name_hint: &str, contents: &str) -> std::path::PathBuf {
        let mut path = std::env::temp_dir();
        path.push(format!("arcs_link_reader_test_{}_{}.txt", std::process::id(), name_hint));
        let mut f = File::create(&path).unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn commutative_across_files_when_each_individually_sorted() {
        let aln_a = "pairA_ACGTACGTACGTAA\t99\tscaf1\t100\t60\t8M\t=\t200\t108\tACGTACGT\tIIIIIIII\n\
pairA_ACGTACGTACGTAA\t147\tscaf1\t200\t60\t8M\t=\t100\t-108\tACGTACGT\tIIIIIIII\n";
        let aln_b = "pairB_ACGTACGTACGTAA\t99\tscaf1\t300\t60\t8M\t=\t400\t108\tACGTACGT\tIIIIIIII\n\
pairB_ACGTACGTACGTAA\t147\tscaf1\t400\t60\t8M\t=\t300\t-108\tACGTACGT\tIIIIIIII\n";

        let file_a = write_temp("a", aln_a);
        let file_b = write_temp("b", aln_b);

        let fof_forward = write_temp("fof_fwd", &format!("{}\n{}\n", file_a.display(), file_b.display()));
        let fof_backward = write_temp("fof_bwd", &format!("{}\n{}\n", file_b.display(), file_a.display()));

        let mut lengths = ScaffoldLengths::new();
        lengths.insert(1, 10_000);

        let params_fwd = ArcsParams {
            file: file_a.clone(),
            fof_name: fof_forward,
            seq_id: 90.0,
            min_reads: 1,
            min_links: 5,
            min_size: 500,
            base_name: "x".to_string(),
            original_file: None,
            min_mult: 0,
            max_mult: 1_000_000,
            max_grp_size: 100,
            max_degree: 0,
            end_length: 1000,
            error_percent: 0.0,
            index_len: 14,
            verbose: false,
        };
        let mut params_bwd = params_fwd.clone();
        params_bwd.fof_name = fof_backward;

        let (idx_fwd, mult_fwd) = process_alignment_files(&params_fwd, &lengths).unwrap();
        let (idx_bwd, mult_bwd) = process_alignment_files(&params_bwd, &lengths).unwrap();

        assert_eq!(idx_fwd.len(), idx_bwd.len());
        assert_eq!(mult_fwd, mult_bwd);

        std::fs::remove_file(&file_a).ok();
        std::fs::remove_file(&file_b).ok();
        std::fs::remove_file(&params_fwd.fof_name).ok();
        std::fs::remove_file(&params_bwd.fof_name).ok();
    }
}
