//! Entry point: parse configuration, run the scaffold-linkage pipeline
//! end to end, and exit non-zero on any fatal error.

mod alignment;
mod barcode_index;
mod config;
mod errors;
mod graph;
mod grouping;
mod orientation;
mod pairing;
mod reader;
mod scaffold;
mod sequence;
mod shared_barcode;

use std::path::PathBuf;
use std::process::ExitCode;

use log::{info, LevelFilter};

use config::ArcsParams;
use errors::ArcsError;

fn init_logging(verbose: bool) {
    let level = if verbose { LevelFilter::Debug } else { LevelFilter::Info };
    env_logger::Builder::from_default_env()
        .filter_level(level)
        .format_timestamp_secs()
        .init();
}

fn run(params: ArcsParams) -> errors::Result<()> {
    info!("loading scaffold lengths from {}", params.file.display());
    let lengths = scaffold::load_scaffold_lengths(&params.file)?;
    info!("{} scaffolds with a usable identifier", lengths.len());

    let (barcode_index, mult_map) = reader::process_alignment_files(&params, &lengths)?;

    info!("accumulating scaffold pairs");
    let pmap = pairing::build_pair_map(
        &barcode_index,
        &mult_map,
        &lengths,
        params.min_mult,
        params.max_mult,
        params.end_length,
        params.min_reads,
        params.error_percent,
    );
    info!("{} candidate scaffold pairs", pmap.len());

    let mut g = graph::build_graph(&pmap, params.min_links);
    graph::prune_by_weight(&mut g, params.min_links);
    graph::prune_by_degree(&mut g, params.max_degree);

    let graph_path = params
        .original_file
        .clone()
        .unwrap_or_else(|| PathBuf::from(format!("{}_original.gv", params.base_name)));
    graph::write_graph(&graph_path, &g)?;
    info!("wrote graph to {}", graph_path.display());

    let groups_path = PathBuf::from(format!("{}_scaffolds.fa", params.base_name));
    grouping::write_scaffold_groups(&params.file, &groups_path, &g, params.max_grp_size)?;
    info!("wrote grouped scaffolds to {}", groups_path.display());

    Ok(())
}

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();
    let params = match ArcsParams::parse_from(args) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("arcs-link: {e}");
            return ExitCode::FAILURE;
        }
    };

    init_logging(params.verbose);

    match run(params) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("arcs-link: {e}");
            ExitCode::FAILURE
        }
    }
}
