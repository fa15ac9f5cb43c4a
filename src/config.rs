//! Command-line configuration: a read-only parameter record built once at
//! startup and threaded explicitly through the pipeline (never a mutable
//! global).

use std::path::{Path, PathBuf};

use clap::{Arg, Command};

use crate::errors::{ArcsError, Result};

/// All tunables for one run. Fields mirror the flags named in the
/// configuration table; defaults match the source tool's.
#[derive(Debug, Clone)]
pub struct ArcsParams {
    pub file: PathBuf,
    pub fof_name: PathBuf,
    pub seq_id: f64,
    pub min_reads: i64,
    pub min_links: i64,
    pub min_size: i64,
    pub base_name: String,
    pub original_file: Option<PathBuf>,
    pub min_mult: i64,
    pub max_mult: i64,
    pub max_grp_size: i64,
    pub max_degree: i64,
    pub end_length: i64,
    pub error_percent: f64,
    pub index_len: usize,
    pub verbose: bool,
}

impl ArcsParams {
    /// Parse `argv`, validating that required inputs exist on disk.
    pub fn parse_from<I, T>(argv: I) -> Result<Self>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let matches = Command::new("arcs-link")
            .version("0.1.0")
            .about("Scaffold a draft genome assembly from linked-read alignments")
            .arg(
                Arg::new("file")
                    .short('f')
                    .long("file")
                    .required(true)
                    .help("Assembled scaffold sequences (multi-FASTA)"),
            )
            .arg(
                Arg::new("fofname")
                    .short('a')
                    .long("fofname")
                    .required(true)
                    .help("File of filenames listing name-sorted alignment files"),
            )
            .arg(
                Arg::new("seq_id")
                    .short('s')
                    .long("seq-id")
                    .default_value("90")
                    .value_parser(clap::value_parser!(f64))
                    .help("Minimum percent sequence identity"),
            )
            .arg(
                Arg::new("min_reads")
                    .short('c')
                    .long("min-reads")
                    .default_value("2")
                    .value_parser(clap::value_parser!(i64))
                    .help("Minimum reads per barcode per scaffold-end"),
            )
            .arg(
                Arg::new("min_links")
                    .short('l')
                    .long("min-links")
                    .default_value("5")
                    .value_parser(clap::value_parser!(i64))
                    .help("Minimum links to create an edge (strict >)"),
            )
            .arg(
                Arg::new("min_size")
                    .short('z')
                    .long("min-size")
                    .default_value("500")
                    .value_parser(clap::value_parser!(i64))
                    .help("Minimum scaffold length to consider (bp)"),
            )
            .arg(
                Arg::new("base_name")
                    .short('b')
                    .long("base-name")
                    .help("Output file prefix (derived from -f if omitted)"),
            )
            .arg(
                Arg::new("original_file")
                    .short('o')
                    .long("original-file")
                    .help("Path to a pre-existing graph file to reuse"),
            )
            .arg(
                Arg::new("mult")
                    .short('m')
                    .long("mult")
                    .default_value("1000-2000")
                    .help("Accepted barcode multiplicity range, min-max"),
            )
            .arg(
                Arg::new("max_grp_size")
                    .short('g')
                    .long("max-group-size")
                    .default_value("100")
                    .value_parser(clap::value_parser!(i64))
                    .help("Maximum scaffolds in an emitted group"),
            )
            .arg(
                Arg::new("max_degree")
                    .short('d')
                    .long("max-degree")
                    .default_value("0")
                    .value_parser(clap::value_parser!(i64))
                    .help("Maximum graph degree; 0 disables pruning"),
            )
            .arg(
                Arg::new("end_length")
                    .short('e')
                    .long("end-length")
                    .required(true)
                    .value_parser(clap::value_parser!(i64))
                    .help("Length (bp) of each scaffold end considered"),
            )
            .arg(
                Arg::new("error_percent")
                    .short('r')
                    .long("error-percent")
                    .default_value("0")
                    .value_parser(clap::value_parser!(f64))
                    .help("Short-scaffold mid-tolerance band (%)"),
            )
            .arg(
                Arg::new("index_len")
                    .short('i')
                    .long("index-len")
                    .default_value("14")
                    .value_parser(clap::value_parser!(usize))
                    .help("Barcode length"),
            )
            .arg(
                Arg::new("verbose")
                    .short('v')
                    .long("verbose")
                    .action(clap::ArgAction::SetTrue)
                    .help("Enable verbose (debug-level) logging"),
            )
            .try_get_matches_from(argv)
            .map_err(|e| ArcsError::Configuration(e.to_string()))?;

        let file = PathBuf::from(matches.get_one::<String>("file").unwrap());
        let fof_name = PathBuf::from(matches.get_one::<String>("fofname").unwrap());

        check_exists(&file)?;
        check_exists(&fof_name)?;

        let (min_mult, max_mult) = parse_mult_range(matches.get_one::<String>("mult").unwrap())?;

        let seq_id = *matches.get_one::<f64>("seq_id").unwrap();
        let min_reads = *matches.get_one::<i64>("min_reads").unwrap();
        let min_links = *matches.get_one::<i64>("min_links").unwrap();
        let min_size = *matches.get_one::<i64>("min_size").unwrap();
        let max_grp_size = *matches.get_one::<i64>("max_grp_size").unwrap();
        let max_degree = *matches.get_one::<i64>("max_degree").unwrap();
        let end_length = *matches.get_one::<i64>("end_length").unwrap();
        let error_percent = *matches.get_one::<f64>("error_percent").unwrap();
        let index_len = *matches.get_one::<usize>("index_len").unwrap();
        let verbose = matches.get_flag("verbose");

        let original_file = matches
            .get_one::<String>("original_file")
            .map(PathBuf::from);

        let base_name = matches
            .get_one::<String>("base_name")
            .cloned()
            .unwrap_or_else(|| derive_base_name(&file, min_links, seq_id, min_reads, max_degree, error_percent, end_length));

        Ok(ArcsParams {
            file,
            fof_name,
            seq_id,
            min_reads,
            min_links,
            min_size,
            base_name,
            original_file,
            min_mult,
            max_mult,
            max_grp_size,
            max_degree,
            end_length,
            error_percent,
            index_len,
            verbose,
        })
    }
}

fn check_exists(path: &Path) -> Result<()> {
    if !path.exists() {
        return Err(ArcsError::InputOpen {
            path: path.to_path_buf(),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        });
    }
    Ok(())
}

fn parse_mult_range(raw: &str) -> Result<(i64, i64)> {
    let (lo, hi) = raw
        .split_once('-')
        .ok_or_else(|| ArcsError::Configuration(format!("-m expects min-max, got '{raw}'")))?;
    let lo: i64 = lo
        .trim()
        .parse()
        .map_err(|_| ArcsError::Configuration(format!("invalid multiplicity minimum in '{raw}'")))?;
    let hi: i64 = hi
        .trim()
        .parse()
        .map_err(|_| ArcsError::Configuration(format!("invalid multiplicity maximum in '{raw}'")))?;
    Ok((lo, hi))
}

fn derive_base_name(
    file: &Path,
    min_links: i64,
    seq_id: f64,
    min_reads: i64,
    max_degree: i64,
    error_percent: f64,
    end_length: i64,
) -> String {
    format!(
        "{}.scaff_l{}_s{}_c{}_d{}_r{}_e{}",
        file.display(),
        min_links,
        seq_id,
        min_reads,
        max_degree,
        error_percent,
        end_length
    )
}
