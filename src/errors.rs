//! Fatal error taxonomy for the scaffold-linkage pipeline.

use std::path::PathBuf;
use thiserror::Error;

/// The four fatal error kinds the pipeline can surface. All are terminal:
/// the caller prints the message and exits non-zero.
#[derive(Debug, Error)]
pub enum ArcsError {
    #[error("could not open {path}: {source}")]
    InputOpen {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {what} at {path}: {detail}")]
    InputParse {
        path: PathBuf,
        what: &'static str,
        detail: String,
    },

    #[error("input not name-sorted: previous read '{prev}', current read '{curr}' in {path}")]
    ProtocolViolation {
        path: PathBuf,
        prev: String,
        curr: String,
    },

    #[error("configuration error: {0}")]
    Configuration(String),
}

pub type Result<T> = std::result::Result<T, ArcsError>;
