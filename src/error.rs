use std::path::PathBuf;

use thiserror::Error;

/// Failures while building the snapshot table. All of them are fatal at startup.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("input file not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("schema mismatch at line {line}: expected {expected} columns, found {found}")]
    Schema {
        line: u64,
        expected: usize,
        found: usize,
    },

    #[error("input file has no header row")]
    MissingHeader,

    #[error("line {line}, column {column}: cannot parse {value:?} as {expected}")]
    Parse {
        line: u64,
        column: &'static str,
        value: String,
        expected: &'static str,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),
}
