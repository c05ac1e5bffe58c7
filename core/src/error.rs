use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NormalizeError {
    /// Something other than a string reached the normalizer.
    #[error("input text must be a string, got {found}")]
    InvalidInputType { found: &'static str },

    /// A custom dictionary could not be compiled into a matcher.
    #[error("dictionary of {entries} entries cannot be compiled: {source}")]
    Dictionary {
        entries: usize,
        #[source]
        source: regex::Error,
    },
}

/// Startup failures. None of these are retried: a process that cannot load
/// its artifacts must not serve queries.
#[derive(Debug, Error)]
pub enum ModelLoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed term-weighting bundle {path}: {source}")]
    Bundle {
        path: PathBuf,
        #[source]
        source: bincode::Error,
    },

    #[error("malformed dataset record at {path}:{line}: {source}")]
    Dataset {
        path: PathBuf,
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("unsupported bundle version {found} (expected {expected})")]
    Version { found: u32, expected: u32 },

    #[error("inconsistent artifacts: {0}")]
    Inconsistent(String),
}
