//! Error types for the chronoroute crate

use thiserror::Error;

/// Main error type for the chronoroute crate
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    #[error("illegal action: no edge '{direction}' leaving location '{location}'")]
    IllegalAction { location: String, direction: String },

    #[error("no actions available at location '{location}'")]
    NoActionsAvailable { location: String },

    #[error(
        "duration table mismatch on edge {origin} -> {target}: expected {expected} entries, got {got}"
    )]
    DurationTableMismatch {
        origin: String,
        target: String,
        expected: usize,
        got: usize,
    },

    #[error("time scale must be strictly increasing (offending index {index})")]
    NonIncreasingTimeScale { index: usize },

    #[error("no location named '{name}' in the environment")]
    NonexistentLocation { name: String },

    #[error("duplicate location '{name}' in the environment")]
    DuplicateLocation { name: String },

    #[error("malformed duration matrix at row {row}: {message}")]
    MalformedMatrix { row: usize, message: String },

    #[error("degenerate polynomial regression of degree {degree} (singular system)")]
    DegenerateRegression { degree: usize },

    #[error("invalid configuration: {message}")]
    InvalidConfiguration { message: String },

    #[error("failed to {operation}: {source}")]
    Io {
        operation: String,
        #[source]
        source: std::io::Error,
    },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("progress bar template error: {message}")]
    ProgressBarTemplate { message: String },
}

/// Convenience type alias for Results using the crate's Error type
pub type Result<T> = std::result::Result<T, Error>;

impl From<std::io::Error> for Error {
    fn from(source: std::io::Error) -> Self {
        Error::Io {
            operation: "IO operation".to_string(),
            source,
        }
    }
}
