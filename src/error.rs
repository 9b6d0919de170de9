use std::path::PathBuf;
use thiserror::Error;

/// Failure of a single upstream call. The harvest loop treats every variant except
/// `Cancelled` as "zero items for this query".
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("network error: {0}")]
    Network(String),

    #[error("upstream returned status {status} for {url}")]
    Status { status: u16, url: String },

    #[error("malformed payload: {0}")]
    Parse(String),

    #[error("cancelled")]
    Cancelled,
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        FetchError::Network(err.to_string())
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(err: serde_json::Error) -> Self {
        FetchError::Parse(err.to_string())
    }
}

/// A prior dataset exists but cannot be used. Always fatal at startup.
#[derive(Debug, Error)]
pub enum ResumeError {
    #[error("cannot read prior dataset {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("prior dataset {path} is corrupt at line {line}: {message}")]
    Corrupt { path: PathBuf, line: u64, message: String },
}
