use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TrafficError {
    #[error("HTTP transport error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{endpoint} responded with {status}")]
    Status {
        endpoint: String,
        status: reqwest::StatusCode,
    },

    #[error("I/O error: {source} (path: {path})")]
    Io {
        source: std::io::Error,
        path: PathBuf,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("schema mismatch in {path}: expected columns {expected:?}, found {found:?}")]
    Schema {
        path: PathBuf,
        expected: Vec<String>,
        found: Vec<String>,
    },

    #[error("bad row {line} in {path}: {reason}")]
    Row {
        path: PathBuf,
        line: u64,
        reason: String,
    },

    #[error("unparsable date '{0}'")]
    Date(String),

    #[error("chart rendering failed: {0}")]
    Chart(#[from] image::ImageError),

    #[error("missing configuration: {0} is not set")]
    MissingConfig(&'static str),
}

impl TrafficError {
    pub fn io(source: std::io::Error, path: impl Into<PathBuf>) -> Self {
        TrafficError::Io {
            source,
            path: path.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, TrafficError>;
