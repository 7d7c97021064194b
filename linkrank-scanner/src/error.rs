use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("HTTP status {status} for {url}")]
    HttpStatus { url: String, status: u16 },

    #[error("Invalid start URL: {0}")]
    InvalidStartUrl(String),

    #[error("Page budget must be at least 1")]
    InvalidBudget,

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Other error: {0}")]
    Other(String),
}

impl ScanError {
    /// Fetch failures are skipped by the crawler instead of aborting it.
    pub fn is_fetch_failure(&self) -> bool {
        matches!(self, ScanError::HttpError(_) | ScanError::HttpStatus { .. })
    }
}

pub type Result<T> = std::result::Result<T, ScanError>;
