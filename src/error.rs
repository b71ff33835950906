use thiserror::Error;

/// Failures of the fetch/parse half of the pipeline. Unparsable cells are not
/// errors at all (the field stays unset) and persistence failures are logged
/// and rolled back inside the store.
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("timed out fetching {url}")]
    FetchTimeout { url: String },

    #[error("fetching {url} failed: {reason}")]
    Fetch { url: String, reason: String },

    #[error("no player rows found at {url}")]
    ParseEmpty { url: String },

    #[error("http client error: {0}")]
    Client(#[from] reqwest::Error),
}

impl ScrapeError {
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ScrapeError::FetchTimeout { .. } | ScrapeError::Fetch { .. }
        )
    }
}

pub type Result<T> = core::result::Result<T, ScrapeError>;
