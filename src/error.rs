use thiserror::Error;

/// Why a single request to the market-data service produced nothing usable.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request error: {0}")]
    Request(#[from] reqwest::Error),

    #[error("HTTP {0}")]
    Status(u16),

    #[error("malformed response: {0}")]
    Malformed(String),

    #[error("no data: {0}")]
    NotFound(String),

    #[error("invalid ticker {0:?}")]
    InvalidTicker(String),
}

/// A per-ticker failure. Never fatal: the ticker is dropped from the run.
#[derive(Debug, Error)]
#[error("failed to fetch {ticker}: {error}")]
pub struct FetchFailure {
    pub ticker: String,
    #[source]
    pub error: FetchError,
}

impl FetchFailure {
    pub fn new(ticker: impl Into<String>, error: FetchError) -> Self {
        Self {
            ticker: ticker.into(),
            error,
        }
    }
}
