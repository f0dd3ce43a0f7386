//! Error types for fetching and storing rates.

/// Failures talking to the rate source.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("Request timed out")]
    Timeout,

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),
}

/// Failures of the observation store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Schema error: {0}")]
    Schema(String),

    #[error("Write error: {0}")]
    Write(String),

    #[error("Read error: {0}")]
    Read(String),
}

/// Failures that abort a tracking run.
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error("Failed to prepare database: {0}")]
    Schema(#[source] StoreError),

    #[error("Failed to fetch rates: {0}")]
    Fetch(#[from] FetchError),
}
