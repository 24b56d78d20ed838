use thiserror::Error;

/// Failure of a single page request against the source API.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("source answered with status {0}")]
    Status(reqwest::StatusCode),
    #[error("malformed page body: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Failure to stage or commit writes against a document store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),
    #[error("document encoding failed: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("batch already holds the maximum of {limit} writes")]
    BatchFull { limit: usize },
    #[error("invalid document id {0:?}")]
    InvalidId(String),
}
