use thiserror::Error;

#[derive(Debug, Error)]
pub enum IoError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// Upstream text without the expected wrapper, or a body that does not parse.
    #[error("malformed upstream payload: {0}")]
    MalformedPayload(String),
}
