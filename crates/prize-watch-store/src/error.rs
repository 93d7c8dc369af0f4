use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("store document is not valid JSON: {0}")]
    Serialize(#[from] serde_json::Error),
}
