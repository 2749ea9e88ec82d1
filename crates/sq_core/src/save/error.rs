use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    #[error("Invalid key: {key}")]
    InvalidKey { key: String },
}

impl StoreError {
    /// Whether a later attempt could succeed without user intervention
    pub fn is_recoverable(&self) -> bool {
        match self {
            StoreError::Io(_) => true,
            StoreError::Unavailable(_) => true,
            StoreError::Serialization(_) => false,
            StoreError::InvalidKey { .. } => false,
        }
    }
}
