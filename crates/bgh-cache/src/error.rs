/// Errors from the live store.
#[derive(Debug, Clone)]
pub enum StoreError {
    /// Backing driver refused or dropped the operation.
    Unavailable(String),
    /// Stored payload could not be encoded or decoded.
    Codec(String),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unavailable(s) => write!(f, "live store unavailable: {}", s),
            Self::Codec(s) => write!(f, "live store codec: {}", s),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<redis::RedisError> for StoreError {
    fn from(e: redis::RedisError) -> Self {
        Self::Unavailable(e.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        Self::Codec(e.to_string())
    }
}
