//! Error types for state store operations.

use thiserror::Error;

/// Result type alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur against the local state store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Connection could not be established at startup.
    #[error("store connection error: {0}")]
    Connection(String),

    /// Transport-level Redis failure.
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),

    /// A stored record did not round-trip through serialization.
    #[error("record serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_error_display() {
        let err = StoreError::Connection("refused".to_string());
        assert_eq!(err.to_string(), "store connection error: refused");
    }
}
