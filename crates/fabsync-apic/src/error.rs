//! Error types for fabric controller operations.

use thiserror::Error;

/// Result type alias for controller operations.
pub type FabricResult<T> = Result<T, FabricError>;

/// Errors that can occur talking to the fabric controller.
#[derive(Debug, Error)]
pub enum FabricError {
    /// Transport-level HTTP failure.
    #[error("controller transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Login or session refresh failed.
    #[error("controller authentication failed: {0}")]
    Auth(String),

    /// The controller answered a request with a non-success status.
    /// Failure is scoped to this one call.
    #[error("controller rejected {path} with status {status}")]
    CallFailed {
        /// Request path of the failed call
        path: String,
        /// HTTP status returned
        status: u16,
    },

    /// The login response did not carry a session token.
    #[error("malformed controller response: {0}")]
    MalformedResponse(String),
}
