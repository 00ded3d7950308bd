//! Error types for the Spotify provider

use bridge_traits::error::BridgeError;
use thiserror::Error;

/// Spotify provider errors
#[derive(Error, Debug)]
pub enum SpotifyError {
    /// Token missing, expired or rejected (HTTP 401)
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Requested artist or listing does not exist (HTTP 404)
    #[error("Resource not found: {resource}")]
    NotFound { resource: String },

    /// Any other non-success status
    #[error("Spotify API error (status {status_code}): {message}")]
    ApiError { status_code: u16, message: String },

    /// Still throttled after the last retry
    #[error("Rate limit exceeded after {attempts} attempts")]
    RateLimitExceeded { attempts: u32 },

    /// Body did not match the expected wire shape
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Continuation cursor does not point at the configured API
    #[error("Invalid page cursor: {0}")]
    InvalidCursor(String),

    #[error(transparent)]
    BridgeError(#[from] BridgeError),
}

/// Result type for Spotify operations
pub type Result<T> = std::result::Result<T, SpotifyError>;

impl From<SpotifyError> for BridgeError {
    fn from(error: SpotifyError) -> Self {
        match error {
            SpotifyError::AuthenticationFailed(msg) => BridgeError::Unauthorized(msg),
            SpotifyError::NotFound { resource } => BridgeError::NotFound(resource),
            SpotifyError::BridgeError(e) => e,
            other => BridgeError::OperationFailed(other.to_string()),
        }
    }
}
