use thiserror::Error;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Provider {provider} authentication failed: {reason}")]
    AuthenticationFailed { provider: String, reason: String },

    #[error("Token exchange failed: {0}")]
    TokenExchangeFailed(String),

    #[error("User not found: {0}")]
    UserNotFound(String),

    #[error("User lookup failed for {user_id}: {reason}")]
    UserLookupFailed { user_id: String, reason: String },

    #[error("Not authenticated")]
    NotAuthenticated,

    #[error("Invalid auth configuration: {0}")]
    InvalidConfig(String),
}

impl AuthError {
    /// Whether the failure originates from the user registry rather than the
    /// token endpoint.
    pub fn is_lookup(&self) -> bool {
        matches!(
            self,
            AuthError::UserNotFound(_) | AuthError::UserLookupFailed { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, AuthError>;
