use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(&'static str),

    #[error("Malformed message: {0}")]
    MalformedMessage(#[from] serde_json::Error),

    #[error("Runtime error: {0}")]
    Runtime(#[from] core_runtime::Error),

    #[error("Authentication error: {0}")]
    Auth(#[from] core_auth::AuthError),

    #[error("Sync error: {0}")]
    Sync(#[from] core_sync::SyncError),

    #[error("Library error: {0}")]
    Library(#[from] core_library::LibraryError),

    /// Host adapter construction, e.g. the HTTP client
    #[error("Bridge error: {0}")]
    Bridge(#[from] bridge_traits::BridgeError),
}

impl ServiceError {
    /// Unknown user upstream or unknown artist at the provider
    pub fn is_not_found(&self) -> bool {
        match self {
            ServiceError::Auth(e) => matches!(e, core_auth::AuthError::UserNotFound(_)),
            ServiceError::Sync(e) => e.is_not_found(),
            ServiceError::Library(e) => e.is_not_found(),
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, ServiceError>;
