//! Errors raised while loading configuration or installing process-wide
//! runtime state

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// A setting is present but malformed or out of range
    #[error("Configuration error: {0}")]
    Config(String),

    /// A required setting is absent; `message` names where to set it
    #[error("Missing {capability}: {message}")]
    CapabilityMissing { capability: String, message: String },

    /// The global tracing subscriber was already installed
    #[error("Logging already initialized: {0}")]
    LoggingInstalled(String),
}

pub type Result<T> = std::result::Result<T, Error>;
