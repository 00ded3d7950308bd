//! Caller-facing status for failed RPCs
//!
//! Callers only ever see a code and a static message. The underlying error is
//! logged where the status is built.

use core_library::LibraryError;
use serde::Serialize;
use std::fmt;
use tracing::{error, warn};

use crate::error::ServiceError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StatusCode {
    NotFound,
    InvalidArgument,
    Internal,
}

impl StatusCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatusCode::NotFound => "NOT_FOUND",
            StatusCode::InvalidArgument => "INVALID_ARGUMENT",
            StatusCode::Internal => "INTERNAL",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceStatus {
    pub code: StatusCode,
    pub message: &'static str,
}

impl ServiceStatus {
    pub fn new(code: StatusCode, message: &'static str) -> Self {
        Self { code, message }
    }

    /// Classify `error` for the caller
    ///
    /// `internal_message` is returned for anything that is neither a lookup
    /// miss nor a bad argument.
    pub fn from_error(rpc: &str, error: &ServiceError, internal_message: &'static str) -> Self {
        let status = match error {
            ServiceError::InvalidArgument(message) => {
                Self::new(StatusCode::InvalidArgument, message)
            }
            ServiceError::Library(LibraryError::InvalidInput { .. }) => {
                Self::new(StatusCode::InvalidArgument, "invalid pagination parameters")
            }
            e if e.is_not_found() => Self::new(StatusCode::NotFound, "resource not found"),
            _ => Self::new(StatusCode::Internal, internal_message),
        };

        match status.code {
            StatusCode::Internal => error!(rpc, error = %error, "RPC failed"),
            _ => warn!(rpc, code = status.code.as_str(), error = %error, "RPC rejected"),
        }

        status
    }
}

impl fmt::Display for ServiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.as_str(), self.message)
    }
}

impl std::error::Error for ServiceStatus {}
