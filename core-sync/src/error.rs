use bridge_traits::error::BridgeError;
use core_auth::AuthError;
use core_library::LibraryError;
use std::time::Duration;
use thiserror::Error;

use crate::normalizer::NormalizeError;
use crate::report::SyncReport;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),

    #[error("Catalog provider error: {0}")]
    Provider(#[from] BridgeError),

    #[error("Page walk over {listing} exceeded {max_pages} pages")]
    PageLimitExceeded { listing: String, max_pages: usize },

    #[error("Normalization error: {0}")]
    Normalize(#[from] NormalizeError),

    #[error("Store error: {0}")]
    Store(#[from] LibraryError),

    #[error("Artist registry rejected {external_id}: {reason}")]
    Registry { external_id: String, reason: String },

    #[error("Sync timeout after {0:?}")]
    Timeout(Duration),

    /// Fail-fast stop; the report holds what was committed before it
    #[error("Sync of artist {external_id} failed: {reason}")]
    ArtistFailed {
        external_id: String,
        reason: String,
        report: Box<SyncReport>,
    },
}

impl SyncError {
    /// Unknown user upstream or unknown artist at the provider
    pub fn is_not_found(&self) -> bool {
        match self {
            SyncError::Auth(AuthError::UserNotFound(_)) => true,
            SyncError::Provider(e) => e.is_not_found(),
            _ => false,
        }
    }

    /// Partial report carried by a fail-fast stop
    pub fn report(&self) -> Option<&SyncReport> {
        match self {
            SyncError::ArtistFailed { report, .. } => Some(report),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, SyncError>;
