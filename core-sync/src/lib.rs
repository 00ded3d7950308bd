//! # Catalog Sync Module
//!
//! The synchronization pipeline: fetch from the catalog provider, normalize,
//! reconcile against the local store.
//!
//! ## Components
//!
//! - **Catalog Client** (`catalog`): sequential, all-or-nothing page walks
//! - **Record Normalizer** (`normalizer`): provider records → transfer objects
//! - **Reconciler** (`reconciler`): idempotent create-or-update per external id
//! - **Sync Coordinator** (`coordinator`): by-user and by-artist runs, failure
//!   policy, run timeout and lifecycle events
//! - **Sync Report** (`report`): per-artist outcomes of a run

pub mod catalog;
pub mod coordinator;
pub mod error;
pub mod normalizer;
pub mod reconciler;
pub mod report;

pub use catalog::CatalogClient;
pub use coordinator::SyncCoordinator;
pub use error::{Result, SyncError};
pub use normalizer::{AlbumTransfer, ArtistTransfer, NormalizeError, RecordNormalizer};
pub use reconciler::{ReconcileAction, Reconciled, Reconciler};
pub use report::{ArtistFailure, SyncReport};
