//! Workspace placeholder crate.
//!
//! This crate exposes the `server` feature, which maps to the `core-service`
//! façade. Hosts can depend on `catalog-sync-workspace` and reach the whole
//! synchronization stack through the re-export below.

#[cfg(feature = "server")]
pub use core_service as service;
