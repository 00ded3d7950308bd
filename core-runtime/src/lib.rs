//! # Core Runtime Module
//!
//! Provides foundational runtime infrastructure for the catalog sync service:
//! - Logging and tracing infrastructure
//! - Configuration management
//! - Event bus system
//!
//! ## Overview
//!
//! This crate contains the runtime utilities that other modules depend on. It
//! establishes the logging conventions, configuration loading and event
//! broadcasting used throughout the system.

pub mod config;
pub mod error;
pub mod events;
pub mod logging;

pub use config::{FailurePolicy, ServiceConfig, ServiceConfigBuilder, SyncSettings};
pub use error::{Error, Result};
