//! Catalog service façade and bootstrap helpers.
//!
//! This crate wires the host-provided collaborators (HTTP client, user
//! registry, optional artist registry) into the sync pipeline and exposes two
//! entry points over it:
//!
//! - [`CatalogService`]: one method per RPC, failures mapped to
//!   [`ServiceStatus`]
//! - [`MessageDispatcher`]: queue messages by channel name
//!
//! Standalone deployments enable the `server` feature (the default), which
//! brings in the reqwest adapter from `bridge-server`.
//!
//! ```ignore
//! let config = ServiceConfig::from_env()?;
//! init_logging(&config)?;
//!
//! let deps = ServiceDependencies::server(&config, user_registry)?;
//! let runtime = bootstrap(&config, deps).await?;
//!
//! runtime.dispatcher.dispatch("spotify-user", br#"{"id":"user-42"}"#).await;
//! ```

pub mod bootstrap;
pub mod error;
pub mod messages;
pub mod queue;
pub mod service;
pub mod status;

pub use bootstrap::{bootstrap, init_logging, CatalogRuntime, ServiceDependencies};
pub use error::{Result, ServiceError};
pub use queue::{DispatchOutcome, MessageDispatcher, ARTIST_SYNC_CHANNEL, USER_SYNC_CHANNEL};
pub use service::CatalogService;
pub use status::{ServiceStatus, StatusCode};
