//! # Host Bridge Traits
//!
//! Abstraction traits that the catalog sync core depends on but does not
//! implement itself.
//!
//! ## Traits
//!
//! ### Networking
//! - [`HttpClient`](http::HttpClient) - Async HTTP requests and the shared retry policy
//! - [`CatalogProvider`](catalog::CatalogProvider) - Single-page access to the external music catalog
//!
//! ### Sibling services
//! - [`UserRegistry`](registry::UserRegistry) - Delegated provider tokens per internal user
//! - [`ArtistRegistry`](registry::ArtistRegistry) - Downstream artist system of record
//!
//! ### Utilities
//! - [`Clock`](time::Clock) - Time source for deterministic testing
//!
//! ## Implementations
//!
//! | Trait | Implementation |
//! |-------|----------------|
//! | `HttpClient` | `bridge-server::ReqwestHttpClient` |
//! | `CatalogProvider` | `provider-spotify::SpotifyConnector` |
//! | `UserRegistry`, `ArtistRegistry` | supplied by the host transport |
//!
//! ## Error Handling
//!
//! All bridge traits use the [`BridgeError`](error::BridgeError) type. Adapters
//! should convert their own errors to `BridgeError` and keep `NotFound`
//! distinct so callers can report it.
//!
//! ## Thread Safety
//!
//! All bridge traits require `Send + Sync` so implementations can be shared
//! behind `Arc` across concurrent sync runs.

pub mod catalog;
pub mod error;
pub mod http;
pub mod registry;
pub mod time;

pub use error::BridgeError;

// Re-export commonly used types
pub use catalog::{
    CatalogPage, CatalogProvider, DatePrecision, ExternalAlbum, ExternalArtist, ExternalImage,
};
pub use http::{HttpClient, HttpMethod, HttpRequest, HttpResponse, RetryPolicy};
pub use registry::{
    ArtistRegistration, ArtistRegistry, RegistryAlbum, RegistryImage, RegistryUser, UserRegistry,
};
pub use time::{Clock, SystemClock};
