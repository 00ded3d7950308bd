//! # Server Bridge Implementations
//!
//! Native adapters for the bridge traits used when the catalog sync service
//! runs as a standalone process.
//!
//! - [`ReqwestHttpClient`] - `HttpClient` on top of reqwest with rustls and retry

pub mod http;

pub use http::ReqwestHttpClient;
