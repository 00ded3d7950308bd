//! # Spotify Catalog Provider
//!
//! Implements [`CatalogProvider`](bridge_traits::catalog::CatalogProvider) on
//! top of the Spotify Web API.
//!
//! ## Overview
//!
//! The connector answers one request per call:
//! - `GET /artists/{id}` for a single artist
//! - `GET /artists/{id}/albums` for one page of albums, singles and compilations
//! - `GET /me/following?type=artist` for one page of followed artists
//!
//! Walking pages to completion and choosing the credential belong to
//! `core-sync`. Rate limiting (429) and server errors are retried here with
//! exponential backoff, honouring `Retry-After` when the API sends one.

pub mod connector;
pub mod error;
pub mod types;

pub use connector::{SpotifyConnector, PROVIDER_KEY};
pub use error::{Result, SpotifyError};
