//! # Catalog Library Module
//!
//! Owns the local catalog database and the repositories used by
//! reconciliation and the listing RPC.
//!
//! ## Overview
//!
//! - SQLite schema and embedded migrations
//! - `InternalArtist` / `InternalAlbum` models
//! - Repository traits with SQLite implementations
//! - Offset pagination with default and maximum page sizes

pub mod db;
pub mod error;
pub mod models;
pub mod repositories;

pub use db::{create_pool, create_test_pool, DatabaseConfig};
pub use error::{LibraryError, Result};
pub use models::{AlbumId, ArtistId, InternalAlbum, InternalArtist};
pub use repositories::{
    AlbumRepository, ArtistRepository, Page, PageRequest, SqliteAlbumRepository,
    SqliteArtistRepository,
};
