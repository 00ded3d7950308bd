//! # Repository Pattern Implementation
//!
//! Repository traits for the local catalog and their SQLite implementations.
//!
//! - `ArtistRepository` - reconciliation lookups, atomic create, sync refresh, listing
//! - `AlbumRepository` - read access to albums owned by an artist

pub mod album;
pub mod artist;
pub mod pagination;

pub use album::{AlbumRepository, SqliteAlbumRepository};
pub use artist::{ArtistRepository, SqliteArtistRepository};
pub use pagination::{Page, PageRequest, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
