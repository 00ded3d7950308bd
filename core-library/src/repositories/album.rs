//! Album repository trait and implementation
//!
//! Albums are written only as part of
//! [`ArtistRepository::create_with_albums`](crate::repositories::ArtistRepository::create_with_albums);
//! this repository reads them back.

use crate::error::Result;
use crate::models::InternalAlbum;
use async_trait::async_trait;
use sqlx::{query_as, SqlitePool};

#[async_trait]
pub trait AlbumRepository: Send + Sync {
    /// Albums owned by `artist_id` in provider listing order
    async fn find_by_artist(&self, artist_id: &str) -> Result<Vec<InternalAlbum>>;

    async fn count_by_artist(&self, artist_id: &str) -> Result<i64>;
}

/// SQLite implementation of AlbumRepository
pub struct SqliteAlbumRepository {
    pool: SqlitePool,
}

impl SqliteAlbumRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AlbumRepository for SqliteAlbumRepository {
    async fn find_by_artist(&self, artist_id: &str) -> Result<Vec<InternalAlbum>> {
        let albums = query_as::<_, InternalAlbum>(
            "SELECT * FROM albums WHERE artist_id = ? ORDER BY position ASC",
        )
        .bind(artist_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(albums)
    }

    async fn count_by_artist(&self, artist_id: &str) -> Result<i64> {
        let count: i64 = query_as("SELECT COUNT(*) FROM albums WHERE artist_id = ?")
            .bind(artist_id)
            .fetch_one(&self.pool)
            .await
            .map(|row: (i64,)| row.0)?;

        Ok(count)
    }
}
