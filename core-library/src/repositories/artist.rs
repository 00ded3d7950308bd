//! Artist repository trait and implementation

use crate::error::{LibraryError, Result};
use crate::models::{InternalAlbum, InternalArtist};
use crate::repositories::{Page, PageRequest};
use async_trait::async_trait;
use sqlx::{query, query_as, SqlitePool};
use tracing::debug;

/// Artist repository interface for data access operations
#[async_trait]
pub trait ArtistRepository: Send + Sync {
    /// Find an artist by its internal ID
    async fn find_by_id(&self, id: &str) -> Result<Option<InternalArtist>>;

    /// Find the artist owning `(provider, external_id)`
    async fn find_by_external_id(
        &self,
        provider: &str,
        external_id: &str,
    ) -> Result<Option<InternalArtist>>;

    /// Insert an artist and its albums in one transaction
    ///
    /// # Errors
    /// - [`LibraryError::Duplicate`] if `(provider, external_id)` is taken;
    ///   nothing is written in that case
    /// - [`LibraryError::InvalidInput`] if validation fails
    async fn create_with_albums(
        &self,
        artist: &InternalArtist,
        albums: &[InternalAlbum],
    ) -> Result<()>;

    /// Refresh the display name and sync timestamp of an existing artist
    ///
    /// # Errors
    /// Returns [`LibraryError::NotFound`] if no row has `id`.
    async fn update_sync(&self, id: &str, name: &str, last_synced_at: i64) -> Result<()>;

    /// Record the id the downstream registry assigned to this artist
    ///
    /// # Errors
    /// Returns [`LibraryError::NotFound`] if no row has `id`.
    async fn set_registry_id(&self, id: &str, registry_id: &str) -> Result<()>;

    /// List artists in creation order
    async fn list(&self, page_request: PageRequest) -> Result<Page<InternalArtist>>;

    /// Count total artists
    async fn count(&self) -> Result<i64>;
}

/// SQLite implementation of ArtistRepository
pub struct SqliteArtistRepository {
    pool: SqlitePool,
}

impl SqliteArtistRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn insert_error(err: sqlx::Error, artist: &InternalArtist) -> LibraryError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => LibraryError::Duplicate {
            provider: artist.provider.clone(),
            external_id: artist.external_id.clone(),
        },
        _ => LibraryError::Database(err),
    }
}

fn to_sql_int(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

#[async_trait]
impl ArtistRepository for SqliteArtistRepository {
    async fn find_by_id(&self, id: &str) -> Result<Option<InternalArtist>> {
        let artist = query_as::<_, InternalArtist>("SELECT * FROM artists WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(artist)
    }

    async fn find_by_external_id(
        &self,
        provider: &str,
        external_id: &str,
    ) -> Result<Option<InternalArtist>> {
        let artist = query_as::<_, InternalArtist>(
            "SELECT * FROM artists WHERE provider = ? AND external_id = ?",
        )
        .bind(provider)
        .bind(external_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(artist)
    }

    async fn create_with_albums(
        &self,
        artist: &InternalArtist,
        albums: &[InternalAlbum],
    ) -> Result<()> {
        artist.validate().map_err(|e| LibraryError::InvalidInput {
            field: "Artist".to_string(),
            message: e,
        })?;
        for album in albums {
            album.validate().map_err(|e| LibraryError::InvalidInput {
                field: "Album".to_string(),
                message: e,
            })?;
        }

        let mut tx = self.pool.begin().await?;

        query(
            r#"
            INSERT INTO artists (
                id, name, provider, external_id, last_synced_at, created_at, registry_id
            )
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&artist.id)
        .bind(&artist.name)
        .bind(&artist.provider)
        .bind(&artist.external_id)
        .bind(artist.last_synced_at)
        .bind(artist.created_at)
        .bind(&artist.registry_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| insert_error(e, artist))?;

        for album in albums {
            query(
                r#"
                INSERT INTO albums (
                    id, artist_id, name, provider, external_id,
                    release_at, position, created_at
                )
                VALUES (?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&album.id)
            .bind(&artist.id)
            .bind(&album.name)
            .bind(&album.provider)
            .bind(&album.external_id)
            .bind(album.release_at)
            .bind(album.position)
            .bind(album.created_at)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        debug!(
            artist_id = %artist.id,
            external_id = %artist.external_id,
            albums = albums.len(),
            "Inserted artist with albums"
        );
        Ok(())
    }

    async fn update_sync(&self, id: &str, name: &str, last_synced_at: i64) -> Result<()> {
        let result = query("UPDATE artists SET name = ?, last_synced_at = ? WHERE id = ?")
            .bind(name)
            .bind(last_synced_at)
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(LibraryError::NotFound {
                entity_type: "Artist".to_string(),
                id: id.to_string(),
            });
        }

        Ok(())
    }

    async fn set_registry_id(&self, id: &str, registry_id: &str) -> Result<()> {
        let result = query("UPDATE artists SET registry_id = ? WHERE id = ?")
            .bind(registry_id)
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(LibraryError::NotFound {
                entity_type: "Artist".to_string(),
                id: id.to_string(),
            });
        }

        Ok(())
    }

    async fn list(&self, page_request: PageRequest) -> Result<Page<InternalArtist>> {
        let total = self.count().await?;

        let artists = query_as::<_, InternalArtist>(
            "SELECT * FROM artists ORDER BY created_at ASC, id ASC LIMIT ? OFFSET ?",
        )
        .bind(i64::from(page_request.limit()))
        .bind(to_sql_int(page_request.offset()))
        .fetch_all(&self.pool)
        .await?;

        Ok(Page::new(artists, total.max(0) as u64, page_request))
    }

    async fn count(&self) -> Result<i64> {
        let count: i64 = query_as("SELECT COUNT(*) as count FROM artists")
            .fetch_one(&self.pool)
            .await
            .map(|row: (i64,)| row.0)?;

        Ok(count)
    }
}
