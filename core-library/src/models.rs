//! Domain models for the local catalog
//!
//! Rows are stored with millisecond UTC timestamps; accessors convert to
//! `chrono` types.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

// =============================================================================
// ID Types
// =============================================================================

/// Internal identifier of an artist, stable for the row's lifetime
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ArtistId(pub Uuid);

impl ArtistId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_string(s: &str) -> Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

impl Default for ArtistId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ArtistId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Internal identifier of an album
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AlbumId(pub Uuid);

impl AlbumId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for AlbumId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AlbumId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

fn from_millis(ms: i64) -> DateTime<Utc> {
    Utc.timestamp_millis_opt(ms)
        .single()
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

// =============================================================================
// Entities
// =============================================================================

/// Artist known to the local catalog
///
/// `(provider, external_id)` is unique across all rows and is the
/// reconciliation key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct InternalArtist {
    pub id: String,
    pub name: String,
    pub provider: String,
    pub external_id: String,
    /// Milliseconds since the Unix epoch
    pub last_synced_at: i64,
    pub created_at: i64,
    /// Downstream registry id, `None` until mirroring succeeds
    pub registry_id: Option<String>,
}

impl InternalArtist {
    pub fn new(
        name: impl Into<String>,
        provider: impl Into<String>,
        external_id: impl Into<String>,
        synced_at: DateTime<Utc>,
    ) -> Self {
        let ts = synced_at.timestamp_millis();
        Self {
            id: ArtistId::new().to_string(),
            name: name.into(),
            provider: provider.into(),
            external_id: external_id.into(),
            last_synced_at: ts,
            created_at: ts,
            registry_id: None,
        }
    }

    pub fn last_synced(&self) -> DateTime<Utc> {
        from_millis(self.last_synced_at)
    }

    /// Provider name → external id
    pub fn external_ids(&self) -> BTreeMap<String, String> {
        BTreeMap::from([(self.provider.clone(), self.external_id.clone())])
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.provider.trim().is_empty() {
            return Err("Artist provider cannot be empty".to_string());
        }
        if self.external_id.trim().is_empty() {
            return Err("Artist external id cannot be empty".to_string());
        }
        Ok(())
    }
}

/// Album owned by exactly one artist
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct InternalAlbum {
    pub id: String,
    pub artist_id: String,
    pub name: String,
    pub provider: String,
    pub external_id: String,
    /// Release instant (midnight UTC), milliseconds since the Unix epoch
    pub release_at: i64,
    /// Provider listing order, zero-based
    pub position: i64,
    pub created_at: i64,
}

impl InternalAlbum {
    /// Album of `artist` from the same provider, stamped with the artist's
    /// creation time since both are written together
    pub fn new(
        artist: &InternalArtist,
        name: impl Into<String>,
        external_id: impl Into<String>,
        release_at: DateTime<Utc>,
        position: i64,
    ) -> Self {
        Self {
            id: AlbumId::new().to_string(),
            artist_id: artist.id.clone(),
            name: name.into(),
            provider: artist.provider.clone(),
            external_id: external_id.into(),
            release_at: release_at.timestamp_millis(),
            position,
            created_at: artist.created_at,
        }
    }

    pub fn released(&self) -> DateTime<Utc> {
        from_millis(self.release_at)
    }

    pub fn external_ids(&self) -> BTreeMap<String, String> {
        BTreeMap::from([(self.provider.clone(), self.external_id.clone())])
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.external_id.trim().is_empty() {
            return Err("Album external id cannot be empty".to_string());
        }
        Ok(())
    }
}
