//! # Reconciliation Engine
//!
//! Create-or-update keyed by `(provider, external_id)`.
//!
//! Lookup and write for one key run under a per-key async mutex, so two
//! concurrent reconciliations of the same artist in this process never both
//! take the create branch. The store's unique constraint covers writers in
//! other processes: a create that loses that race is retried once as an
//! update.
//!
//! With a registry attached, an artist is mirrored downstream whenever its row
//! has no `registry_id` yet, so a failed mirror is retried by the next sync.

use bridge_traits::registry::{ArtistRegistration, ArtistRegistry, RegistryAlbum, RegistryImage};
use bridge_traits::time::{Clock, SystemClock};
use core_library::{ArtistRepository, InternalAlbum, InternalArtist, LibraryError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Weak};
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, info, instrument, warn};

use crate::error::{Result, SyncError};
use crate::normalizer::ArtistTransfer;

/// Which branch reconciliation took
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReconcileAction {
    Created,
    Updated,
}

impl ReconcileAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReconcileAction::Created => "created",
            ReconcileAction::Updated => "updated",
        }
    }
}

impl fmt::Display for ReconcileAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Row state after reconciliation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciled {
    pub artist: InternalArtist,
    pub action: ReconcileAction,
}

/// Async mutex per key; entries disappear once no guard holds them
#[derive(Default)]
struct KeyedLocks {
    locks: Mutex<HashMap<String, Weak<Mutex<()>>>>,
}

impl KeyedLocks {
    async fn acquire(&self, key: String) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().await;
            locks.retain(|_, weak| weak.strong_count() > 0);
            match locks.get(&key).and_then(Weak::upgrade) {
                Some(lock) => lock,
                None => {
                    let lock = Arc::new(Mutex::new(()));
                    locks.insert(key, Arc::downgrade(&lock));
                    lock
                }
            }
        };
        lock.lock_owned().await
    }
}

pub struct Reconciler {
    artists: Arc<dyn ArtistRepository>,
    registry: Option<Arc<dyn ArtistRegistry>>,
    clock: Arc<dyn Clock>,
    locks: KeyedLocks,
}

impl Reconciler {
    pub fn new(artists: Arc<dyn ArtistRepository>) -> Self {
        Self {
            artists,
            registry: None,
            clock: Arc::new(SystemClock),
            locks: KeyedLocks::default(),
        }
    }

    /// Mirror artists to a downstream registry until each has a registry id
    pub fn with_registry(mut self, registry: Arc<dyn ArtistRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Create the artist if its key is unknown, otherwise refresh it
    ///
    /// # Errors
    ///
    /// - [`SyncError::Store`] when the store rejects a read or write
    /// - [`SyncError::Registry`] when mirroring fails; the local row is
    ///   already committed and stays unmirrored
    #[instrument(skip(self, transfer), fields(external_id = %transfer.external_id))]
    pub async fn reconcile(&self, transfer: &ArtistTransfer) -> Result<Reconciled> {
        let key = format!("{}:{}", transfer.provider, transfer.external_id);
        let _guard = self.locks.acquire(key).await;

        let mut reconciled = match self.find(transfer).await? {
            Some(existing) => self.update(existing, transfer).await?,
            None => self.create_or_update(transfer).await?,
        };
        self.mirror(&mut reconciled.artist, transfer).await?;
        Ok(reconciled)
    }

    async fn create_or_update(&self, transfer: &ArtistTransfer) -> Result<Reconciled> {
        match self.create(transfer).await {
            Err(SyncError::Store(e)) if e.is_unique_violation() => {
                warn!("Artist created concurrently elsewhere, retrying as update");
                let existing = self.find(transfer).await?.ok_or_else(|| {
                    SyncError::Store(LibraryError::NotFound {
                        entity_type: "Artist".to_string(),
                        id: transfer.external_id.clone(),
                    })
                })?;
                self.update(existing, transfer).await
            }
            other => other,
        }
    }

    async fn find(&self, transfer: &ArtistTransfer) -> Result<Option<InternalArtist>> {
        Ok(self
            .artists
            .find_by_external_id(&transfer.provider, &transfer.external_id)
            .await?)
    }

    async fn create(&self, transfer: &ArtistTransfer) -> Result<Reconciled> {
        let artist = InternalArtist::new(
            transfer.name.clone(),
            transfer.provider.clone(),
            transfer.external_id.clone(),
            self.clock.now(),
        );
        let albums: Vec<InternalAlbum> = transfer
            .albums
            .iter()
            .enumerate()
            .map(|(position, album)| {
                InternalAlbum::new(
                    &artist,
                    album.name.clone(),
                    album.external_id.clone(),
                    album.released_at,
                    position as i64,
                )
            })
            .collect();

        self.artists.create_with_albums(&artist, &albums).await?;
        info!(
            artist_id = %artist.id,
            albums = albums.len(),
            "Created artist"
        );

        Ok(Reconciled {
            artist,
            action: ReconcileAction::Created,
        })
    }

    async fn mirror(&self, artist: &mut InternalArtist, transfer: &ArtistTransfer) -> Result<()> {
        let Some(registry) = &self.registry else {
            return Ok(());
        };
        if artist.registry_id.is_some() {
            return Ok(());
        }

        let registry_id = registry
            .create_artist(registration(transfer))
            .await
            .map_err(|e| SyncError::Registry {
                external_id: transfer.external_id.clone(),
                reason: e.to_string(),
            })?;
        self.artists.set_registry_id(&artist.id, &registry_id).await?;
        debug!(artist_id = %artist.id, registry_id = %registry_id, "Mirrored artist to registry");

        artist.registry_id = Some(registry_id);
        Ok(())
    }

    async fn update(&self, mut artist: InternalArtist, transfer: &ArtistTransfer) -> Result<Reconciled> {
        // Strictly increasing even when the clock stalls or steps back.
        let synced_at = self
            .clock
            .unix_timestamp_millis()
            .max(artist.last_synced_at + 1);

        self.artists
            .update_sync(&artist.id, &transfer.name, synced_at)
            .await?;

        artist.name = transfer.name.clone();
        artist.last_synced_at = synced_at;
        debug!(artist_id = %artist.id, "Refreshed artist");

        Ok(Reconciled {
            artist,
            action: ReconcileAction::Updated,
        })
    }
}

fn registration(transfer: &ArtistTransfer) -> ArtistRegistration {
    let images = |images: &[bridge_traits::catalog::ExternalImage]| {
        images
            .iter()
            .map(|image| RegistryImage {
                url: image.url.clone(),
                height: image.height,
                width: image.width,
            })
            .collect::<Vec<_>>()
    };

    ArtistRegistration {
        name: transfer.name.clone(),
        images: images(&transfer.images),
        albums: transfer
            .albums
            .iter()
            .map(|album| RegistryAlbum {
                name: album.name.clone(),
                release_date: album.released_at,
                images: images(&album.images),
                external_ids: album.external_ids.clone(),
            })
            .collect(),
        external_ids: transfer.external_ids(),
    }
}
