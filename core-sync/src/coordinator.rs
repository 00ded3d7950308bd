//! # Sync Coordinator
//!
//! Top-level workflow for one trigger.
//!
//! ## Workflow
//!
//! ### By user
//! 1. Acquire the user's delegated credential
//! 2. Fetch followed artists (first page unless configured otherwise)
//! 3. For each artist, in provider order: refresh the credential if expired,
//!    walk its albums, normalize, reconcile
//! 4. Under `FailFast` the first failing artist stops the run; artists already
//!    reconciled stay committed and the rest are reported as skipped
//!
//! ### By artist
//! 1. Use the caller's credential, or acquire an app credential
//! 2. Fetch the artist, then run the same per-artist pipeline once
//!
//! Each run gets a UUID, is bounded by the configured run timeout and
//! publishes its lifecycle on the event bus when one is attached.
//!
//! ## Usage
//!
//! ```rust,ignore
//! let coordinator = SyncCoordinator::new(credentials, catalog, reconciler, settings)
//!     .with_event_bus(event_bus);
//!
//! let report = coordinator.sync_user("user-42").await?;
//! println!("{} artists reconciled", report.succeeded.len());
//! ```

use bridge_traits::catalog::ExternalArtist;
use bridge_traits::time::{Clock, SystemClock};
use core_auth::{Credential, CredentialProvider};
use core_runtime::config::{FailurePolicy, SyncSettings};
use core_runtime::events::{CoreEvent, EventBus, SyncEvent};
use std::future::Future;
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::catalog::CatalogClient;
use crate::error::{Result, SyncError};
use crate::normalizer::RecordNormalizer;
use crate::reconciler::{ReconcileAction, Reconciled, Reconciler};
use crate::report::SyncReport;

pub struct SyncCoordinator {
    credentials: Arc<dyn CredentialProvider>,
    catalog: CatalogClient,
    normalizer: RecordNormalizer,
    reconciler: Reconciler,
    settings: SyncSettings,
    event_bus: Option<EventBus>,
    clock: Arc<dyn Clock>,
}

impl SyncCoordinator {
    /// The normalizer is keyed by the catalog's provider key.
    pub fn new(
        credentials: Arc<dyn CredentialProvider>,
        catalog: CatalogClient,
        reconciler: Reconciler,
        settings: SyncSettings,
    ) -> Self {
        let catalog = catalog.with_max_pages(settings.max_pages);
        let normalizer = RecordNormalizer::new(catalog.provider_key());
        Self {
            credentials,
            catalog,
            normalizer,
            reconciler,
            settings,
            event_bus: None,
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_event_bus(mut self, event_bus: EventBus) -> Self {
        self.event_bus = Some(event_bus);
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn credentials(&self) -> &Arc<dyn CredentialProvider> {
        &self.credentials
    }

    pub fn catalog(&self) -> &CatalogClient {
        &self.catalog
    }

    pub fn normalizer(&self) -> &RecordNormalizer {
        &self.normalizer
    }

    pub fn settings(&self) -> &SyncSettings {
        &self.settings
    }

    fn emit(&self, event: SyncEvent) {
        if let Some(bus) = &self.event_bus {
            bus.emit(CoreEvent::Sync(event)).ok();
        }
    }

    async fn bounded<T>(&self, run: impl Future<Output = Result<T>>) -> Result<T> {
        match self.settings.run_timeout {
            Some(limit) => tokio::time::timeout(limit, run)
                .await
                .unwrap_or(Err(SyncError::Timeout(limit))),
            None => run.await,
        }
    }

    /// Reconcile every artist the user follows
    ///
    /// # Errors
    ///
    /// Credential, listing and timeout failures fail the run. A per-artist
    /// failure under [`FailurePolicy::FailFast`] yields
    /// [`SyncError::ArtistFailed`] carrying the partial report; under
    /// [`FailurePolicy::Continue`] it is recorded in the returned report.
    #[instrument(skip(self))]
    pub async fn sync_user(&self, user_id: &str) -> Result<SyncReport> {
        let run_id = Uuid::new_v4().to_string();
        info!(run_id = %run_id, "Starting user sync");
        self.emit(SyncEvent::Started {
            run_id: run_id.clone(),
            trigger: "user".to_string(),
            subject: user_id.to_string(),
        });

        let outcome = self.bounded(self.run_user(&run_id, user_id)).await;

        match &outcome {
            Ok(report) => {
                info!(
                    run_id = %run_id,
                    succeeded = report.succeeded.len(),
                    failed = report.failed.len(),
                    duration_ms = report.duration_ms(),
                    "User sync completed"
                );
                self.emit(SyncEvent::Completed {
                    run_id,
                    succeeded: report.succeeded.len() as u64,
                    failed: report.failed.len() as u64,
                    skipped: report.skipped.len() as u64,
                    duration_ms: report.duration_ms(),
                });
            }
            Err(e) => {
                error!(run_id = %run_id, error = %e, "User sync failed");
                self.emit(SyncEvent::Failed {
                    run_id,
                    message: e.to_string(),
                });
            }
        }

        outcome
    }

    async fn run_user(&self, run_id: &str, user_id: &str) -> Result<SyncReport> {
        let mut credential = self.credentials.acquire_user_credential(user_id).await?;
        let followed = self
            .catalog
            .fetch_followed_artists(&credential, self.settings.walk_followed_pages)
            .await?;
        info!(run_id, artists = followed.len(), "Fetched followed artists");

        let mut report = SyncReport::new(run_id, Some(user_id.to_string()), self.clock.now());
        let mut remaining = followed.iter();

        while let Some(artist) = remaining.next() {
            credential = self.credentials.ensure_fresh(credential).await?;

            match self.sync_one(&credential, artist).await {
                Ok(reconciled) => {
                    self.emit(SyncEvent::ArtistReconciled {
                        run_id: run_id.to_string(),
                        external_id: artist.id.clone(),
                        created: reconciled.action == ReconcileAction::Created,
                    });
                    report.record_success(artist.id.clone(), reconciled.action);
                }
                Err(e) => {
                    let reason = e.to_string();
                    warn!(run_id, external_id = %artist.id, error = %reason, "Artist sync failed");
                    self.emit(SyncEvent::ArtistFailed {
                        run_id: run_id.to_string(),
                        external_id: artist.id.clone(),
                        message: reason.clone(),
                    });
                    report.record_failure(artist.id.clone(), reason.clone());

                    if self.settings.failure_policy == FailurePolicy::FailFast {
                        for skipped in remaining.by_ref() {
                            report.record_skipped(skipped.id.clone());
                        }
                        report.finish(self.clock.now());
                        return Err(SyncError::ArtistFailed {
                            external_id: artist.id.clone(),
                            reason,
                            report: Box::new(report),
                        });
                    }
                }
            }
        }

        report.finish(self.clock.now());
        Ok(report)
    }

    /// Reconcile a single artist by provider id
    ///
    /// A caller-supplied credential is reused (refreshed if expired);
    /// otherwise an app credential is acquired.
    #[instrument(skip(self, credential))]
    pub async fn sync_artist(
        &self,
        artist_id: &str,
        credential: Option<Credential>,
    ) -> Result<Reconciled> {
        let run_id = Uuid::new_v4().to_string();
        self.emit(SyncEvent::Started {
            run_id: run_id.clone(),
            trigger: "artist".to_string(),
            subject: artist_id.to_string(),
        });
        let started = self.clock.now();

        let outcome = self
            .bounded(async {
                let credential = match credential {
                    Some(credential) => self.credentials.ensure_fresh(credential).await?,
                    None => self.credentials.acquire_app_credential().await?,
                };
                let artist = self.catalog.fetch_artist(&credential, artist_id).await?;
                self.sync_one(&credential, &artist).await
            })
            .await;

        match &outcome {
            Ok(reconciled) => {
                self.emit(SyncEvent::ArtistReconciled {
                    run_id: run_id.clone(),
                    external_id: artist_id.to_string(),
                    created: reconciled.action == ReconcileAction::Created,
                });
                self.emit(SyncEvent::Completed {
                    run_id,
                    succeeded: 1,
                    failed: 0,
                    skipped: 0,
                    duration_ms: u64::try_from((self.clock.now() - started).num_milliseconds())
                        .unwrap_or(0),
                });
            }
            Err(e) => {
                warn!(run_id = %run_id, error = %e, "Artist sync failed");
                self.emit(SyncEvent::Failed {
                    run_id,
                    message: e.to_string(),
                });
            }
        }

        outcome
    }

    /// Albums → normalize → reconcile for one artist
    async fn sync_one(&self, credential: &Credential, artist: &ExternalArtist) -> Result<Reconciled> {
        let albums = self.catalog.fetch_artist_albums(credential, &artist.id).await?;
        let transfer = self.normalizer.normalize_artist(artist, &albums)?;
        self.reconciler.reconcile(&transfer).await
    }
}
