//! Catalog RPC façade
//!
//! Each public method is one RPC. Failures come back as [`ServiceStatus`];
//! the detailed error is logged and never returned.

use core_library::{ArtistRepository, PageRequest};
use core_sync::SyncCoordinator;
use std::sync::Arc;
use tracing::{info, instrument, warn};

use crate::error::{Result, ServiceError};
use crate::messages::{
    ArtistSummary, CatalogArtist, GetArtistForUserRequest, GetArtistForUserResponse,
    GetArtistRequest, GetArtistsRequest, GetArtistsResponse, GetReleasesRequest,
    GetReleasesResponse, Release, UpdateArtistsRequest, UpdateArtistsResponse,
};
use crate::status::ServiceStatus;

/// Primary façade exposed to the transport layer.
#[derive(Clone)]
pub struct CatalogService {
    coordinator: Arc<SyncCoordinator>,
    artists: Arc<dyn ArtistRepository>,
}

impl CatalogService {
    pub fn new(coordinator: Arc<SyncCoordinator>, artists: Arc<dyn ArtistRepository>) -> Self {
        Self {
            coordinator,
            artists,
        }
    }

    pub fn coordinator(&self) -> &Arc<SyncCoordinator> {
        &self.coordinator
    }

    /// Look up one artist at the provider with an app credential
    #[instrument(skip(self, request), fields(artist_id = %request.id))]
    pub async fn get_artist(
        &self,
        request: GetArtistRequest,
    ) -> std::result::Result<CatalogArtist, ServiceStatus> {
        self.fetch_artist(&request.id)
            .await
            .map_err(|e| ServiceStatus::from_error("GetArtist", &e, "failed to get artist"))
    }

    /// Provider ids of the artists a user follows
    ///
    /// Reads the first followed-artists page unless the service is configured
    /// to walk them all.
    #[instrument(skip(self, request), fields(user_id = %request.user_id))]
    pub async fn get_artist_for_user(
        &self,
        request: GetArtistForUserRequest,
    ) -> std::result::Result<GetArtistForUserResponse, ServiceStatus> {
        self.followed_artist_ids(&request.user_id)
            .await
            .map_err(|e| {
                ServiceStatus::from_error("GetArtistForUser", &e, "failed to get users artists")
            })
    }

    /// Every release of an artist, walked to the last page
    #[instrument(skip(self, request), fields(artist_id = %request.artist_id))]
    pub async fn get_releases_for_artist(
        &self,
        request: GetReleasesRequest,
    ) -> std::result::Result<GetReleasesResponse, ServiceStatus> {
        self.fetch_releases(&request.artist_id).await.map_err(|e| {
            ServiceStatus::from_error("GetReleasesForArtist", &e, "failed to get artist albums")
        })
    }

    /// Reconcile the caller's followed artists into the local store
    #[instrument(skip(self, request), fields(user_id = %request.user_id))]
    pub async fn update_artists(
        &self,
        request: UpdateArtistsRequest,
    ) -> std::result::Result<UpdateArtistsResponse, ServiceStatus> {
        self.sync_followed(&request.user_id)
            .await
            .map_err(|e| ServiceStatus::from_error("UpdateArtists", &e, "failed to update artists"))
    }

    /// One page of locally stored artists, oldest first
    #[instrument(skip(self))]
    pub async fn get_artists(
        &self,
        request: GetArtistsRequest,
    ) -> std::result::Result<GetArtistsResponse, ServiceStatus> {
        self.list_artists(&request)
            .await
            .map_err(|e| ServiceStatus::from_error("GetArtists", &e, "failed to list artists"))
    }

    async fn fetch_artist(&self, artist_id: &str) -> Result<CatalogArtist> {
        require_id(artist_id, "artist id must not be empty")?;

        let credential = self
            .coordinator
            .credentials()
            .acquire_app_credential()
            .await?;
        let artist = self
            .coordinator
            .catalog()
            .fetch_artist(&credential, artist_id)
            .await?;

        Ok(CatalogArtist::from(&artist))
    }

    async fn followed_artist_ids(&self, user_id: &str) -> Result<GetArtistForUserResponse> {
        require_id(user_id, "user id must not be empty")?;

        let credential = self
            .coordinator
            .credentials()
            .acquire_user_credential(user_id)
            .await?;
        let walk_all = self.coordinator.settings().walk_followed_pages;
        let artists = self
            .coordinator
            .catalog()
            .fetch_followed_artists(&credential, walk_all)
            .await?;

        Ok(GetArtistForUserResponse {
            external_artist_ids: artists.into_iter().map(|artist| artist.id).collect(),
        })
    }

    async fn fetch_releases(&self, artist_id: &str) -> Result<GetReleasesResponse> {
        require_id(artist_id, "artist id must not be empty")?;

        let credential = self
            .coordinator
            .credentials()
            .acquire_app_credential()
            .await?;
        let albums = self
            .coordinator
            .catalog()
            .fetch_artist_albums(&credential, artist_id)
            .await?;

        info!(releases = albums.len(), "Fetched artist releases");
        Ok(GetReleasesResponse {
            releases: albums.iter().map(Release::from).collect(),
        })
    }

    async fn sync_followed(&self, user_id: &str) -> Result<UpdateArtistsResponse> {
        require_id(user_id, "user id must not be empty")?;

        let report = self.coordinator.sync_user(user_id).await?;
        if !report.is_complete_success() {
            warn!(
                run_id = %report.run_id,
                failed = report.failed.len(),
                skipped = report.skipped.len(),
                "Artist update finished with failures"
            );
        }

        Ok(UpdateArtistsResponse::default())
    }

    async fn list_artists(&self, request: &GetArtistsRequest) -> Result<GetArtistsResponse> {
        let page_request = PageRequest::from_signed(request.limit, request.offset)?;
        let page = self.artists.list(page_request).await?;

        Ok(GetArtistsResponse {
            artists: page.items.iter().map(ArtistSummary::from).collect(),
        })
    }
}

fn require_id(value: &str, message: &'static str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(ServiceError::InvalidArgument(message));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_id_rejects_blank() {
        assert!(require_id("", "empty").is_err());
        assert!(require_id("   ", "empty").is_err());
        assert!(require_id("0kbYTNQb4Pb1rPbbaF0pT4", "empty").is_ok());
    }
}
