//! # Catalog Client
//!
//! Drives a [`CatalogProvider`] page by page. Pages are requested strictly in
//! order; any failing page fails the whole walk and discards what was
//! collected. A walk that would need more than `max_pages` pages fails with
//! [`SyncError::PageLimitExceeded`].

use bridge_traits::catalog::{CatalogPage, CatalogProvider, ExternalAlbum, ExternalArtist};
use core_auth::Credential;
use core_runtime::config::DEFAULT_MAX_PAGES;
use std::sync::Arc;
use tracing::{debug, instrument};

use crate::error::{Result, SyncError};

/// Accumulates the pages of one listing
struct PageWalk<T> {
    listing: String,
    max_pages: usize,
    pages: usize,
    items: Vec<T>,
}

impl<T> PageWalk<T> {
    fn new(listing: String, max_pages: usize) -> Self {
        Self {
            listing,
            max_pages,
            pages: 0,
            items: Vec::new(),
        }
    }

    /// Absorb one page and return the cursor of the next, if any
    fn accept(&mut self, page: CatalogPage<T>) -> Option<String> {
        self.pages += 1;
        debug!(
            listing = %self.listing,
            page = self.pages,
            items = page.items.len(),
            "Fetched catalog page"
        );

        let has_more = page.has_more();
        self.items.extend(page.items);
        page.next_cursor.filter(|_| has_more)
    }

    /// Checked before each follow-up request, never after the last page read
    fn advance(&self, cursor: String) -> Result<String> {
        if self.pages >= self.max_pages {
            return Err(SyncError::PageLimitExceeded {
                listing: self.listing.clone(),
                max_pages: self.max_pages,
            });
        }
        Ok(cursor)
    }
}

/// Page-walking front end over a catalog provider
#[derive(Clone)]
pub struct CatalogClient {
    provider: Arc<dyn CatalogProvider>,
    max_pages: usize,
}

impl CatalogClient {
    pub fn new(provider: Arc<dyn CatalogProvider>) -> Self {
        Self {
            provider,
            max_pages: DEFAULT_MAX_PAGES,
        }
    }

    pub fn with_max_pages(mut self, max_pages: usize) -> Self {
        self.max_pages = max_pages.max(1);
        self
    }

    pub fn provider_key(&self) -> &'static str {
        self.provider.provider_key()
    }

    #[instrument(skip(self, credential))]
    pub async fn fetch_artist(
        &self,
        credential: &Credential,
        artist_id: &str,
    ) -> Result<ExternalArtist> {
        Ok(self
            .provider
            .get_artist(&credential.access_token, artist_id)
            .await?)
    }

    /// Every album, single and compilation of `artist_id`, in provider order
    #[instrument(skip(self, credential))]
    pub async fn fetch_artist_albums(
        &self,
        credential: &Credential,
        artist_id: &str,
    ) -> Result<Vec<ExternalAlbum>> {
        let mut walk = PageWalk::new(format!("albums of {}", artist_id), self.max_pages);
        let mut cursor = None;

        loop {
            let page = self
                .provider
                .get_artist_albums_page(&credential.access_token, artist_id, cursor)
                .await?;
            match walk.accept(page) {
                Some(next) => cursor = Some(walk.advance(next)?),
                None => break,
            }
        }

        debug!(artist_id, pages = walk.pages, albums = walk.items.len(), "Album walk complete");
        Ok(walk.items)
    }

    /// Artists followed by the credential's owner
    ///
    /// Only the first page is read unless `walk_all` is set.
    #[instrument(skip(self, credential))]
    pub async fn fetch_followed_artists(
        &self,
        credential: &Credential,
        walk_all: bool,
    ) -> Result<Vec<ExternalArtist>> {
        let mut walk = PageWalk::new("followed artists".to_string(), self.max_pages);
        let mut cursor = None;

        loop {
            let page = self
                .provider
                .get_followed_artists_page(&credential.access_token, cursor)
                .await?;
            match walk.accept(page) {
                Some(next) if walk_all => cursor = Some(walk.advance(next)?),
                Some(_) => {
                    debug!(
                        items = walk.items.len(),
                        "Followed artists truncated to the first page"
                    );
                    break;
                }
                None => break,
            }
        }

        Ok(walk.items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bridge_traits::error::{BridgeError, Result as BridgeResult};
    use chrono::{Duration, Utc};
    use core_auth::CredentialKind;
    use mockall::{mock, predicate::eq, Sequence};

    mock! {
        Provider {}

        #[async_trait]
        impl CatalogProvider for Provider {
            fn provider_key(&self) -> &'static str;
            async fn get_artist(&self, access_token: &str, artist_id: &str) -> BridgeResult<ExternalArtist>;
            async fn get_artist_albums_page(
                &self,
                access_token: &str,
                artist_id: &str,
                cursor: Option<String>,
            ) -> BridgeResult<CatalogPage<ExternalAlbum>>;
            async fn get_followed_artists_page(
                &self,
                access_token: &str,
                cursor: Option<String>,
            ) -> BridgeResult<CatalogPage<ExternalArtist>>;
        }
    }

    fn credential() -> Credential {
        Credential::new(
            "token".to_string(),
            "Bearer".to_string(),
            Utc::now() + Duration::hours(1),
            CredentialKind::App,
        )
    }

    fn albums(range: std::ops::Range<usize>) -> Vec<ExternalAlbum> {
        range
            .map(|i| ExternalAlbum {
                id: format!("al-{}", i),
                name: format!("Album {}", i),
                release_date: "2000".to_string(),
                release_date_precision: None,
                images: vec![],
                artist_id: "artist".to_string(),
            })
            .collect()
    }

    fn artist(id: &str) -> ExternalArtist {
        ExternalArtist {
            id: id.to_string(),
            name: id.to_uppercase(),
            images: vec![],
            genres: vec![],
        }
    }

    #[tokio::test]
    async fn test_album_walk_follows_cursors_in_order() {
        let mut provider = MockProvider::new();
        let mut seq = Sequence::new();
        provider
            .expect_get_artist_albums_page()
            .with(eq("token"), eq("artist"), eq(None::<String>))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _, _| Ok(CatalogPage::new(albums(0..50), Some("p2".to_string()))));
        provider
            .expect_get_artist_albums_page()
            .with(eq("token"), eq("artist"), eq(Some("p2".to_string())))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _, _| Ok(CatalogPage::new(albums(50..100), Some("p3".to_string()))));
        provider
            .expect_get_artist_albums_page()
            .with(eq("token"), eq("artist"), eq(Some("p3".to_string())))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _, _| Ok(CatalogPage::new(albums(100..120), None)));

        let client = CatalogClient::new(Arc::new(provider));
        let all = client.fetch_artist_albums(&credential(), "artist").await.unwrap();

        assert_eq!(all.len(), 120);
        assert!(all.iter().enumerate().all(|(i, a)| a.id == format!("al-{}", i)));
    }

    #[tokio::test]
    async fn test_failing_page_fails_the_walk() {
        let mut provider = MockProvider::new();
        let mut seq = Sequence::new();
        provider
            .expect_get_artist_albums_page()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _, _| Ok(CatalogPage::new(albums(0..50), Some("p2".to_string()))));
        provider
            .expect_get_artist_albums_page()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _, _| Err(BridgeError::OperationFailed("status 502".to_string())));

        let client = CatalogClient::new(Arc::new(provider));
        let err = client
            .fetch_artist_albums(&credential(), "artist")
            .await
            .unwrap_err();

        assert!(matches!(err, SyncError::Provider(_)));
    }

    #[tokio::test]
    async fn test_endless_cursor_hits_page_limit() {
        let mut provider = MockProvider::new();
        provider
            .expect_get_artist_albums_page()
            .times(3)
            .returning(|_, _, _| Ok(CatalogPage::new(albums(0..1), Some("again".to_string()))));

        let client = CatalogClient::new(Arc::new(provider)).with_max_pages(3);
        let err = client
            .fetch_artist_albums(&credential(), "artist")
            .await
            .unwrap_err();

        assert!(matches!(err, SyncError::PageLimitExceeded { max_pages: 3, .. }));
    }

    #[tokio::test]
    async fn test_followed_artists_first_page_only_by_default() {
        let mut provider = MockProvider::new();
        provider
            .expect_get_followed_artists_page()
            .times(1)
            .returning(|_, _| Ok(CatalogPage::new(vec![artist("a"), artist("b")], Some("b".to_string()))));

        let client = CatalogClient::new(Arc::new(provider));
        let followed = client
            .fetch_followed_artists(&credential(), false)
            .await
            .unwrap();

        assert_eq!(followed.len(), 2);
    }

    #[tokio::test]
    async fn test_first_page_only_read_ignores_page_limit() {
        let mut provider = MockProvider::new();
        provider
            .expect_get_followed_artists_page()
            .times(1)
            .returning(|_, _| Ok(CatalogPage::new(vec![artist("a")], Some("a".to_string()))));

        let client = CatalogClient::new(Arc::new(provider)).with_max_pages(1);
        let followed = client
            .fetch_followed_artists(&credential(), false)
            .await
            .unwrap();

        assert_eq!(followed.len(), 1);
    }

    #[tokio::test]
    async fn test_full_followed_walk_respects_page_limit() {
        let mut provider = MockProvider::new();
        provider
            .expect_get_followed_artists_page()
            .times(1)
            .returning(|_, _| Ok(CatalogPage::new(vec![artist("a")], Some("a".to_string()))));

        let client = CatalogClient::new(Arc::new(provider)).with_max_pages(1);
        let err = client
            .fetch_followed_artists(&credential(), true)
            .await
            .unwrap_err();

        assert!(matches!(err, SyncError::PageLimitExceeded { max_pages: 1, .. }));
    }

    #[tokio::test]
    async fn test_followed_artists_full_walk() {
        let mut provider = MockProvider::new();
        let mut seq = Sequence::new();
        provider
            .expect_get_followed_artists_page()
            .with(eq("token"), eq(None::<String>))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(CatalogPage::new(vec![artist("a")], Some("a".to_string()))));
        provider
            .expect_get_followed_artists_page()
            .with(eq("token"), eq(Some("a".to_string())))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(CatalogPage::new(vec![artist("b")], None)));

        let client = CatalogClient::new(Arc::new(provider));
        let followed = client
            .fetch_followed_artists(&credential(), true)
            .await
            .unwrap();

        let ids: Vec<_> = followed.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_fetch_artist_passes_token() {
        let mut provider = MockProvider::new();
        provider
            .expect_get_artist()
            .with(eq("token"), eq("x"))
            .times(1)
            .returning(|_, id| Ok(artist(id)));

        let client = CatalogClient::new(Arc::new(provider));
        let found = client.fetch_artist(&credential(), "x").await.unwrap();
        assert_eq!(found.name, "X");
    }
}
