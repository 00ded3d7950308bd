//! Spotify Web API connector
//!
//! Implements the `CatalogProvider` trait for the Spotify Web API.

use async_trait::async_trait;
use bridge_traits::catalog::{CatalogPage, CatalogProvider, ExternalAlbum, ExternalArtist};
use bridge_traits::error::BridgeError;
use bridge_traits::http::{HttpClient, HttpMethod, HttpRequest, HttpResponse, RetryPolicy};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument, warn};
use url::Url;

use crate::error::{Result, SpotifyError};
use crate::types::{ErrorResponse, FollowedArtistsResponse, Paging, SpotifyAlbum, SpotifyArtist};

/// Key stored in every external-identifier map produced from this provider
pub const PROVIDER_KEY: &str = "spotify";

/// Spotify Web API base URL
pub const DEFAULT_API_BASE: &str = "https://api.spotify.com/v1";

/// Maximum page size accepted by the albums and following endpoints
const PAGE_SIZE: u32 = 50;

/// Album types requested from the artist albums listing
const ALBUM_GROUPS: &str = "album,single,compilation";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Spotify Web API connector
///
/// Stateless apart from its HTTP client: the bearer token is supplied on
/// every call.
///
/// # Example
///
/// ```ignore
/// use provider_spotify::SpotifyConnector;
/// use bridge_traits::catalog::CatalogProvider;
///
/// let connector = SpotifyConnector::new(http_client);
/// let artist = connector.get_artist(&token, "0OdUWJ0sBjDrqHygGUXeCF").await?;
/// ```
pub struct SpotifyConnector {
    http_client: Arc<dyn HttpClient>,
    api_base: String,
    retry: RetryPolicy,
}

impl SpotifyConnector {
    pub fn new(http_client: Arc<dyn HttpClient>) -> Self {
        Self {
            http_client,
            api_base: DEFAULT_API_BASE.to_string(),
            retry: RetryPolicy::default(),
        }
    }

    /// Point the connector at another API root (trailing slash ignored)
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    /// Override the policy applied to 429 and 5xx responses
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    fn albums_url(&self, artist_id: &str) -> String {
        format!(
            "{}/artists/{}/albums?include_groups={}&limit={}",
            self.api_base,
            urlencoding::encode(artist_id),
            ALBUM_GROUPS,
            PAGE_SIZE
        )
    }

    fn following_url(&self, after: Option<&str>) -> String {
        let mut url = format!(
            "{}/me/following?type=artist&limit={}",
            self.api_base, PAGE_SIZE
        );
        if let Some(after) = after {
            url.push_str(&format!("&after={}", urlencoding::encode(after)));
        }
        url
    }

    /// Accept a provider `next` URL only if it stays under the configured API
    /// root, so the bearer token is never sent elsewhere.
    fn resolve_next_url(&self, cursor: &str) -> Result<String> {
        let base = Url::parse(&self.api_base)
            .map_err(|e| SpotifyError::InvalidCursor(format!("invalid API base: {}", e)))?;
        let next = Url::parse(cursor).map_err(|e| SpotifyError::InvalidCursor(e.to_string()))?;

        if next.origin() != base.origin() || !next.path().starts_with(base.path()) {
            return Err(SpotifyError::InvalidCursor(format!(
                "{} is outside {}",
                next.origin().ascii_serialization(),
                self.api_base
            )));
        }

        Ok(next.into())
    }

    fn backoff(&self, attempt: u32, response: Option<&HttpResponse>) -> Duration {
        self.retry
            .delay_for(attempt, response.and_then(HttpResponse::retry_after))
    }

    fn error_message(response: &HttpResponse) -> String {
        match serde_json::from_slice::<ErrorResponse>(&response.body) {
            Ok(body) if !body.error.message.is_empty() => body.error.message,
            _ => String::from_utf8_lossy(&response.body).to_string(),
        }
    }

    /// Execute a GET with retry on rate limiting and server errors
    #[instrument(skip(self, access_token))]
    async fn execute_with_retry(
        &self,
        access_token: &str,
        url: &str,
        resource: &str,
    ) -> Result<HttpResponse> {
        let max_attempts = self.retry.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            attempt += 1;
            let request = HttpRequest::new(HttpMethod::Get, url)
                .bearer_token(access_token)
                .header("Accept", "application/json")
                .timeout(REQUEST_TIMEOUT);

            let response = match self.http_client.execute(request).await {
                Ok(response) => response,
                Err(e) => {
                    if attempt >= max_attempts {
                        warn!("API request failed after {} attempts: {}", attempt, e);
                        return Err(e.into());
                    }
                    let delay = self.backoff(attempt, None);
                    warn!(
                        "API request failed (attempt {}/{}): {}, retrying in {:?}",
                        attempt, max_attempts, e, delay
                    );
                    tokio::time::sleep(delay).await;
                    continue;
                }
            };

            let status = response.status;
            if response.is_success() {
                debug!("API request succeeded: status={}", status);
                return Ok(response);
            }

            match status {
                401 => return Err(SpotifyError::AuthenticationFailed(Self::error_message(&response))),
                404 => {
                    return Err(SpotifyError::NotFound {
                        resource: resource.to_string(),
                    })
                }
                429 | 500..=599 => {
                    if attempt >= max_attempts {
                        warn!(
                            "API request failed after {} attempts: status={}",
                            attempt, status
                        );
                        return Err(if status == 429 {
                            SpotifyError::RateLimitExceeded { attempts: attempt }
                        } else {
                            SpotifyError::ApiError {
                                status_code: status,
                                message: Self::error_message(&response),
                            }
                        });
                    }
                    let delay = self.backoff(attempt, Some(&response));
                    warn!(
                        "API request failed (attempt {}/{}): status={}, retrying in {:?}",
                        attempt, max_attempts, status, delay
                    );
                    tokio::time::sleep(delay).await;
                }
                _ => {
                    warn!("API request failed: status={}", status);
                    return Err(SpotifyError::ApiError {
                        status_code: status,
                        message: Self::error_message(&response),
                    });
                }
            }
        }
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        access_token: &str,
        url: &str,
        resource: &str,
    ) -> Result<T> {
        let response = self.execute_with_retry(access_token, url, resource).await?;
        serde_json::from_slice(&response.body).map_err(|e| SpotifyError::ParseError(e.to_string()))
    }

    async fn fetch_artist(&self, access_token: &str, artist_id: &str) -> Result<ExternalArtist> {
        let url = format!("{}/artists/{}", self.api_base, urlencoding::encode(artist_id));
        let artist: SpotifyArtist = self
            .get_json(access_token, &url, &format!("artist {}", artist_id))
            .await?;
        Ok(artist.into())
    }

    async fn fetch_albums_page(
        &self,
        access_token: &str,
        artist_id: &str,
        cursor: Option<String>,
    ) -> Result<CatalogPage<ExternalAlbum>> {
        let url = match cursor.as_deref().filter(|c| !c.is_empty()) {
            Some(next) => self.resolve_next_url(next)?,
            None => self.albums_url(artist_id),
        };

        let page: Paging<SpotifyAlbum> = self
            .get_json(access_token, &url, &format!("albums of artist {}", artist_id))
            .await?;

        debug!(
            artist_id,
            items = page.items.len(),
            total = ?page.total,
            has_next = page.next.is_some(),
            "Fetched album page"
        );

        let items = page
            .items
            .into_iter()
            .map(|album| album.into_external(artist_id))
            .collect();
        Ok(CatalogPage::new(items, page.next))
    }

    async fn fetch_followed_page(
        &self,
        access_token: &str,
        cursor: Option<String>,
    ) -> Result<CatalogPage<ExternalArtist>> {
        let url = self.following_url(cursor.as_deref().filter(|c| !c.is_empty()));
        let response: FollowedArtistsResponse = self
            .get_json(access_token, &url, "followed artists")
            .await?;
        let page = response.artists;

        // `cursors.after` can outlive the last page; `next` is authoritative.
        let next_cursor = match page.next {
            Some(_) => page.cursors.and_then(|c| c.after),
            None => None,
        };

        debug!(
            items = page.items.len(),
            total = ?page.total,
            has_next = next_cursor.is_some(),
            "Fetched followed artists page"
        );

        let items = page.items.into_iter().map(Into::into).collect();
        Ok(CatalogPage::new(items, next_cursor))
    }
}

#[async_trait]
impl CatalogProvider for SpotifyConnector {
    fn provider_key(&self) -> &'static str {
        PROVIDER_KEY
    }

    #[instrument(skip(self, access_token))]
    async fn get_artist(
        &self,
        access_token: &str,
        artist_id: &str,
    ) -> bridge_traits::error::Result<ExternalArtist> {
        self.fetch_artist(access_token, artist_id)
            .await
            .map_err(BridgeError::from)
    }

    #[instrument(skip(self, access_token, cursor))]
    async fn get_artist_albums_page(
        &self,
        access_token: &str,
        artist_id: &str,
        cursor: Option<String>,
    ) -> bridge_traits::error::Result<CatalogPage<ExternalAlbum>> {
        self.fetch_albums_page(access_token, artist_id, cursor)
            .await
            .map_err(BridgeError::from)
    }

    #[instrument(skip(self, access_token, cursor))]
    async fn get_followed_artists_page(
        &self,
        access_token: &str,
        cursor: Option<String>,
    ) -> bridge_traits::error::Result<CatalogPage<ExternalArtist>> {
        self.fetch_followed_page(access_token, cursor)
            .await
            .map_err(BridgeError::from)
    }
}
