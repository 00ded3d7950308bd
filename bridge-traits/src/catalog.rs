//! Catalog Provider Abstraction
//!
//! Single-page access to an external music catalog. Walking pages to
//! completion is the caller's job; a provider only ever answers one request.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Image variant attached to an artist or album
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalImage {
    pub url: String,
    pub height: Option<u32>,
    pub width: Option<u32>,
}

/// Granularity of a provider release date
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatePrecision {
    Year,
    Month,
    Day,
}

/// Artist snapshot as returned by the provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalArtist {
    /// Provider-assigned identifier, unique within the provider
    pub id: String,
    pub name: String,
    /// Image variants in provider order
    pub images: Vec<ExternalImage>,
    /// Genre tags in provider order
    pub genres: Vec<String>,
}

/// Album snapshot as returned by the provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalAlbum {
    pub id: String,
    pub name: String,
    /// Raw provider date (`YYYY`, `YYYY-MM` or `YYYY-MM-DD`)
    pub release_date: String,
    pub release_date_precision: Option<DatePrecision>,
    pub images: Vec<ExternalImage>,
    /// Identifier of the artist whose album listing produced this record
    pub artist_id: String,
}

/// One page of a paginated provider listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogPage<T> {
    pub items: Vec<T>,
    /// Opaque continuation cursor; `None` once the listing is exhausted
    pub next_cursor: Option<String>,
}

impl<T> CatalogPage<T> {
    pub fn new(items: Vec<T>, next_cursor: Option<String>) -> Self {
        Self { items, next_cursor }
    }

    /// Whether another page follows this one
    pub fn has_more(&self) -> bool {
        self.next_cursor.as_deref().is_some_and(|c| !c.is_empty())
    }
}

/// External catalog provider trait
///
/// Every call takes the bearer token explicitly so a credential never outlives
/// the sync run that acquired it.
///
/// # Errors
///
/// Implementations map an unknown resource to
/// [`BridgeError::NotFound`](crate::error::BridgeError::NotFound) and a
/// rejected token to [`BridgeError::Unauthorized`](crate::error::BridgeError::Unauthorized).
#[async_trait]
pub trait CatalogProvider: Send + Sync {
    /// Stable key stored in external-identifier maps (e.g. `"spotify"`)
    fn provider_key(&self) -> &'static str;

    /// Fetch a single artist
    async fn get_artist(&self, access_token: &str, artist_id: &str) -> Result<ExternalArtist>;

    /// Fetch one page of an artist's albums, singles and compilations
    async fn get_artist_albums_page(
        &self,
        access_token: &str,
        artist_id: &str,
        cursor: Option<String>,
    ) -> Result<CatalogPage<ExternalAlbum>>;

    /// Fetch one page of the token owner's followed artists
    async fn get_followed_artists_page(
        &self,
        access_token: &str,
        cursor: Option<String>,
    ) -> Result<CatalogPage<ExternalArtist>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_has_more() {
        let last: CatalogPage<u8> = CatalogPage::new(vec![1, 2], None);
        let empty_cursor: CatalogPage<u8> = CatalogPage::new(vec![], Some(String::new()));
        let more: CatalogPage<u8> = CatalogPage::new(vec![3], Some("next".to_string()));

        assert!(!last.has_more());
        assert!(!empty_cursor.has_more());
        assert!(more.has_more());
    }

    #[test]
    fn test_date_precision_deserializes_lowercase() {
        let precision: DatePrecision = serde_json::from_str("\"month\"").unwrap();
        assert_eq!(precision, DatePrecision::Month);
    }
}
