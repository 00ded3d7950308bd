//! Request and response messages for the catalog RPCs
//!
//! Field names follow the wire format (camelCase).

use bridge_traits::catalog::{ExternalAlbum, ExternalArtist, ExternalImage};
use chrono::SecondsFormat;
use core_library::InternalArtist;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogImage {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
}

impl From<&ExternalImage> for CatalogImage {
    fn from(image: &ExternalImage) -> Self {
        Self {
            url: image.url.clone(),
            height: image.height,
            width: image.width,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetArtistRequest {
    pub id: String,
}

/// Artist as the provider describes it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogArtist {
    pub id: String,
    pub name: String,
    pub images: Vec<CatalogImage>,
    pub genres: Vec<String>,
}

impl From<&ExternalArtist> for CatalogArtist {
    fn from(artist: &ExternalArtist) -> Self {
        Self {
            id: artist.id.clone(),
            name: artist.name.clone(),
            images: artist.images.iter().map(CatalogImage::from).collect(),
            genres: artist.genres.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetArtistForUserRequest {
    pub user_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetArtistForUserResponse {
    pub external_artist_ids: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetReleasesRequest {
    pub artist_id: String,
}

/// One album, single or compilation; `release_date` is the provider's raw
/// string (`YYYY`, `YYYY-MM` or `YYYY-MM-DD`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Release {
    pub id: String,
    pub name: String,
    pub images: Vec<CatalogImage>,
    pub release_date: String,
}

impl From<&ExternalAlbum> for Release {
    fn from(album: &ExternalAlbum) -> Self {
        Self {
            id: album.id.clone(),
            name: album.name.clone(),
            images: album.images.iter().map(CatalogImage::from).collect(),
            release_date: album.release_date.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetReleasesResponse {
    pub releases: Vec<Release>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateArtistsRequest {
    pub user_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateArtistsResponse {}

/// Wire integers are signed; see [`core_library::PageRequest::from_signed`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetArtistsRequest {
    #[serde(default)]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtistSummary {
    pub id: String,
    pub name: String,
    pub external_id: String,
    /// RFC 3339, UTC
    pub last_updated: String,
}

impl From<&InternalArtist> for ArtistSummary {
    fn from(artist: &InternalArtist) -> Self {
        Self {
            id: artist.id.clone(),
            name: artist.name.clone(),
            external_id: artist.external_id.clone(),
            last_updated: artist
                .last_synced()
                .to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetArtistsResponse {
    pub artists: Vec<ArtistSummary>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_release_serializes_camel_case() {
        let release = Release {
            id: "al-1".into(),
            name: "Kind of Blue".into(),
            images: vec![CatalogImage {
                url: "https://i.example/1.jpg".into(),
                height: Some(640),
                width: None,
            }],
            release_date: "1959-08-17".into(),
        };

        let json = serde_json::to_value(&release).unwrap();
        assert_eq!(json["releaseDate"], "1959-08-17");
        assert_eq!(json["images"][0]["height"], 640);
        assert!(json["images"][0].get("width").is_none());
    }

    #[test]
    fn test_artist_summary_formats_last_updated_as_utc() {
        let synced = Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap();
        let artist = InternalArtist::new("Miles Davis", "spotify", "0kbYTNQb4Pb1rPbbaF0pT4", synced);

        let summary = ArtistSummary::from(&artist);
        assert_eq!(summary.external_id, "0kbYTNQb4Pb1rPbbaF0pT4");
        assert_eq!(summary.last_updated, "2024-03-01T12:30:00.000Z");

        let json = serde_json::to_value(&summary).unwrap();
        assert!(json.get("externalId").is_some());
        assert!(json.get("lastUpdated").is_some());
    }

    #[test]
    fn test_get_artists_request_defaults_missing_fields() {
        let request: GetArtistsRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(request, GetArtistsRequest { limit: 0, offset: 0 });
    }

    #[test]
    fn test_user_request_reads_camel_case() {
        let request: GetArtistForUserRequest =
            serde_json::from_str(r#"{"userId":"user-1"}"#).unwrap();
        assert_eq!(request.user_id, "user-1");
    }
}
