//! Spotify Web API response types
//!
//! Only the fields the catalog sync reads are modelled; unknown fields are
//! ignored by serde.

use bridge_traits::catalog::{DatePrecision, ExternalAlbum, ExternalArtist, ExternalImage};
use serde::{Deserialize, Serialize};

/// Image object
///
/// See: https://developer.spotify.com/documentation/web-api/reference/get-an-artist
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpotifyImage {
    pub url: String,
    /// Omitted by the API for some user-uploaded images
    #[serde(default)]
    pub height: Option<u32>,
    #[serde(default)]
    pub width: Option<u32>,
}

/// Full or simplified artist object
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpotifyArtist {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub images: Vec<SpotifyImage>,
    /// Absent on simplified artist objects
    #[serde(default)]
    pub genres: Vec<String>,
}

/// Simplified album object returned by the artist albums listing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpotifyAlbum {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub release_date: String,
    #[serde(default)]
    pub release_date_precision: Option<String>,
    #[serde(default)]
    pub images: Vec<SpotifyImage>,
    #[serde(default)]
    pub album_type: Option<String>,
}

/// Offset-based paging object
#[derive(Debug, Deserialize)]
pub struct Paging<T> {
    pub items: Vec<T>,
    /// Absolute URL of the next page, `null` on the last page
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub total: Option<u32>,
}

/// Cursor-based paging object used by `/me/following`
#[derive(Debug, Deserialize)]
pub struct CursorPaging<T> {
    pub items: Vec<T>,
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub cursors: Option<Cursors>,
    #[serde(default)]
    pub total: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct Cursors {
    #[serde(default)]
    pub after: Option<String>,
}

/// Envelope of `GET /me/following?type=artist`
#[derive(Debug, Deserialize)]
pub struct FollowedArtistsResponse {
    pub artists: CursorPaging<SpotifyArtist>,
}

/// Error body: `{"error": {"status": 404, "message": "..."}}`
#[derive(Debug, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorObject,
}

#[derive(Debug, Deserialize)]
pub struct ErrorObject {
    #[serde(default)]
    pub status: Option<u16>,
    #[serde(default)]
    pub message: String,
}

impl From<SpotifyImage> for ExternalImage {
    fn from(image: SpotifyImage) -> Self {
        ExternalImage {
            url: image.url,
            height: image.height,
            width: image.width,
        }
    }
}

impl From<SpotifyArtist> for ExternalArtist {
    fn from(artist: SpotifyArtist) -> Self {
        ExternalArtist {
            id: artist.id,
            name: artist.name,
            images: artist.images.into_iter().map(Into::into).collect(),
            genres: artist.genres,
        }
    }
}

impl SpotifyAlbum {
    /// Convert into the provider-neutral record, tagging it with the artist
    /// whose listing produced it.
    pub fn into_external(self, artist_id: &str) -> ExternalAlbum {
        let precision = self
            .release_date_precision
            .as_deref()
            .and_then(parse_precision);

        ExternalAlbum {
            id: self.id,
            name: self.name,
            release_date: self.release_date,
            release_date_precision: precision,
            images: self.images.into_iter().map(Into::into).collect(),
            artist_id: artist_id.to_string(),
        }
    }
}

fn parse_precision(value: &str) -> Option<DatePrecision> {
    match value {
        "year" => Some(DatePrecision::Year),
        "month" => Some(DatePrecision::Month),
        "day" => Some(DatePrecision::Day),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_artist_without_genres_deserializes() {
        let json = r#"{"id":"a1","name":"Simplified","type":"artist"}"#;
        let artist: SpotifyArtist = serde_json::from_str(json).unwrap();

        assert!(artist.genres.is_empty());
        assert!(artist.images.is_empty());
    }

    #[test]
    fn test_image_dimensions_pass_through() {
        let json = r#"{"id":"a1","name":"N","genres":["jazz"],
            "images":[{"url":"https://i.scdn.co/a","height":640,"width":640},
                      {"url":"https://i.scdn.co/b","height":null,"width":null}]}"#;
        let artist: ExternalArtist = serde_json::from_str::<SpotifyArtist>(json).unwrap().into();

        assert_eq!(artist.images[0].height, Some(640));
        assert_eq!(artist.images[1].width, None);
        assert_eq!(artist.genres, vec!["jazz".to_string()]);
    }

    #[test]
    fn test_album_precision_mapping() {
        let album = SpotifyAlbum {
            id: "al1".to_string(),
            name: "Blue Train".to_string(),
            release_date: "1957-09".to_string(),
            release_date_precision: Some("month".to_string()),
            images: vec![],
            album_type: Some("album".to_string()),
        };

        let external = album.into_external("artist-1");
        assert_eq!(external.release_date_precision, Some(DatePrecision::Month));
        assert_eq!(external.artist_id, "artist-1");
    }

    #[test]
    fn test_unknown_precision_is_dropped() {
        let album = SpotifyAlbum {
            id: "al1".to_string(),
            name: "X".to_string(),
            release_date: "2001".to_string(),
            release_date_precision: Some("decade".to_string()),
            images: vec![],
            album_type: None,
        };

        assert_eq!(album.into_external("a").release_date_precision, None);
    }

    #[test]
    fn test_followed_envelope() {
        let json = r#"{"artists":{"items":[{"id":"a","name":"A"}],
            "next":"https://api.spotify.com/v1/me/following?type=artist&after=a",
            "cursors":{"after":"a"},"total":7,"limit":1}}"#;
        let response: FollowedArtistsResponse = serde_json::from_str(json).unwrap();

        assert_eq!(response.artists.items.len(), 1);
        assert_eq!(
            response.artists.cursors.and_then(|c| c.after),
            Some("a".to_string())
        );
    }
}
