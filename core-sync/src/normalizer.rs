//! # Record Normalizer
//!
//! Maps provider records into the transfer shapes consumed by reconciliation.
//! Pure: no I/O and no clock.
//!
//! Release dates arrive at year, month or day precision and are pinned to
//! midnight UTC of the first day they cover (`1965` → 1965-01-01T00:00:00Z).
//! When the provider omits the precision it is inferred from the string shape.

use bridge_traits::catalog::{DatePrecision, ExternalAlbum, ExternalArtist, ExternalImage};
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NormalizeError {
    #[error("{entity} has an empty identifier")]
    EmptyIdentifier { entity: &'static str },

    #[error("Album {album_id} has an invalid release date '{value}'")]
    InvalidReleaseDate { album_id: String, value: String },
}

/// Normalized album
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlbumTransfer {
    pub external_id: String,
    pub name: String,
    pub released_at: DateTime<Utc>,
    pub images: Vec<ExternalImage>,
    /// Exactly one entry: provider key → external id
    pub external_ids: BTreeMap<String, String>,
}

/// Normalized artist with its albums in provider order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtistTransfer {
    pub provider: String,
    pub external_id: String,
    pub name: String,
    pub images: Vec<ExternalImage>,
    pub genres: Vec<String>,
    pub albums: Vec<AlbumTransfer>,
}

impl ArtistTransfer {
    pub fn external_ids(&self) -> BTreeMap<String, String> {
        BTreeMap::from([(self.provider.clone(), self.external_id.clone())])
    }
}

/// Normalizer bound to one provider key
#[derive(Debug, Clone)]
pub struct RecordNormalizer {
    provider: String,
}

impl RecordNormalizer {
    pub fn new(provider: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
        }
    }

    pub fn provider(&self) -> &str {
        &self.provider
    }

    pub fn normalize_artist(
        &self,
        artist: &ExternalArtist,
        albums: &[ExternalAlbum],
    ) -> Result<ArtistTransfer, NormalizeError> {
        if artist.id.trim().is_empty() {
            return Err(NormalizeError::EmptyIdentifier { entity: "artist" });
        }

        let albums = albums
            .iter()
            .map(|album| self.normalize_album(album))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(ArtistTransfer {
            provider: self.provider.clone(),
            external_id: artist.id.clone(),
            name: artist.name.clone(),
            images: artist.images.clone(),
            genres: artist.genres.clone(),
            albums,
        })
    }

    pub fn normalize_album(&self, album: &ExternalAlbum) -> Result<AlbumTransfer, NormalizeError> {
        if album.id.trim().is_empty() {
            return Err(NormalizeError::EmptyIdentifier { entity: "album" });
        }

        let released_at = parse_release_date(&album.release_date, album.release_date_precision)
            .ok_or_else(|| NormalizeError::InvalidReleaseDate {
                album_id: album.id.clone(),
                value: album.release_date.clone(),
            })?;

        Ok(AlbumTransfer {
            external_id: album.id.clone(),
            name: album.name.clone(),
            released_at,
            images: album.images.clone(),
            external_ids: BTreeMap::from([(self.provider.clone(), album.id.clone())]),
        })
    }
}

fn infer_precision(value: &str) -> Option<DatePrecision> {
    match value.split('-').count() {
        1 => Some(DatePrecision::Year),
        2 => Some(DatePrecision::Month),
        3 => Some(DatePrecision::Day),
        _ => None,
    }
}

/// Midnight UTC of the first day covered by `value`
pub fn parse_release_date(value: &str, precision: Option<DatePrecision>) -> Option<DateTime<Utc>> {
    let value = value.trim();
    let precision = precision.or_else(|| infer_precision(value))?;
    let mut parts = value.split('-');

    let year: i32 = parts.next()?.parse().ok()?;
    let month: u32 = match precision {
        DatePrecision::Year => 1,
        DatePrecision::Month | DatePrecision::Day => parts.next()?.parse().ok()?,
    };
    let day: u32 = match precision {
        DatePrecision::Day => parts.next()?.parse().ok()?,
        _ => 1,
    };

    let midnight = NaiveDate::from_ymd_opt(year, month, day)?.and_hms_opt(0, 0, 0)?;
    Some(Utc.from_utc_datetime(&midnight))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image(url: &str, size: Option<u32>) -> ExternalImage {
        ExternalImage {
            url: url.to_string(),
            height: size,
            width: size,
        }
    }

    fn album(id: &str, date: &str, precision: Option<DatePrecision>) -> ExternalAlbum {
        ExternalAlbum {
            id: id.to_string(),
            name: format!("Album {}", id),
            release_date: date.to_string(),
            release_date_precision: precision,
            images: vec![image("https://i/a", Some(300))],
            artist_id: "artist".to_string(),
        }
    }

    fn midnight(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_release_date_precisions() {
        assert_eq!(
            parse_release_date("1965", Some(DatePrecision::Year)),
            Some(midnight(1965, 1, 1))
        );
        assert_eq!(
            parse_release_date("1965-12", Some(DatePrecision::Month)),
            Some(midnight(1965, 12, 1))
        );
        assert_eq!(
            parse_release_date("1965-12-09", Some(DatePrecision::Day)),
            Some(midnight(1965, 12, 9))
        );
    }

    #[test]
    fn test_release_date_precision_inferred() {
        assert_eq!(parse_release_date("2001", None), Some(midnight(2001, 1, 1)));
        assert_eq!(parse_release_date("2001-07", None), Some(midnight(2001, 7, 1)));
        assert_eq!(parse_release_date("2001-07-04", None), Some(midnight(2001, 7, 4)));
    }

    #[test]
    fn test_coarser_precision_ignores_extra_parts() {
        assert_eq!(
            parse_release_date("1999-05-17", Some(DatePrecision::Year)),
            Some(midnight(1999, 1, 1))
        );
    }

    #[test]
    fn test_invalid_release_dates() {
        assert_eq!(parse_release_date("", None), None);
        assert_eq!(parse_release_date("2001-13", None), None);
        assert_eq!(parse_release_date("2001-02-30", None), None);
        assert_eq!(parse_release_date("2001", Some(DatePrecision::Day)), None);
        assert_eq!(parse_release_date("soon", None), None);
    }

    #[test]
    fn test_normalize_artist_preserves_order() {
        let normalizer = RecordNormalizer::new("spotify");
        let artist = ExternalArtist {
            id: "art".to_string(),
            name: "Pharoah Sanders".to_string(),
            images: vec![image("https://i/1", Some(640)), image("https://i/2", None)],
            genres: vec!["spiritual jazz".to_string(), "free jazz".to_string()],
        };
        let albums = vec![
            album("b", "1969", Some(DatePrecision::Year)),
            album("a", "1971-03", None),
        ];

        let transfer = normalizer.normalize_artist(&artist, &albums).unwrap();

        assert_eq!(transfer.provider, "spotify");
        assert_eq!(transfer.images, artist.images);
        assert_eq!(transfer.genres, artist.genres);
        assert_eq!(transfer.albums[0].external_id, "b");
        assert_eq!(transfer.albums[1].released_at, midnight(1971, 3, 1));
        assert_eq!(transfer.albums[1].images[0].height, Some(300));
        assert_eq!(
            transfer.albums[0].external_ids,
            BTreeMap::from([("spotify".to_string(), "b".to_string())])
        );
    }

    #[test]
    fn test_missing_genres_are_empty_not_error() {
        let normalizer = RecordNormalizer::new("spotify");
        let artist = ExternalArtist {
            id: "art".to_string(),
            name: "Quiet".to_string(),
            images: vec![],
            genres: vec![],
        };

        let transfer = normalizer.normalize_artist(&artist, &[]).unwrap();
        assert!(transfer.genres.is_empty());
        assert!(transfer.albums.is_empty());
    }

    #[test]
    fn test_empty_identifiers_rejected() {
        let normalizer = RecordNormalizer::new("spotify");
        let artist = ExternalArtist {
            id: " ".to_string(),
            name: "Nameless".to_string(),
            images: vec![],
            genres: vec![],
        };
        assert_eq!(
            normalizer.normalize_artist(&artist, &[]),
            Err(NormalizeError::EmptyIdentifier { entity: "artist" })
        );

        let err = normalizer.normalize_album(&album("", "2000", None)).unwrap_err();
        assert_eq!(err, NormalizeError::EmptyIdentifier { entity: "album" });
    }

    #[test]
    fn test_bad_album_date_fails_whole_artist() {
        let normalizer = RecordNormalizer::new("spotify");
        let artist = ExternalArtist {
            id: "art".to_string(),
            name: "A".to_string(),
            images: vec![],
            genres: vec![],
        };
        let albums = vec![album("ok", "2000", None), album("bad", "20xx", None)];

        let err = normalizer.normalize_artist(&artist, &albums).unwrap_err();
        assert!(matches!(err, NormalizeError::InvalidReleaseDate { ref album_id, .. } if album_id == "bad"));
    }
}
