//! Sibling Registry Contracts
//!
//! The user registry owns delegated provider tokens; the artist registry is the
//! downstream system of record that reconciled artists are mirrored to.
//! Only the contracts live here. Transports are supplied by the host.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// User record as exposed by the user registry
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryUser {
    pub id: String,
    /// Provider access token delegated by the user
    pub delegated_access_token: String,
}

impl std::fmt::Debug for RegistryUser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistryUser")
            .field("id", &self.id)
            .field("delegated_access_token", &"[REDACTED]")
            .finish()
    }
}

/// Image carried in a registration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryImage {
    pub url: String,
    pub height: Option<u32>,
    pub width: Option<u32>,
}

/// Album carried in a registration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryAlbum {
    pub name: String,
    pub release_date: DateTime<Utc>,
    pub images: Vec<RegistryImage>,
    pub external_ids: BTreeMap<String, String>,
}

/// Payload for `CreateArtist`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtistRegistration {
    pub name: String,
    pub images: Vec<RegistryImage>,
    pub albums: Vec<RegistryAlbum>,
    /// Provider key to external identifier
    pub external_ids: BTreeMap<String, String>,
}

/// User registry trait
///
/// Returns [`BridgeError::NotFound`](crate::error::BridgeError::NotFound) for an
/// unknown user id.
#[async_trait]
pub trait UserRegistry: Send + Sync {
    async fn get_user(&self, user_id: &str) -> Result<RegistryUser>;
}

/// Artist registry trait
#[async_trait]
pub trait ArtistRegistry: Send + Sync {
    /// Register an artist and return the identifier assigned by the registry
    async fn create_artist(&self, registration: ArtistRegistration) -> Result<String>;
}
