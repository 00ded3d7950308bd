use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Seconds before the provider expiry at which a credential is treated as
/// expired, so no request is sent with a token that lapses in flight.
pub const EXPIRY_BUFFER_SECS: i64 = 60;

/// Supported external catalog providers.
///
/// # Examples
///
/// ```
/// use core_auth::ProviderKind;
///
/// let provider = ProviderKind::Spotify;
/// assert_eq!(provider.display_name(), "Spotify");
/// assert_eq!(provider.as_str(), "spotify");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProviderKind {
    Spotify,
}

impl ProviderKind {
    /// Get the human-readable display name for this provider
    pub fn display_name(&self) -> &'static str {
        match self {
            ProviderKind::Spotify => "Spotify",
        }
    }

    /// Get the provider identifier string
    ///
    /// This is the key stored in external-identifier maps, so it must never
    /// change for an existing provider.
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Spotify => "spotify",
        }
    }

    /// Parse a provider kind from a string identifier
    ///
    /// ```
    /// use core_auth::ProviderKind;
    ///
    /// assert_eq!(ProviderKind::parse("Spotify"), Some(ProviderKind::Spotify));
    /// assert_eq!(ProviderKind::parse("invalid"), None);
    /// ```
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "spotify" => Some(ProviderKind::Spotify),
            _ => None,
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Who a credential acts for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum CredentialKind {
    /// Application-scoped client-credentials token
    App,
    /// Token delegated by an internal user
    User { user_id: String },
}

impl CredentialKind {
    pub fn label(&self) -> &'static str {
        match self {
            CredentialKind::App => "app",
            CredentialKind::User { .. } => "user",
        }
    }

    pub fn user_id(&self) -> Option<&str> {
        match self {
            CredentialKind::App => None,
            CredentialKind::User { user_id } => Some(user_id),
        }
    }
}

/// Bearer credential scoped to a single sync run.
///
/// Credentials are never persisted. Each run acquires its own and drops it
/// when the run ends.
///
/// # Security
///
/// The `Debug` implementation redacts the access token.
///
/// # Examples
///
/// ```
/// use core_auth::{Credential, CredentialKind};
/// use chrono::{Duration, Utc};
///
/// let credential = Credential::new(
///     "BQD...".to_string(),
///     "Bearer".to_string(),
///     Utc::now() + Duration::hours(1),
///     CredentialKind::App,
/// );
///
/// assert!(!credential.is_expired());
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    /// Opaque bearer token
    pub access_token: String,
    /// Token type as reported by the issuer (normally `Bearer`)
    pub token_type: String,
    /// When the token stops being accepted (UTC)
    pub expires_at: DateTime<Utc>,
    pub kind: CredentialKind,
}

impl Credential {
    pub fn new(
        access_token: String,
        token_type: String,
        expires_at: DateTime<Utc>,
        kind: CredentialKind,
    ) -> Self {
        Self {
            access_token,
            token_type,
            expires_at,
            kind,
        }
    }

    /// Build a credential that expires `expires_in` seconds after `issued_at`
    pub fn issued_at(
        access_token: String,
        token_type: String,
        issued_at: DateTime<Utc>,
        expires_in: i64,
        kind: CredentialKind,
    ) -> Self {
        Self::new(
            access_token,
            token_type,
            issued_at + Duration::seconds(expires_in),
            kind,
        )
    }

    /// Check if the credential is expired or within the expiry buffer
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    /// Check expiry against an explicit instant
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at - Duration::seconds(EXPIRY_BUFFER_SECS)
    }

    /// Get the time remaining until expiry, `None` once expired
    pub fn time_until_expiry(&self) -> Option<Duration> {
        let remaining = self.expires_at - Utc::now();
        (remaining > Duration::zero()).then_some(remaining)
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("access_token", &"[REDACTED]")
            .field("token_type", &self.token_type)
            .field("expires_at", &self.expires_at)
            .field("kind", &self.kind)
            .finish()
    }
}
