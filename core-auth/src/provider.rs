//! Credential acquisition for sync runs.
//!
//! App credentials come from the client-credentials grant; user credentials
//! wrap the delegated token held by the user registry. Nothing is cached: every
//! call hands back a fresh, owned [`Credential`].

use crate::error::{AuthError, Result};
use crate::oauth::ClientCredentialsFlow;
use crate::types::{Credential, CredentialKind};
use async_trait::async_trait;
use bridge_traits::error::BridgeError;
use bridge_traits::registry::UserRegistry;
use bridge_traits::time::{Clock, SystemClock};
use chrono::Duration;
use core_runtime::events::{AuthEvent, CoreEvent, EventBus};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Lifetime assumed for delegated user tokens, whose real expiry the user
/// registry does not report. Matches the provider's one-hour access tokens.
pub const DEFAULT_USER_TOKEN_LIFETIME_SECS: i64 = 3600;

/// Source of bearer credentials for sync runs.
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    /// Exchange the application id/secret for an app-scoped credential.
    async fn acquire_app_credential(&self) -> Result<Credential>;

    /// Wrap the user's delegated provider token as a bearer credential.
    async fn acquire_user_credential(&self, user_id: &str) -> Result<Credential>;

    /// Return `credential` unchanged while valid, otherwise re-acquire one of
    /// the same kind.
    async fn ensure_fresh(&self, credential: Credential) -> Result<Credential> {
        if !credential.is_expired() {
            return Ok(credential);
        }

        match credential.kind {
            CredentialKind::App => self.acquire_app_credential().await,
            CredentialKind::User { ref user_id } => self.acquire_user_credential(user_id).await,
        }
    }
}

/// Credential provider backed by the token endpoint and the user registry.
pub struct DefaultCredentialProvider {
    flow: ClientCredentialsFlow,
    users: Arc<dyn UserRegistry>,
    clock: Arc<dyn Clock>,
    user_token_lifetime: Duration,
    event_bus: Option<EventBus>,
}

impl DefaultCredentialProvider {
    pub fn new(flow: ClientCredentialsFlow, users: Arc<dyn UserRegistry>) -> Self {
        Self {
            flow,
            users,
            clock: Arc::new(SystemClock),
            user_token_lifetime: Duration::seconds(DEFAULT_USER_TOKEN_LIFETIME_SECS),
            event_bus: None,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_user_token_lifetime(mut self, lifetime: Duration) -> Self {
        self.user_token_lifetime = lifetime;
        self
    }

    pub fn with_event_bus(mut self, event_bus: EventBus) -> Self {
        self.event_bus = Some(event_bus);
        self
    }

    fn emit(&self, event: AuthEvent) {
        if let Some(bus) = &self.event_bus {
            bus.emit(CoreEvent::Auth(event)).ok();
        }
    }

    fn emit_acquired(&self, credential: &Credential) {
        self.emit(AuthEvent::CredentialAcquired {
            kind: credential.kind.label().to_string(),
            user_id: credential.kind.user_id().map(str::to_string),
            expires_at: Some(credential.expires_at.timestamp()),
        });
    }

    fn emit_failure(&self, user_id: Option<&str>, error: &AuthError) {
        self.emit(AuthEvent::AuthError {
            user_id: user_id.map(str::to_string),
            message: error.to_string(),
        });
    }
}

#[async_trait]
impl CredentialProvider for DefaultCredentialProvider {
    #[instrument(skip(self), fields(provider = %self.flow.provider()))]
    async fn acquire_app_credential(&self) -> Result<Credential> {
        match self.flow.exchange().await {
            Ok(credential) => {
                self.emit_acquired(&credential);
                Ok(credential)
            }
            Err(error) => {
                warn!(error = %error, "App credential exchange failed");
                self.emit_failure(None, &error);
                Err(error)
            }
        }
    }

    #[instrument(skip(self))]
    async fn acquire_user_credential(&self, user_id: &str) -> Result<Credential> {
        let user = self.users.get_user(user_id).await.map_err(|error| {
            let error = match error {
                BridgeError::NotFound(_) => AuthError::UserNotFound(user_id.to_string()),
                other => AuthError::UserLookupFailed {
                    user_id: user_id.to_string(),
                    reason: other.to_string(),
                },
            };
            warn!(error = %error, "User registry lookup failed");
            self.emit_failure(Some(user_id), &error);
            error
        })?;

        if user.delegated_access_token.trim().is_empty() {
            warn!("User has no delegated provider token");
            let error = AuthError::NotAuthenticated;
            self.emit_failure(Some(user_id), &error);
            return Err(error);
        }

        let credential = Credential::new(
            user.delegated_access_token,
            "Bearer".to_string(),
            self.clock.now() + self.user_token_lifetime,
            CredentialKind::User {
                user_id: user_id.to_string(),
            },
        );

        debug!(expires_at = %credential.expires_at, "Wrapped delegated user token");
        self.emit_acquired(&credential);
        Ok(credential)
    }

    async fn ensure_fresh(&self, credential: Credential) -> Result<Credential> {
        if !credential.is_expired_at(self.clock.now()) {
            return Ok(credential);
        }

        info!(kind = credential.kind.label(), "Credential expired, re-acquiring");
        let refreshed = match &credential.kind {
            CredentialKind::App => self.acquire_app_credential().await?,
            CredentialKind::User { user_id } => self.acquire_user_credential(user_id).await?,
        };

        self.emit(AuthEvent::CredentialReacquired {
            kind: refreshed.kind.label().to_string(),
            user_id: refreshed.kind.user_id().map(str::to_string),
        });
        Ok(refreshed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oauth::ClientCredentialsConfig;
    use crate::types::ProviderKind;
    use bridge_traits::error::Result as BridgeResult;
    use bridge_traits::http::{HttpClient, HttpRequest, HttpResponse};
    use bridge_traits::registry::RegistryUser;
    use bytes::Bytes;
    use chrono::{DateTime, TimeZone, Utc};
    use mockall::mock;
    use std::collections::HashMap;
    use std::sync::Mutex;

    mock! {
        Users {}

        #[async_trait]
        impl UserRegistry for Users {
            async fn get_user(&self, user_id: &str) -> BridgeResult<RegistryUser>;
        }
    }

    mock! {
        Http {}

        #[async_trait]
        impl HttpClient for Http {
            async fn execute(&self, request: HttpRequest) -> BridgeResult<HttpResponse>;
        }
    }

    struct SteppingClock(Mutex<DateTime<Utc>>);

    impl SteppingClock {
        fn at(instant: DateTime<Utc>) -> Arc<Self> {
            Arc::new(Self(Mutex::new(instant)))
        }

        fn advance(&self, by: Duration) {
            let mut now = self.0.lock().unwrap();
            *now += by;
        }
    }

    impl Clock for SteppingClock {
        fn now(&self) -> DateTime<Utc> {
            *self.0.lock().unwrap()
        }
    }

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap()
    }

    fn token_http(times: usize) -> Arc<MockHttp> {
        let mut http = MockHttp::new();
        http.expect_execute().times(times).returning(|_| {
            Ok(HttpResponse {
                status: 200,
                headers: HashMap::new(),
                body: Bytes::from(r#"{"access_token":"app-token","expires_in":3600}"#),
            })
        });
        Arc::new(http)
    }

    fn provider(
        http: Arc<MockHttp>,
        users: MockUsers,
        clock: Arc<SteppingClock>,
    ) -> DefaultCredentialProvider {
        let flow = ClientCredentialsFlow::new(
            ClientCredentialsConfig::new(
                ProviderKind::Spotify,
                "id",
                "secret",
                "https://accounts.example.com/api/token",
            ),
            http,
        )
        .with_clock(clock.clone());

        DefaultCredentialProvider::new(flow, Arc::new(users)).with_clock(clock)
    }

    #[tokio::test]
    async fn test_acquire_user_credential_wraps_delegated_token() {
        let mut users = MockUsers::new();
        users
            .expect_get_user()
            .withf(|id| id == "user-1")
            .times(1)
            .returning(|id| {
                Ok(RegistryUser {
                    id: id.to_string(),
                    delegated_access_token: "user-token".to_string(),
                })
            });
        let clock = SteppingClock::at(start());
        let provider = provider(token_http(0), users, clock);

        let credential = provider.acquire_user_credential("user-1").await.unwrap();

        assert_eq!(credential.access_token, "user-token");
        assert_eq!(credential.token_type, "Bearer");
        assert_eq!(
            credential.kind,
            CredentialKind::User {
                user_id: "user-1".to_string()
            }
        );
        assert_eq!(
            credential.expires_at,
            start() + Duration::seconds(DEFAULT_USER_TOKEN_LIFETIME_SECS)
        );
    }

    #[tokio::test]
    async fn test_unknown_user_maps_to_user_not_found() {
        let mut users = MockUsers::new();
        users
            .expect_get_user()
            .returning(|id| Err(BridgeError::NotFound(id.to_string())));
        let provider = provider(token_http(0), users, SteppingClock::at(start()));

        let error = provider.acquire_user_credential("ghost").await.unwrap_err();

        assert!(matches!(error, AuthError::UserNotFound(ref id) if id == "ghost"));
        assert!(error.is_lookup());
    }

    #[tokio::test]
    async fn test_registry_failure_maps_to_lookup_failed() {
        let mut users = MockUsers::new();
        users
            .expect_get_user()
            .returning(|_| Err(BridgeError::OperationFailed("unavailable".to_string())));
        let provider = provider(token_http(0), users, SteppingClock::at(start()));

        let error = provider.acquire_user_credential("user-1").await.unwrap_err();

        assert!(matches!(error, AuthError::UserLookupFailed { .. }));
    }

    #[tokio::test]
    async fn test_empty_delegated_token_is_not_authenticated() {
        let mut users = MockUsers::new();
        users.expect_get_user().returning(|id| {
            Ok(RegistryUser {
                id: id.to_string(),
                delegated_access_token: String::new(),
            })
        });
        let provider = provider(token_http(0), users, SteppingClock::at(start()));

        let error = provider.acquire_user_credential("user-1").await.unwrap_err();

        assert!(matches!(error, AuthError::NotAuthenticated));
    }

    #[tokio::test]
    async fn test_ensure_fresh_keeps_valid_credential() {
        let clock = SteppingClock::at(start());
        let provider = provider(token_http(1), MockUsers::new(), clock.clone());

        let credential = provider.acquire_app_credential().await.unwrap();
        clock.advance(Duration::minutes(30));
        let same = provider.ensure_fresh(credential.clone()).await.unwrap();

        assert_eq!(same, credential);
    }

    #[tokio::test]
    async fn test_ensure_fresh_reacquires_expired_app_credential() {
        let clock = SteppingClock::at(start());
        let provider = provider(token_http(2), MockUsers::new(), clock.clone());
        let bus = EventBus::new(8);
        let mut events = bus.subscribe();
        let provider = provider.with_event_bus(bus);

        let first = provider.acquire_app_credential().await.unwrap();
        clock.advance(Duration::minutes(61));
        let second = provider.ensure_fresh(first.clone()).await.unwrap();

        assert!(second.expires_at > first.expires_at);
        assert_eq!(second.kind, CredentialKind::App);

        let mut reacquired = false;
        while let Ok(event) = events.try_recv() {
            if matches!(event, CoreEvent::Auth(AuthEvent::CredentialReacquired { .. })) {
                reacquired = true;
            }
        }
        assert!(reacquired);
    }

    #[tokio::test]
    async fn test_ensure_fresh_reacquires_expired_user_credential() {
        let mut users = MockUsers::new();
        users.expect_get_user().times(2).returning(|id| {
            Ok(RegistryUser {
                id: id.to_string(),
                delegated_access_token: "user-token".to_string(),
            })
        });
        let clock = SteppingClock::at(start());
        let provider = provider(token_http(0), users, clock.clone());

        let first = provider.acquire_user_credential("user-1").await.unwrap();
        clock.advance(Duration::hours(2));
        let second = provider.ensure_fresh(first).await.unwrap();

        assert_eq!(second.kind.user_id(), Some("user-1"));
        assert!(!second.is_expired_at(clock.now()));
    }
}
