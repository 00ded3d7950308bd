//! OAuth 2.0 Client-Credentials Grant
//!
//! Implements the client-credentials flow of RFC 6749 §4.4: the configured
//! application id and secret are exchanged for an app-scoped bearer token.
//!
//! # Retry policy
//!
//! - 4xx responses are terminal (bad client id/secret, revoked app)
//! - transport failures and 5xx are retried with the flow's [`RetryPolicy`]
//!   (three attempts, 100 ms doubling, by default)
//!
//! # Example
//!
//! ```no_run
//! use core_auth::oauth::{ClientCredentialsConfig, ClientCredentialsFlow};
//! use core_auth::ProviderKind;
//! use std::sync::Arc;
//!
//! # async fn example() -> core_auth::Result<()> {
//! # use bridge_traits::http::HttpClient;
//! # let http_client: Arc<dyn HttpClient> = todo!();
//! let config = ClientCredentialsConfig::new(
//!     ProviderKind::Spotify,
//!     "client-id",
//!     "client-secret",
//!     "https://accounts.spotify.com/api/token",
//! );
//!
//! let flow = ClientCredentialsFlow::new(config, http_client);
//! let credential = flow.exchange().await?;
//! # Ok(())
//! # }
//! ```

use crate::error::{AuthError, Result};
use crate::types::{Credential, CredentialKind, ProviderKind};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use bridge_traits::http::{HttpClient, HttpMethod, HttpRequest, RetryPolicy};
use bridge_traits::time::{Clock, SystemClock};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::time::sleep;
use tracing::{instrument, warn};

/// Client-credentials provider configuration.
#[derive(Clone)]
pub struct ClientCredentialsConfig {
    pub provider: ProviderKind,
    pub client_id: String,
    pub client_secret: String,
    /// Token endpoint URL
    pub token_url: String,
    /// Optional scopes; catalog reads need none
    pub scopes: Vec<String>,
}

impl ClientCredentialsConfig {
    pub fn new(
        provider: ProviderKind,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        token_url: impl Into<String>,
    ) -> Self {
        Self {
            provider,
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            token_url: token_url.into(),
            scopes: Vec::new(),
        }
    }

    fn basic_authorization(&self) -> String {
        let raw = format!("{}:{}", self.client_id, self.client_secret);
        format!("Basic {}", STANDARD.encode(raw))
    }
}

impl std::fmt::Debug for ClientCredentialsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientCredentialsConfig")
            .field("provider", &self.provider)
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("token_url", &self.token_url)
            .field("scopes", &self.scopes)
            .finish()
    }
}

/// Client-credentials token exchanger.
pub struct ClientCredentialsFlow {
    config: ClientCredentialsConfig,
    http_client: Arc<dyn HttpClient>,
    clock: Arc<dyn Clock>,
    retry: RetryPolicy,
}

impl ClientCredentialsFlow {
    pub fn new(config: ClientCredentialsConfig, http_client: Arc<dyn HttpClient>) -> Self {
        Self {
            config,
            http_client,
            clock: Arc::new(SystemClock),
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Replace the clock used to stamp issued credentials
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn provider(&self) -> ProviderKind {
        self.config.provider
    }

    /// Exchange the configured client id/secret for an app credential.
    ///
    /// # Errors
    ///
    /// - [`AuthError::AuthenticationFailed`] when the token endpoint rejects
    ///   the client (any 4xx)
    /// - [`AuthError::TokenExchangeFailed`] on transport failure, repeated
    ///   5xx or an unreadable response
    #[instrument(skip(self), fields(provider = %self.config.provider))]
    pub async fn exchange(&self) -> Result<Credential> {
        let mut params: Vec<(&str, String)> =
            vec![("grant_type", "client_credentials".to_string())];
        if !self.config.scopes.is_empty() {
            params.push(("scope", self.config.scopes.join(" ")));
        }

        let encoded_body = serde_urlencoded::to_string(&params).map_err(|e| {
            AuthError::TokenExchangeFailed(format!("Failed to encode token request: {}", e))
        })?;

        tracing::debug!("Requesting client-credentials token");

        let mut attempts = 0;

        loop {
            attempts += 1;

            let request = HttpRequest::new(HttpMethod::Post, self.config.token_url.clone())
                .header("Authorization", self.config.basic_authorization())
                .form_body(encoded_body.clone());

            let failure = match self.http_client.execute(request).await {
                Ok(response) if response.is_success() => {
                    let token_response: TokenResponse = response.json().map_err(|e| {
                        AuthError::TokenExchangeFailed(format!(
                            "Failed to parse token response: {}",
                            e
                        ))
                    })?;

                    if token_response.access_token.is_empty() {
                        return Err(AuthError::TokenExchangeFailed(
                            "Token endpoint returned an empty access token".to_string(),
                        ));
                    }

                    tracing::info!(
                        expires_in = token_response.expires_in,
                        "Issued client-credentials token"
                    );

                    return Ok(Credential::issued_at(
                        token_response.access_token,
                        token_response
                            .token_type
                            .unwrap_or_else(|| "Bearer".to_string()),
                        self.clock.now(),
                        token_response.expires_in,
                        CredentialKind::App,
                    ));
                }
                Ok(response) if response.is_client_error() => {
                    let error_body = response.text();

                    warn!(
                        status = response.status,
                        error = %error_body,
                        "Token exchange rejected without retry"
                    );

                    return Err(AuthError::AuthenticationFailed {
                        provider: self.config.provider.to_string(),
                        reason: format!("Token endpoint returned {}: {}", response.status, error_body),
                    });
                }
                Ok(response) => format!("Token endpoint returned {}", response.status),
                Err(e) => e.to_string(),
            };

            if attempts >= self.retry.max_attempts.max(1) {
                return Err(AuthError::TokenExchangeFailed(format!(
                    "Token exchange failed after {} attempts. Last error: {}",
                    attempts, failure
                )));
            }

            let delay = self.retry.delay_for(attempts, None);
            warn!(
                attempts,
                delay_ms = delay.as_millis() as u64,
                error = %failure,
                "Token exchange failed, retrying"
            );
            sleep(delay).await;
        }
    }
}

/// Token response from the OAuth provider.
#[derive(Debug, Deserialize, Serialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    token_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    scope: Option<String>,
}

fn default_expires_in() -> i64 {
    3600 // Default to 1 hour if not specified
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_traits::error::{BridgeError, Result as BridgeResult};
    use bridge_traits::http::HttpResponse;
    use bytes::Bytes;
    use chrono::{DateTime, TimeZone, Utc};
    use std::collections::{HashMap, VecDeque};
    use std::sync::Mutex;

    /// Replays canned responses in order and records requests.
    #[derive(Default)]
    struct ScriptedHttpClient {
        responses: Mutex<VecDeque<BridgeResult<HttpResponse>>>,
        requests: Mutex<Vec<HttpRequest>>,
    }

    impl ScriptedHttpClient {
        fn with(responses: Vec<BridgeResult<HttpResponse>>) -> Arc<Self> {
            Arc::new(Self {
                responses: Mutex::new(responses.into()),
                requests: Mutex::new(Vec::new()),
            })
        }

        fn request_count(&self) -> usize {
            self.requests.lock().unwrap().len()
        }
    }

    #[async_trait::async_trait]
    impl HttpClient for ScriptedHttpClient {
        async fn execute(&self, request: HttpRequest) -> BridgeResult<HttpResponse> {
            self.requests.lock().unwrap().push(request);
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(BridgeError::OperationFailed("no response".to_string())))
        }
    }

    struct FixedClock(DateTime<Utc>);

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.0
        }
    }

    fn response(status: u16, body: &str) -> BridgeResult<HttpResponse> {
        Ok(HttpResponse {
            status,
            headers: HashMap::new(),
            body: Bytes::from(body.to_string()),
        })
    }

    fn config() -> ClientCredentialsConfig {
        ClientCredentialsConfig::new(
            ProviderKind::Spotify,
            "client",
            "secret",
            "https://accounts.example.com/api/token",
        )
    }

    #[tokio::test]
    async fn test_exchange_success_stamps_expiry() {
        let http = ScriptedHttpClient::with(vec![response(
            200,
            r#"{"access_token":"app-token","token_type":"Bearer","expires_in":1800}"#,
        )]);
        let issued = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let flow = ClientCredentialsFlow::new(config(), http.clone())
            .with_clock(Arc::new(FixedClock(issued)));

        let credential = flow.exchange().await.unwrap();

        assert_eq!(credential.access_token, "app-token");
        assert_eq!(credential.kind, CredentialKind::App);
        assert_eq!(credential.expires_at, issued + chrono::Duration::seconds(1800));

        let requests = http.requests.lock().unwrap();
        let request = &requests[0];
        assert_eq!(request.method, HttpMethod::Post);
        assert_eq!(
            request.headers.get("Authorization").map(String::as_str),
            Some("Basic Y2xpZW50OnNlY3JldA==")
        );
        assert_eq!(
            request.body.as_deref(),
            Some(b"grant_type=client_credentials".as_slice())
        );
    }

    #[tokio::test]
    async fn test_exchange_rejected_client_is_not_retried() {
        let http = ScriptedHttpClient::with(vec![response(
            400,
            r#"{"error":"invalid_client"}"#,
        )]);
        let flow = ClientCredentialsFlow::new(config(), http.clone());

        let result = flow.exchange().await;

        assert!(matches!(result, Err(AuthError::AuthenticationFailed { .. })));
        assert_eq!(http.request_count(), 1);
    }

    #[tokio::test]
    async fn test_exchange_retries_server_errors() {
        let http = ScriptedHttpClient::with(vec![
            response(503, "unavailable"),
            Err(BridgeError::OperationFailed("connection reset".to_string())),
            response(200, r#"{"access_token":"third-time"}"#),
        ]);
        let flow = ClientCredentialsFlow::new(config(), http.clone());

        let credential = flow.exchange().await.unwrap();

        assert_eq!(credential.access_token, "third-time");
        assert_eq!(credential.token_type, "Bearer");
        assert_eq!(http.request_count(), 3);
    }

    #[tokio::test]
    async fn test_exchange_gives_up_after_max_retries() {
        let http = ScriptedHttpClient::with(vec![
            response(500, "a"),
            response(502, "b"),
            response(503, "c"),
        ]);
        let flow = ClientCredentialsFlow::new(config(), http.clone());

        let result = flow.exchange().await;

        assert!(matches!(result, Err(AuthError::TokenExchangeFailed(_))));
        assert_eq!(http.request_count(), 3);
    }

    #[tokio::test]
    async fn test_exchange_rejects_empty_token() {
        let http = ScriptedHttpClient::with(vec![response(200, r#"{"access_token":""}"#)]);
        let flow = ClientCredentialsFlow::new(config(), http);

        assert!(matches!(
            flow.exchange().await,
            Err(AuthError::TokenExchangeFailed(_))
        ));
    }

    #[test]
    fn test_token_response_deserialization_minimal() {
        let json = r#"{"access_token": "token"}"#;
        let response: TokenResponse = serde_json::from_str(json).unwrap();

        assert_eq!(response.access_token, "token");
        assert_eq!(response.expires_in, 3600);
        assert!(response.token_type.is_none());
    }

    #[test]
    fn test_scopes_are_space_joined() {
        let mut config = config();
        config.scopes = vec!["a".to_string(), "b".to_string()];
        let encoded = serde_urlencoded::to_string(vec![("scope", config.scopes.join(" "))]).unwrap();
        assert_eq!(encoded, "scope=a+b");
    }

    #[test]
    fn test_config_debug_redacts_secret() {
        let debug = format!("{:?}", config());
        assert!(!debug.contains("\"secret\""));
        assert!(debug.contains("[REDACTED]"));
    }
}
