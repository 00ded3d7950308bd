//! # Service Configuration
//!
//! Configuration for the catalog sync service.
//!
//! ## Overview
//!
//! [`ServiceConfig`] is assembled with [`ServiceConfigBuilder`] or loaded from
//! the process environment with [`ServiceConfig::from_env`]. Validation is
//! fail-fast: a missing client credential or a zero timeout is reported at
//! startup, not on the first sync.
//!
//! ## Environment
//!
//! | Variable | Meaning | Default |
//! |----------|---------|---------|
//! | `SPOTIFY_ID` | OAuth client id | required |
//! | `SPOTIFY_SECRET` | OAuth client secret | required |
//! | `SPOTIFY_TOKEN_URL` | Client-credentials token endpoint | `https://accounts.spotify.com/api/token` |
//! | `SPOTIFY_API_BASE` | Web API base URL | `https://api.spotify.com/v1` |
//! | `DATABASE_PATH` | SQLite database file | `catalog.db` |
//! | `HTTP_TIMEOUT_SECS` | Per-request timeout | `30` |
//! | `SYNC_RUN_TIMEOUT_SECS` | Whole-run deadline, `0` disables | `300` |
//! | `SYNC_FAILURE_POLICY` | `fail-fast` or `continue` | `fail-fast` |
//! | `SYNC_WALK_FOLLOWED_PAGES` | Walk every followed-artists page | `false` |
//! | `APP_ENV` | `development` switches logging to pretty/debug | unset |
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::ServiceConfig;
//!
//! let config = ServiceConfig::builder()
//!     .client_id("client-id")
//!     .client_secret("client-secret")
//!     .database_path("/var/lib/catalog/catalog.db")
//!     .build()?;
//! ```

use crate::error::{Error, Result};
use crate::logging::LoggingConfig;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_TOKEN_URL: &str = "https://accounts.spotify.com/api/token";
pub const DEFAULT_API_BASE_URL: &str = "https://api.spotify.com/v1";
pub const DEFAULT_DATABASE_PATH: &str = "catalog.db";
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_RUN_TIMEOUT: Duration = Duration::from_secs(300);
pub const DEFAULT_MAX_PAGES: usize = 200;

/// How a multi-artist run reacts to a failing artist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Stop at the first failure; later artists are skipped.
    #[default]
    FailFast,
    /// Record the failure and move on to the next artist.
    Continue,
}

impl FailurePolicy {
    pub fn parse(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "fail-fast" | "fail_fast" | "failfast" => Ok(FailurePolicy::FailFast),
            "continue" => Ok(FailurePolicy::Continue),
            other => Err(Error::Config(format!(
                "Unknown sync failure policy '{}', expected 'fail-fast' or 'continue'",
                other
            ))),
        }
    }
}

/// Sync pipeline tuning
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncSettings {
    /// Deadline for a whole run; `None` disables it
    pub run_timeout: Option<Duration>,
    pub failure_policy: FailurePolicy,
    /// Walk followed artists past the first page
    pub walk_followed_pages: bool,
    /// Upper bound on pages fetched in one walk
    pub max_pages: usize,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            run_timeout: Some(DEFAULT_RUN_TIMEOUT),
            failure_policy: FailurePolicy::FailFast,
            walk_followed_pages: false,
            max_pages: DEFAULT_MAX_PAGES,
        }
    }
}

/// Configuration for the catalog sync service.
#[derive(Clone)]
pub struct ServiceConfig {
    pub client_id: String,
    pub client_secret: String,
    pub token_url: String,
    pub api_base_url: String,
    pub database_path: PathBuf,
    pub http_timeout: Duration,
    pub sync: SyncSettings,
    /// Deployment environment (`APP_ENV`)
    pub app_env: Option<String>,
}

impl std::fmt::Debug for ServiceConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("token_url", &self.token_url)
            .field("api_base_url", &self.api_base_url)
            .field("database_path", &self.database_path)
            .field("http_timeout", &self.http_timeout)
            .field("sync", &self.sync)
            .field("app_env", &self.app_env)
            .finish()
    }
}

impl ServiceConfig {
    pub fn builder() -> ServiceConfigBuilder {
        ServiceConfigBuilder::default()
    }

    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    ///
    /// Empty values are treated as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let mut builder = ServiceConfig::builder();

        if let Some(id) = get("SPOTIFY_ID") {
            builder = builder.client_id(id);
        }
        if let Some(secret) = get("SPOTIFY_SECRET") {
            builder = builder.client_secret(secret);
        }
        if let Some(url) = get("SPOTIFY_TOKEN_URL") {
            builder = builder.token_url(url);
        }
        if let Some(url) = get("SPOTIFY_API_BASE") {
            builder = builder.api_base_url(url);
        }
        if let Some(path) = get("DATABASE_PATH") {
            builder = builder.database_path(path);
        }
        if let Some(secs) = get("HTTP_TIMEOUT_SECS") {
            builder = builder.http_timeout(Duration::from_secs(parse_secs(
                "HTTP_TIMEOUT_SECS",
                &secs,
            )?));
        }
        if let Some(secs) = get("SYNC_RUN_TIMEOUT_SECS") {
            let secs = parse_secs("SYNC_RUN_TIMEOUT_SECS", &secs)?;
            builder = builder.run_timeout((secs > 0).then(|| Duration::from_secs(secs)));
        }
        if let Some(policy) = get("SYNC_FAILURE_POLICY") {
            builder = builder.failure_policy(FailurePolicy::parse(&policy)?);
        }
        if let Some(flag) = get("SYNC_WALK_FOLLOWED_PAGES") {
            builder = builder.walk_followed_pages(parse_bool("SYNC_WALK_FOLLOWED_PAGES", &flag)?);
        }
        if let Some(env) = get("APP_ENV") {
            builder = builder.app_env(env);
        }

        builder.build()
    }

    /// Logging preset for the configured environment.
    pub fn logging(&self) -> LoggingConfig {
        LoggingConfig::for_environment(self.app_env.as_deref())
    }

    /// Validates the configuration and returns an error if invalid.
    pub fn validate(&self) -> Result<()> {
        if self.client_id.trim().is_empty() {
            return Err(Error::CapabilityMissing {
                capability: "client_id".to_string(),
                message: "Provider client id is required for the client-credentials grant. \
                          Set SPOTIFY_ID or call ServiceConfigBuilder::client_id."
                    .to_string(),
            });
        }

        if self.client_secret.trim().is_empty() {
            return Err(Error::CapabilityMissing {
                capability: "client_secret".to_string(),
                message: "Provider client secret is required for the client-credentials grant. \
                          Set SPOTIFY_SECRET or call ServiceConfigBuilder::client_secret."
                    .to_string(),
            });
        }

        for (name, url) in [("token_url", &self.token_url), ("api_base_url", &self.api_base_url)] {
            if !(url.starts_with("https://") || url.starts_with("http://")) {
                return Err(Error::Config(format!(
                    "{} must be an http(s) URL, got '{}'",
                    name, url
                )));
            }
        }

        if self.database_path.as_os_str().is_empty() {
            return Err(Error::Config("Database path cannot be empty".to_string()));
        }

        if self.http_timeout.is_zero() {
            return Err(Error::Config(
                "HTTP timeout must be greater than 0 seconds".to_string(),
            ));
        }

        if self.sync.max_pages == 0 {
            return Err(Error::Config(
                "Page walk limit must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

fn parse_secs(key: &str, value: &str) -> Result<u64> {
    value
        .trim()
        .parse::<u64>()
        .map_err(|_| Error::Config(format!("{} must be a whole number of seconds", key)))
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(Error::Config(format!("{} must be a boolean", key))),
    }
}

/// Builder for constructing [`ServiceConfig`] instances.
#[derive(Default)]
pub struct ServiceConfigBuilder {
    client_id: Option<String>,
    client_secret: Option<String>,
    token_url: Option<String>,
    api_base_url: Option<String>,
    database_path: Option<PathBuf>,
    http_timeout: Option<Duration>,
    sync: SyncSettings,
    app_env: Option<String>,
}

impl ServiceConfigBuilder {
    pub fn client_id(mut self, id: impl Into<String>) -> Self {
        self.client_id = Some(id.into());
        self
    }

    pub fn client_secret(mut self, secret: impl Into<String>) -> Self {
        self.client_secret = Some(secret.into());
        self
    }

    /// Default: [`DEFAULT_TOKEN_URL`]
    pub fn token_url(mut self, url: impl Into<String>) -> Self {
        self.token_url = Some(url.into());
        self
    }

    /// Default: [`DEFAULT_API_BASE_URL`]
    pub fn api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = Some(url.into());
        self
    }

    pub fn database_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.database_path = Some(path.into());
        self
    }

    pub fn http_timeout(mut self, timeout: Duration) -> Self {
        self.http_timeout = Some(timeout);
        self
    }

    /// `None` disables the run deadline.
    pub fn run_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.sync.run_timeout = timeout;
        self
    }

    pub fn failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.sync.failure_policy = policy;
        self
    }

    pub fn walk_followed_pages(mut self, walk: bool) -> Self {
        self.sync.walk_followed_pages = walk;
        self
    }

    pub fn max_pages(mut self, max_pages: usize) -> Self {
        self.sync.max_pages = max_pages;
        self
    }

    pub fn app_env(mut self, env: impl Into<String>) -> Self {
        self.app_env = Some(env.into());
        self
    }

    /// Builds the configuration, failing fast on missing or invalid values.
    pub fn build(self) -> Result<ServiceConfig> {
        let config = ServiceConfig {
            client_id: self.client_id.unwrap_or_default(),
            client_secret: self.client_secret.unwrap_or_default(),
            token_url: self
                .token_url
                .unwrap_or_else(|| DEFAULT_TOKEN_URL.to_string()),
            api_base_url: self
                .api_base_url
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string()),
            database_path: self
                .database_path
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DATABASE_PATH)),
            http_timeout: self.http_timeout.unwrap_or(DEFAULT_HTTP_TIMEOUT),
            sync: self.sync,
            app_env: self.app_env,
        };

        config.validate()?;
        Ok(config)
    }
}
