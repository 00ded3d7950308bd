//! # Logging
//!
//! One global `tracing` subscriber per process, installed at startup.
//!
//! `APP_ENV=development` gets pretty output at debug; every other environment
//! gets flattened JSON at info, one object per line. Our crates log at the
//! configured level and HTTP/SQL dependencies at warn. An explicit filter, or
//! `RUST_LOG` when no filter is configured, replaces that default.
//!
//! Access tokens and client secrets are never passed to log macros; skip them
//! in `#[instrument]` and log ids instead.
//!
//! ```ignore
//! use core_runtime::logging::{init_logging, LoggingConfig};
//!
//! init_logging(LoggingConfig::for_environment(Some("development")))?;
//! tracing::info!("Catalog sync service started");
//! ```

use crate::error::{Error, Result};
use std::str::FromStr;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Crates whose level follows [`LoggingConfig::level`]
const WORKSPACE_TARGETS: &[&str] = &[
    "catalog_sync_workspace",
    "bridge_server",
    "core_auth",
    "core_library",
    "core_runtime",
    "core_service",
    "core_sync",
    "provider_spotify",
];

const DEPENDENCY_FILTER: &str = "h2=warn,hyper=warn,reqwest=warn,rustls=warn,sqlx=warn";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    /// One JSON object per line, event fields flattened
    Json,
    Compact,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

impl FromStr for LogLevel {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            other => Err(Error::Config(format!("Unknown log level '{}'", other))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    pub format: LogFormat,
    pub level: LogLevel,
    /// Full `EnvFilter` directive string; overrides `level` and `RUST_LOG`
    pub filter: Option<String>,
    /// Attach the current span (run id, artist id) to each event
    pub span_context: bool,
}

impl LoggingConfig {
    /// Preset for an `APP_ENV` value
    pub fn for_environment(app_env: Option<&str>) -> Self {
        let development = app_env.is_some_and(|env| env.eq_ignore_ascii_case("development"));
        if development {
            Self {
                format: LogFormat::Pretty,
                level: LogLevel::Debug,
                filter: None,
                span_context: true,
            }
        } else {
            Self {
                format: LogFormat::Json,
                level: LogLevel::Info,
                filter: None,
                span_context: true,
            }
        }
    }

    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_level(mut self, level: LogLevel) -> Self {
        self.level = level;
        self
    }

    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    fn directives(&self) -> String {
        if let Some(filter) = &self.filter {
            return filter.clone();
        }
        if let Ok(from_env) = std::env::var(EnvFilter::DEFAULT_ENV) {
            if !from_env.trim().is_empty() {
                return from_env;
            }
        }

        let mut directives: Vec<String> = WORKSPACE_TARGETS
            .iter()
            .map(|target| format!("{}={}", target, self.level.as_str()))
            .collect();
        directives.push(DEPENDENCY_FILTER.to_string());
        directives.join(",")
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self::for_environment(None)
    }
}

/// Install the global subscriber
///
/// Fails if the filter does not parse or a subscriber is already installed.
pub fn init_logging(config: LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_new(config.directives())
        .map_err(|e| Error::Config(format!("Invalid log filter: {}", e)))?;
    let registry = tracing_subscriber::registry().with(filter);

    let installed = match config.format {
        LogFormat::Pretty => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .pretty()
                    .with_span_events(if config.span_context {
                        FmtSpan::CLOSE
                    } else {
                        FmtSpan::NONE
                    }),
            )
            .try_init(),
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .flatten_event(true)
                    .with_current_span(config.span_context)
                    .with_span_list(false),
            )
            .try_init(),
        LogFormat::Compact => registry
            .with(tracing_subscriber::fmt::layer().compact())
            .try_init(),
    };

    installed.map_err(|e| Error::LoggingInstalled(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_environment_presets() {
        let dev = LoggingConfig::for_environment(Some("Development"));
        assert_eq!(dev.format, LogFormat::Pretty);
        assert_eq!(dev.level, LogLevel::Debug);

        let prod = LoggingConfig::for_environment(None);
        assert_eq!(prod.format, LogFormat::Json);
        assert_eq!(prod.level, LogLevel::Info);

        assert_eq!(LoggingConfig::for_environment(Some("staging")), prod);
    }

    #[test]
    fn test_log_level_parsing() {
        assert_eq!("DEBUG".parse::<LogLevel>().unwrap(), LogLevel::Debug);
        assert_eq!("warning".parse::<LogLevel>().unwrap(), LogLevel::Warn);
        assert!("loud".parse::<LogLevel>().is_err());
    }

    #[test]
    fn test_explicit_filter_wins() {
        let config = LoggingConfig::default().with_filter("core_auth=trace");
        assert_eq!(config.directives(), "core_auth=trace");
    }

    #[test]
    fn test_default_directives_cover_workspace_and_quiet_dependencies() {
        if std::env::var(EnvFilter::DEFAULT_ENV).is_ok() {
            return;
        }
        let directives = LoggingConfig::default()
            .with_level(LogLevel::Debug)
            .directives();

        assert!(directives.contains("core_sync=debug"));
        assert!(directives.contains("provider_spotify=debug"));
        assert!(directives.contains("sqlx=warn"));
        assert!(EnvFilter::try_new(&directives).is_ok());
    }
}
