//! Subscriber setup for the `tracing` events the engine emits.
//!
//! The engine and the extensions in this crate only emit events. A host
//! installs a subscriber once at startup, either its own or the one built by
//! [`LoggingConfig::init`].
//!
//! # Example
//!
//! ```
//! use periscope_extensions::{LogFormat, LoggingConfig};
//! use tracing::Level;
//!
//! // Development: pretty output with span enter/exit
//! LoggingConfig::new()
//!     .with_level(Level::DEBUG)
//!     .with_format(LogFormat::Pretty)
//!     .with_span_events(true)
//!     .init();
//!
//! // Production: JSON for log aggregation, quieter engine internals
//! let prod = LoggingConfig::new()
//!     .with_format(LogFormat::Json)
//!     .with_env_filter("periscope_engine=warn,info");
//! # let _ = prod;
//! ```

use tracing::Level;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Output format of the installed subscriber.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable multi-line output.
    #[default]
    Pretty,
    /// Single-line output.
    Compact,
    /// JSON objects, one per line.
    Json,
}

/// Builder for the global `tracing` subscriber.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    level: Level,
    format: LogFormat,
    env_filter: Option<String>,
    span_events: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            format: LogFormat::Pretty,
            env_filter: None,
            span_events: false,
        }
    }
}

impl LoggingConfig {
    /// Creates a config at `INFO` with pretty output.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the maximum level used when no filter string is given.
    #[must_use]
    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// Sets the output format.
    #[must_use]
    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    /// Sets a target filter such as `periscope_engine=debug,info`.
    ///
    /// An unparsable filter falls back to the configured level.
    #[must_use]
    pub fn with_env_filter(mut self, filter: impl Into<String>) -> Self {
        self.env_filter = Some(filter.into());
        self
    }

    /// Emits span enter and exit events.
    #[must_use]
    pub fn with_span_events(mut self, enabled: bool) -> Self {
        self.span_events = enabled;
        self
    }

    /// Returns the configured level.
    #[must_use]
    pub fn level(&self) -> Level {
        self.level
    }

    /// Returns the configured format.
    #[must_use]
    pub fn format(&self) -> LogFormat {
        self.format
    }

    /// Builds the filter directive set.
    #[must_use]
    pub fn filter(&self) -> EnvFilter {
        match &self.env_filter {
            Some(filter) => {
                EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new(self.level.as_str()))
            }
            None => EnvFilter::new(self.level.as_str()),
        }
    }

    /// Installs the subscriber as the global default.
    ///
    /// Does nothing if a global subscriber is already installed.
    pub fn init(&self) {
        let span_events = if self.span_events {
            FmtSpan::ENTER | FmtSpan::EXIT
        } else {
            FmtSpan::NONE
        };
        let registry = tracing_subscriber::registry().with(self.filter());

        let installed = match self.format {
            LogFormat::Pretty => registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .pretty()
                        .with_span_events(span_events),
                )
                .try_init(),
            LogFormat::Compact => registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .compact()
                        .with_span_events(span_events),
                )
                .try_init(),
            LogFormat::Json => registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_span_events(span_events),
                )
                .try_init(),
        };

        if installed.is_ok() {
            tracing::debug!(
                level = %self.level,
                format = ?self.format,
                "logging initialized"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_subscriber::filter::LevelFilter;

    #[test]
    fn defaults() {
        let config = LoggingConfig::new();
        assert_eq!(config.level(), Level::INFO);
        assert_eq!(config.format(), LogFormat::Pretty);
        assert_eq!(config.filter().max_level_hint(), Some(LevelFilter::INFO));
    }

    #[test]
    fn builder_methods() {
        let config = LoggingConfig::new()
            .with_level(Level::TRACE)
            .with_format(LogFormat::Json)
            .with_span_events(true);
        assert_eq!(config.level(), Level::TRACE);
        assert_eq!(config.format(), LogFormat::Json);
        assert!(config.span_events);
    }

    #[test]
    fn env_filter_overrides_level() {
        let config = LoggingConfig::new()
            .with_level(Level::WARN)
            .with_env_filter("periscope_engine=debug");
        assert_eq!(config.filter().max_level_hint(), Some(LevelFilter::DEBUG));
    }

    #[test]
    fn invalid_env_filter_falls_back_to_level() {
        let config = LoggingConfig::new()
            .with_level(Level::WARN)
            .with_env_filter("periscope_engine=loud");
        assert_eq!(config.filter().max_level_hint(), Some(LevelFilter::WARN));
    }

    #[test]
    fn init_twice_is_harmless() {
        LoggingConfig::new().with_format(LogFormat::Compact).init();
        LoggingConfig::new().with_format(LogFormat::Json).init();
    }
}
