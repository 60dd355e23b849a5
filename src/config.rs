//! Configuration file parser for ~/.config/codehn/config.toml.
//!
//! The config file is optional. A missing file yields `Config::default()`.
//! Unknown keys are accepted by serde but logged as a warning, since they
//! are usually typos.
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use crate::feed::{AggregateOptions, DEFAULT_ALLOWED_HOSTS, DEFAULT_BASE_URL};
use crate::storage::{DEFAULT_SWEEP_INTERVAL, DEFAULT_TTL};

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid TOML in config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Config file too large: {0}")]
    TooLarge(String),

    /// A value parsed but cannot be used.
    #[error("Invalid config value: {0}")]
    Invalid(String),
}

// ============================================================================
// Configuration Structs
// ============================================================================

/// Engine configuration.
///
/// All fields use `#[serde(default)]` so any subset of keys can be specified.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// API root, without a trailing slash.
    pub base_url: String,

    /// Maximum number of stories on one page.
    pub target_count: usize,

    /// Maximum item fetches in flight per page build.
    pub concurrency: usize,

    /// Pause between admitting two item fetches, in milliseconds.
    pub admission_delay_ms: u64,

    /// Lifetime of a cached page, in minutes.
    pub cache_ttl_minutes: u64,

    /// Period of the expired-page sweep, in minutes.
    pub sweep_interval_minutes: u64,

    /// Per-request timeout, in seconds.
    pub request_timeout_secs: u64,

    /// Substrings a story link must contain.
    pub allowed_hosts: Vec<String>,

    /// Order pages by upstream rank rather than fetch completion.
    pub rank_order: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            target_count: 30,
            concurrency: 10,
            admission_delay_ms: 10,
            cache_ttl_minutes: DEFAULT_TTL.as_secs() / 60,
            sweep_interval_minutes: DEFAULT_SWEEP_INTERVAL.as_secs() / 60,
            request_timeout_secs: 10,
            allowed_hosts: DEFAULT_ALLOWED_HOSTS.iter().map(|h| h.to_string()).collect(),
            rank_order: true,
        }
    }
}

impl Config {
    /// Maximum config file size (1 MB).
    const MAX_FILE_SIZE: u64 = 1_048_576;

    /// Upper bound for the TTL and sweep interval (one week).
    pub const MAX_WINDOW_MINUTES: u64 = 7 * 24 * 60;

    /// Upper bound for the per-request timeout (ten minutes).
    pub const MAX_REQUEST_TIMEOUT_SECS: u64 = 600;

    const KNOWN_KEYS: [&'static str; 9] = [
        "base_url",
        "target_count",
        "concurrency",
        "admission_delay_ms",
        "cache_ttl_minutes",
        "sweep_interval_minutes",
        "request_timeout_secs",
        "allowed_hosts",
        "rank_order",
    ];

    /// Load configuration from a TOML file.
    ///
    /// - Missing file → `Ok(Config::default())`
    /// - Empty file → `Ok(Config::default())`
    /// - Invalid TOML → `Err(ConfigError::Parse)` with line number info
    /// - Unusable values → `Err(ConfigError::Invalid)`
    /// - Unknown keys → accepted, logged as warning
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::metadata(path) {
            Ok(meta) if meta.len() > Self::MAX_FILE_SIZE => {
                return Err(ConfigError::TooLarge(format!(
                    "Config file is {} bytes (max {} bytes)",
                    meta.len(),
                    Self::MAX_FILE_SIZE
                )));
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No config file found, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
            Ok(_) => {}
        }

        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                // File deleted between metadata and read
                tracing::debug!(path = %path.display(), "Config file disappeared, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
        };

        Self::from_toml(&content).inspect(|config| {
            tracing::info!(
                path = %path.display(),
                base_url = %config.base_url,
                target = config.target_count,
                "Loaded configuration"
            );
        })
    }

    /// Parse and validate configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        if let Ok(raw) = content.parse::<toml::Table>() {
            for key in raw.keys() {
                if !Self::KNOWN_KEYS.contains(&key.as_str()) {
                    tracing::warn!(key = %key, "Unknown key in config file, ignoring");
                }
            }
        }

        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = url::Url::parse(&self.base_url)
            .map_err(|e| ConfigError::Invalid(format!("base_url '{}': {}", self.base_url, e)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::Invalid(format!(
                "base_url must be http or https, got '{}'",
                url.scheme()
            )));
        }
        if self.concurrency == 0 {
            return Err(ConfigError::Invalid("concurrency must be at least 1".into()));
        }
        for (key, minutes) in [
            ("cache_ttl_minutes", self.cache_ttl_minutes),
            ("sweep_interval_minutes", self.sweep_interval_minutes),
        ] {
            if minutes == 0 {
                return Err(ConfigError::Invalid(format!("{key} must be at least 1")));
            }
            if minutes > Self::MAX_WINDOW_MINUTES {
                return Err(ConfigError::Invalid(format!(
                    "{key} must be at most {} (one week), got {minutes}",
                    Self::MAX_WINDOW_MINUTES
                )));
            }
        }
        if !(1..=Self::MAX_REQUEST_TIMEOUT_SECS).contains(&self.request_timeout_secs) {
            return Err(ConfigError::Invalid(format!(
                "request_timeout_secs must be between 1 and {}, got {}",
                Self::MAX_REQUEST_TIMEOUT_SECS,
                self.request_timeout_secs
            )));
        }
        Ok(())
    }

    pub fn aggregate_options(&self) -> AggregateOptions {
        AggregateOptions {
            target_count: self.target_count,
            concurrency: self.concurrency,
            admission_delay: Duration::from_millis(self.admission_delay_ms),
            rank_order: self.rank_order,
        }
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_minutes.saturating_mul(60))
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_minutes.saturating_mul(60))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

// ============================================================================
// Tests
// ============================================================================
