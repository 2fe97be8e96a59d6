//! Configuration file parser for ~/.config/rssfetch/config.toml.
//!
//! The config file is optional; a missing file yields `Config::default()`.
//! Unknown keys are accepted by serde, but a warning is logged for each one
//! since they are usually typos.
use serde::Deserialize;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use crate::http::{FetchOptions, DEFAULT_MAX_BODY_BYTES, DEFAULT_TIMEOUT};

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
}

// ============================================================================
// Configuration Structs
// ============================================================================

/// Top-level configuration.
///
/// All fields use `#[serde(default)]` so any subset of keys can be specified.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub http: HttpConfig,
}

/// The `[http]` table.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Sent as `User-Agent`. An empty string omits the header.
    pub user_agent: String,

    /// Revalidate with `If-None-Match` using remembered entity tags.
    pub enable_etag: bool,

    /// Advertise and decode gzip/deflate.
    pub enable_compression: bool,

    /// Whole-exchange timeout. 0 falls back to the default.
    pub timeout_secs: u64,

    pub max_body_bytes: usize,

    /// Number of resources whose entity tag is remembered.
    pub etag_cache_capacity: usize,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            enable_etag: true,
            enable_compression: true,
            timeout_secs: DEFAULT_TIMEOUT.as_secs(),
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            etag_cache_capacity: crate::http::EtagCache::DEFAULT_CAPACITY,
        }
    }
}

fn default_user_agent() -> String {
    format!("rssfetch/{}", env!("CARGO_PKG_VERSION"))
}

const KNOWN_TOP_LEVEL_KEYS: &[&str] = &["http"];
const KNOWN_HTTP_KEYS: &[&str] = &[
    "user_agent",
    "enable_etag",
    "enable_compression",
    "timeout_secs",
    "max_body_bytes",
    "etag_cache_capacity",
];

impl Config {
    /// Maximum config file size (1 MB).
    const MAX_FILE_SIZE: u64 = 1_048_576;

    /// Load configuration from a TOML file.
    ///
    /// - Missing file → `Ok(Config::default())`
    /// - Empty file → `Ok(Config::default())`
    /// - Invalid TOML → `Err(ConfigError::Parse)` with line number info
    /// - Unknown keys → accepted, logged as warning
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match read_bounded(path, Self::MAX_FILE_SIZE)? {
            Some(content) => Self::from_toml(&content),
            None => {
                tracing::debug!(path = %path.display(), "No config file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Parses configuration from TOML text. Blank text yields defaults.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        if content.trim().is_empty() {
            tracing::debug!("Config file is empty, using defaults");
            return Ok(Self::default());
        }

        if let Ok(raw) = content.parse::<toml::Table>() {
            warn_unknown_keys(&raw);
        }

        let config: Config = toml::from_str(content)?;
        tracing::info!(
            user_agent = %config.http.user_agent,
            etag = config.http.enable_etag,
            compression = config.http.enable_compression,
            "Loaded configuration"
        );
        Ok(config)
    }

    /// Options for [`ConditionalFetchClient`](crate::http::ConditionalFetchClient).
    pub fn fetch_options(&self) -> FetchOptions {
        let http = &self.http;
        let timeout = match http.timeout_secs {
            0 => DEFAULT_TIMEOUT,
            secs => Duration::from_secs(secs),
        };
        FetchOptions {
            user_agent: http.user_agent.clone(),
            enable_etag: http.enable_etag,
            enable_compression: http.enable_compression,
            timeout,
            max_body_bytes: http.max_body_bytes,
        }
    }
}

/// Reads `path` in one pass, never buffering more than `limit + 1` bytes.
///
/// `Ok(None)` when the file does not exist.
fn read_bounded(path: &Path, limit: u64) -> Result<Option<String>, ConfigError> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(ConfigError::Io(e)),
    };

    let mut bytes = Vec::new();
    file.take(limit + 1).read_to_end(&mut bytes)?;
    if bytes.len() as u64 > limit {
        return Err(ConfigError::TooLarge(format!(
            "{} exceeds {} bytes",
            path.display(),
            limit
        )));
    }

    String::from_utf8(bytes)
        .map(Some)
        .map_err(|e| ConfigError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))
}

fn warn_unknown_keys(raw: &toml::Table) {
    for (key, value) in raw {
        if !KNOWN_TOP_LEVEL_KEYS.contains(&key.as_str()) {
            tracing::warn!(key = %key, "Unknown key in config file, ignoring");
            continue;
        }
        if let Some(table) = value.as_table() {
            for http_key in table.keys() {
                if !KNOWN_HTTP_KEYS.contains(&http_key.as_str()) {
                    tracing::warn!(key = %format!("http.{http_key}"), "Unknown key in config file, ignoring");
                }
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
