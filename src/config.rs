//! Configuration module for the notifier.
//!
//! This module provides a layered configuration system that supports:
//! - Default values
//! - TOML configuration file
//! - Environment variable overrides
//! - CLI argument overrides (applied by the commands)
//!
//! # Environment Variables
//!
//! Environment variables must be prefixed with `PLEX_NOTIFIER_` and use double
//! underscores to separate nested levels:
//! - `PLEX_NOTIFIER_PLEX__TOKEN=abc` sets `plex.token`
//! - `PLEX_NOTIFIER_SCHEDULER__DWELL_SECS=5` sets `scheduler.dwell_secs`
//! - `PLEX_NOTIFIER_LOGGING__DEFAULT=debug` sets `logging.default`

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

const ENV_PREFIX: &str = "PLEX_NOTIFIER_";

/// Errors raised while loading or validating settings.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] Box<figment::Error>),

    #[error("No Plex token configured (set plex.token or PLEX_NOTIFIER_PLEX__TOKEN)")]
    MissingToken,

    #[error("No path maps configured; add at least one [path_maps.\"<Section>\"] entry")]
    NoPathMaps,

    #[error("Path map '{title}' has no paths")]
    EmptyPathMap { title: String },

    #[error("Invalid scheduler setting {field}: {reason}")]
    InvalidScheduler { field: &'static str, reason: String },

    #[error("Configuration file already exists at {0}. Use --force to overwrite")]
    AlreadyExists(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Settings {
    /// Version of the configuration schema
    #[serde(default = "default_version")]
    pub version: u32,

    /// Media server connection
    #[serde(default)]
    pub plex: PlexConfig,

    /// Section title -> watch roots
    #[serde(default)]
    pub path_maps: IndexMap<String, PathMap>,

    /// File extensions that count as library content (case-insensitive)
    #[serde(default = "default_allowed_extensions")]
    pub allowed_extensions: Vec<String>,

    /// Rescan timing
    #[serde(default)]
    pub scheduler: SchedulerConfig,

    /// Log levels
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct PlexConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Value sent as `X-Plex-Token`
    #[serde(default)]
    pub token: String,

    /// Use plain HTTP instead of HTTPS
    #[serde(default = "default_false")]
    pub insecure: bool,

    /// Verify the server certificate. Off by default since most servers
    /// present a certificate for *.plex.direct, not the configured host.
    #[serde(default = "default_false")]
    pub verify_tls: bool,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq, Eq)]
pub struct PathMap {
    #[serde(default)]
    pub paths: Vec<PathBuf>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SchedulerConfig {
    /// Quiet period a section must see before it is rescanned
    #[serde(default = "default_dwell_secs")]
    pub dwell_secs: u64,

    /// Minimum spacing between any two rescans
    #[serde(default = "default_run_secs")]
    pub run_secs: u64,

    /// Pause after each dispatch attempt
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    /// Default level for every module
    #[serde(default = "default_log_level")]
    pub default: String,

    /// Per-module overrides, e.g. `scheduler = "debug"`
    #[serde(default)]
    pub modules: IndexMap<String, String>,
}

// Default value functions
fn default_version() -> u32 { 1 }
fn default_host() -> String { "127.0.0.1".to_string() }
fn default_port() -> u16 { 32400 }
fn default_false() -> bool { false }
fn default_request_timeout_secs() -> u64 { 30 }
fn default_dwell_secs() -> u64 { 10 }
fn default_run_secs() -> u64 { 60 }
fn default_poll_interval_ms() -> u64 { 1000 }
fn default_log_level() -> String { "info".to_string() }

pub fn default_allowed_extensions() -> Vec<String> {
    [
        "jpg", "jpeg", "png", "gif", "bmp", "tiff",
        "mp3", "flac", "aac", "wma", "ogg", "ogv", "wav", "aiff",
        "mpg", "mp4", "avi", "mkv", "m4a", "mov", "wmv", "m2v", "m4v", "vob",
    ]
    .iter()
    .map(|ext| ext.to_string())
    .collect()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: default_version(),
            plex: PlexConfig::default(),
            path_maps: IndexMap::new(),
            allowed_extensions: default_allowed_extensions(),
            scheduler: SchedulerConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for PlexConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            token: String::new(),
            insecure: false,
            verify_tls: false,
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            dwell_secs: default_dwell_secs(),
            run_secs: default_run_secs(),
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            default: default_log_level(),
            modules: IndexMap::new(),
        }
    }
}

impl PlexConfig {
    pub fn scheme(&self) -> &'static str {
        if self.insecure { "http" } else { "https" }
    }

    pub fn base_url(&self) -> String {
        format!("{}://{}:{}", self.scheme(), self.host, self.port)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl SchedulerConfig {
    pub fn dwell_time(&self) -> Duration {
        Duration::from_secs(self.dwell_secs)
    }

    pub fn run_time(&self) -> Duration {
        Duration::from_secs(self.run_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl Settings {
    /// Load configuration from all sources.
    ///
    /// Uses `path` when given, otherwise the per-user default location. A
    /// missing file is not an error; defaults and environment still apply.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config_path = path
            .map(Path::to_path_buf)
            .unwrap_or_else(Self::default_config_path);

        Figment::new()
            .merge(Serialized::defaults(Settings::default()))
            .merge(Toml::file(config_path))
            // Double underscore separates nested levels; single underscores
            // stay inside field names.
            .merge(Env::prefixed(ENV_PREFIX).map(|key| {
                key.as_str()
                    .to_lowercase()
                    .replace("__", ".")
                    .into()
            }))
            .extract()
            .map_err(|e| ConfigError::Load(Box::new(e)))
    }

    /// Per-user settings file, e.g. `~/.config/plex-notifier/settings.toml`.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("plex-notifier")
            .join("settings.toml")
    }

    /// Check everything the watch command needs before it touches the network.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.plex.token.trim().is_empty() {
            return Err(ConfigError::MissingToken);
        }

        if self.path_maps.is_empty() {
            return Err(ConfigError::NoPathMaps);
        }

        for (title, map) in &self.path_maps {
            if map.paths.is_empty() {
                return Err(ConfigError::EmptyPathMap {
                    title: title.clone(),
                });
            }
        }

        if self.scheduler.dwell_secs == 0 {
            return Err(ConfigError::InvalidScheduler {
                field: "dwell_secs",
                reason: "must be greater than zero".to_string(),
            });
        }

        if self.scheduler.poll_interval_ms == 0 {
            return Err(ConfigError::InvalidScheduler {
                field: "poll_interval_ms",
                reason: "must be greater than zero".to_string(),
            });
        }

        if self.scheduler.dwell_secs >= self.scheduler.run_secs {
            tracing::warn!(
                "[config] dwell_secs ({}) is not below run_secs ({}); rescans may start back to back",
                self.scheduler.dwell_secs,
                self.scheduler.run_secs
            );
        }

        Ok(())
    }

    /// Copy with the token masked, for display.
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        if !copy.plex.token.is_empty() {
            copy.plex.token = "********".to_string();
        }
        copy
    }

    /// Write a commented starter file.
    pub fn init_config_file(path: &Path, force: bool) -> Result<PathBuf, ConfigError> {
        if !force && path.exists() {
            return Err(ConfigError::AlreadyExists(path.to_path_buf()));
        }

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        std::fs::write(path, DEFAULT_SETTINGS)?;
        Ok(path.to_path_buf())
    }
}

const DEFAULT_SETTINGS: &str = r#"# plex-notifier settings
#
# Every value can be overridden with an environment variable, e.g.
#   PLEX_NOTIFIER_PLEX__TOKEN=xxxx
#   PLEX_NOTIFIER_SCHEDULER__DWELL_SECS=5

version = 1

[plex]
host = "127.0.0.1"
port = 32400
# X-Plex-Token of an account allowed to refresh libraries
token = ""
# Use http:// instead of https://
insecure = false
# Most servers present a *.plex.direct certificate
verify_tls = false
request_timeout_secs = 30

[scheduler]
# A section must be quiet this long before it is rescanned
dwell_secs = 10
# Minimum spacing between any two rescans
run_secs = 60
poll_interval_ms = 1000

[logging]
default = "info"

# Map each Plex section title to the directories that hold its files.
#
# [path_maps."Movies"]
# paths = ["/volume1/video/movies"]
#
# [path_maps."TV Shows"]
# paths = ["/volume1/video/tv", "/volume2/tv"]
"#;
