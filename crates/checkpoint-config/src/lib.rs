//! Shared configuration for checkpoint clients.
//!
//! TOML file + `CHECKPOINT_*` environment loading, default locations for
//! the signature file, and translation into a `checkpoint_core::Checker`
//! and `CheckParams`.
//!
//! `CHECKPOINT_DISABLE` and `CHECKPOINT_TIMEOUT` are deliberately not part
//! of the loaded config: they are kill switches read on every check by
//! `checkpoint_core` itself.

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;
use url::Url;

use checkpoint_core::{CheckParams, Checker, CoreError, TransportConfig};

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error(transparent)]
    Core(#[from] CoreError),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── Config struct ───────────────────────────────────────────────────

/// Environment keys (after the `CHECKPOINT_` prefix) that may override
/// file values.
const ENV_KEYS: &[&str] = &["endpoint", "interval", "signature_file", "cache_file"];

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    /// Check endpoint base URL. Unset means the production endpoint.
    pub endpoint: Option<String>,

    /// Request timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Base interval between scheduled checks, in seconds.
    #[serde(default = "default_interval")]
    pub interval: u64,

    /// Signature file. Unset means [`default_signature_path`].
    pub signature_file: Option<PathBuf>,

    /// Response cache file. Unset disables caching.
    pub cache_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint: None,
            timeout_ms: default_timeout_ms(),
            interval: default_interval(),
            signature_file: None,
            cache_file: None,
        }
    }
}

fn default_timeout_ms() -> u64 {
    5_000
}
fn default_interval() -> u64 {
    24 * 60 * 60
}

impl Config {
    /// Reject values that would produce a useless checker.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.timeout_ms == 0 {
            return Err(ConfigError::Validation {
                field: "timeout_ms".into(),
                reason: "must be greater than zero".into(),
            });
        }
        if self.interval == 0 {
            return Err(ConfigError::Validation {
                field: "interval".into(),
                reason: "must be greater than zero".into(),
            });
        }
        self.endpoint_url().map(|_| ())
    }

    fn endpoint_url(&self) -> Result<Option<Url>, ConfigError> {
        let Some(raw) = self.endpoint.as_deref() else {
            return Ok(None);
        };
        let url = Url::parse(raw).map_err(|e| ConfigError::Validation {
            field: "endpoint".into(),
            reason: format!("{raw}: {e}"),
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::Validation {
                field: "endpoint".into(),
                reason: format!("unsupported scheme '{}'", url.scheme()),
            });
        }
        Ok(Some(url))
    }

    pub fn transport(&self) -> TransportConfig {
        TransportConfig::default().with_timeout(Duration::from_millis(self.timeout_ms))
    }

    /// Base interval for `checkpoint_core::Scheduler::start`.
    pub fn check_interval(&self) -> Duration {
        Duration::from_secs(self.interval)
    }

    /// Build a `Checker` for the configured endpoint.
    pub fn checker(&self) -> Result<Checker, ConfigError> {
        self.validate()?;
        let transport = self.transport();
        let checker = match self.endpoint_url()? {
            Some(url) => Checker::with_base_url(url, &transport)?,
            None => Checker::new(&transport)?,
        };
        debug!(endpoint = %checker.base_url(), "built checker from config");
        Ok(checker)
    }

    /// `CheckParams` for `product`/`version` using the configured files.
    pub fn check_params(&self, product: &str, version: &str) -> CheckParams {
        let mut params = CheckParams::new(product, version).with_signature_file(
            self.signature_file
                .clone()
                .unwrap_or_else(default_signature_path),
        );
        params.cache_file.clone_from(&self.cache_file);
        params
    }
}

// ── Paths ───────────────────────────────────────────────────────────

/// Platform config directory, e.g. `~/.config/checkpoint` on Linux.
///
/// Falls back to `$HOME/.checkpoint` (or `%USERPROFILE%` on Windows) when
/// the platform directories cannot be determined.
pub fn config_dir() -> PathBuf {
    ProjectDirs::from("io", "checkpoint", "checkpoint").map_or_else(
        || home_dir().join(".checkpoint"),
        |dirs| dirs.config_dir().to_path_buf(),
    )
}

/// `config.toml` inside [`config_dir`].
pub fn config_path() -> PathBuf {
    config_dir().join("config.toml")
}

/// Where the anonymous signature lives unless configured otherwise.
pub fn default_signature_path() -> PathBuf {
    config_dir().join("checkpoint.sig")
}

fn home_dir() -> PathBuf {
    std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .map_or_else(|| PathBuf::from("."), PathBuf::from)
}

// ── Loading ─────────────────────────────────────────────────────────

/// Load config from [`config_path`] and the environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load config from a specific file and the environment.
///
/// A missing file is not an error; defaults apply.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let config: Config = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("CHECKPOINT_").only(ENV_KEYS))
        .extract()?;
    config.validate()?;
    Ok(config)
}

/// Load config, returning defaults if it is missing or invalid.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}
