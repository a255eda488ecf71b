//! Runtime configuration.
//!
//! Loaded from `config.toml` in the config directory (or an explicit path),
//! then overridden by `CATBUNDLE_*` environment variables. Every field is
//! optional in the file:
//!
//! ```toml
//! catalog_dir = "/srv/catalog"
//! queue_dir = "/srv/queue"
//! queue_name = "default"
//! parallelism = 4
//! fetch_timeout = "30s"
//! user_agent = "catbundle/0.3"
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::consts::{APP_NAME, DEFAULT_PARALLELISM, DEFAULT_QUEUE};
use crate::paths::{self, PathError};

pub const ENV_CATALOG_DIR: &str = "CATBUNDLE_CATALOG_DIR";
pub const ENV_QUEUE_DIR: &str = "CATBUNDLE_QUEUE_DIR";
pub const ENV_QUEUE: &str = "CATBUNDLE_QUEUE";
pub const ENV_PARALLELISM: &str = "CATBUNDLE_PARALLELISM";

#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("failed to read config {path}: {source}")]
  Read {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("invalid config {path}: {source}")]
  Parse {
    path: PathBuf,
    #[source]
    source: toml::de::Error,
  },

  #[error("invalid value {value:?} for {var}")]
  Env { var: &'static str, value: String },

  #[error("{0}")]
  Invalid(String),

  #[error(transparent)]
  Paths(#[from] PathError),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
  /// Root of the on-disk catalog. Defaults to `<data dir>/catalog`.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub catalog_dir: Option<PathBuf>,
  /// Root of the on-disk job queue. Defaults to `<data dir>/queue`.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub queue_dir: Option<PathBuf>,
  pub queue_name: String,
  pub parallelism: usize,
  #[serde(with = "humantime_str")]
  pub fetch_timeout: Duration,
  pub user_agent: String,
}

impl Default for Config {
  fn default() -> Self {
    Self {
      catalog_dir: None,
      queue_dir: None,
      queue_name: DEFAULT_QUEUE.to_string(),
      parallelism: DEFAULT_PARALLELISM,
      fetch_timeout: Duration::from_secs(30),
      user_agent: format!("{}/{}", APP_NAME, env!("CARGO_PKG_VERSION")),
    }
  }
}

impl Config {
  /// Load `path`, or the default config file when `path` is `None`.
  ///
  /// An explicit path must exist; a missing default file means defaults.
  /// Environment overrides are applied last.
  pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
    let mut config = match path {
      Some(path) => Self::from_file(path)?,
      None => {
        let path = paths::config_file()?;
        if path.exists() {
          Self::from_file(&path)?
        } else {
          debug!(path = %path.display(), "no config file, using defaults");
          Self::default()
        }
      }
    };

    config.apply_env()?;
    config.validate()?;
    Ok(config)
  }

  pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
    let content = fs::read_to_string(path).map_err(|e| ConfigError::Read {
      path: path.to_path_buf(),
      source: e,
    })?;
    let config = toml::from_str(&content).map_err(|e| ConfigError::Parse {
      path: path.to_path_buf(),
      source: e,
    })?;
    debug!(path = %path.display(), "loaded config");
    Ok(config)
  }

  fn apply_env(&mut self) -> Result<(), ConfigError> {
    if let Some(dir) = env_value(ENV_CATALOG_DIR) {
      self.catalog_dir = Some(PathBuf::from(dir));
    }
    if let Some(dir) = env_value(ENV_QUEUE_DIR) {
      self.queue_dir = Some(PathBuf::from(dir));
    }
    if let Some(queue) = env_value(ENV_QUEUE) {
      self.queue_name = queue;
    }
    if let Some(value) = env_value(ENV_PARALLELISM) {
      self.parallelism = value.trim().parse().map_err(|_| ConfigError::Env {
        var: ENV_PARALLELISM,
        value,
      })?;
    }
    Ok(())
  }

  fn validate(&self) -> Result<(), ConfigError> {
    if self.parallelism == 0 {
      return Err(ConfigError::Invalid("parallelism must be at least 1".to_string()));
    }
    if self.queue_name.trim().is_empty() {
      return Err(ConfigError::Invalid("queue_name must not be empty".to_string()));
    }
    if self.fetch_timeout.is_zero() {
      return Err(ConfigError::Invalid("fetch_timeout must be positive".to_string()));
    }
    Ok(())
  }

  pub fn catalog_dir(&self) -> Result<PathBuf, ConfigError> {
    match &self.catalog_dir {
      Some(dir) => Ok(dir.clone()),
      None => Ok(paths::default_catalog_dir()?),
    }
  }

  pub fn queue_dir(&self) -> Result<PathBuf, ConfigError> {
    match &self.queue_dir {
      Some(dir) => Ok(dir.clone()),
      None => Ok(paths::default_queue_dir()?),
    }
  }
}

fn env_value(var: &str) -> Option<String> {
  std::env::var(var).ok().filter(|v| !v.is_empty())
}

/// `Duration` as a humantime string ("30s", "2m").
mod humantime_str {
  use std::time::Duration;

  use serde::{Deserialize, Deserializer, Serializer};

  pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&humantime::format_duration(*duration).to_string())
  }

  pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
    let value = String::deserialize(deserializer)?;
    humantime::parse_duration(&value).map_err(serde::de::Error::custom)
  }
}
