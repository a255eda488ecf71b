//! Default locations for configuration and state.

use std::path::PathBuf;

use thiserror::Error;

use crate::consts::APP_NAME;

#[derive(Debug, Error)]
#[error("cannot determine {kind} directory: {var} is not set")]
pub struct PathError {
  pub kind: &'static str,
  pub var: &'static str,
}

fn env_dir(var: &'static str, kind: &'static str) -> Result<PathBuf, PathError> {
  std::env::var_os(var)
    .filter(|value| !value.is_empty())
    .map(PathBuf::from)
    .ok_or(PathError { kind, var })
}

#[cfg(windows)]
pub fn home_dir() -> Result<PathBuf, PathError> {
  env_dir("USERPROFILE", "home")
}

#[cfg(not(windows))]
pub fn home_dir() -> Result<PathBuf, PathError> {
  env_dir("HOME", "home")
}

#[cfg(windows)]
pub fn config_dir() -> Result<PathBuf, PathError> {
  Ok(env_dir("APPDATA", "config")?.join(APP_NAME))
}

/// `$XDG_CONFIG_HOME/catbundle`, falling back to `~/.config/catbundle`.
#[cfg(not(windows))]
pub fn config_dir() -> Result<PathBuf, PathError> {
  let config_home = match env_dir("XDG_CONFIG_HOME", "config") {
    Ok(dir) => dir,
    Err(_) => home_dir()?.join(".config"),
  };
  Ok(config_home.join(APP_NAME))
}

#[cfg(windows)]
pub fn data_dir() -> Result<PathBuf, PathError> {
  Ok(env_dir("LOCALAPPDATA", "data")?.join(APP_NAME))
}

/// `$XDG_DATA_HOME/catbundle`, falling back to `~/.local/share/catbundle`.
#[cfg(not(windows))]
pub fn data_dir() -> Result<PathBuf, PathError> {
  let data_home = match env_dir("XDG_DATA_HOME", "data") {
    Ok(dir) => dir,
    Err(_) => home_dir()?.join(".local").join("share"),
  };
  Ok(data_home.join(APP_NAME))
}

pub fn config_file() -> Result<PathBuf, PathError> {
  Ok(config_dir()?.join("config.toml"))
}

pub fn default_catalog_dir() -> Result<PathBuf, PathError> {
  Ok(data_dir()?.join("catalog"))
}

pub fn default_queue_dir() -> Result<PathBuf, PathError> {
  Ok(data_dir()?.join("queue"))
}
