//! Atomic writes: write to a uniquely named sibling temp file, then rename over
//! the target.

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use serde::Serialize;
use tempfile::NamedTempFile;

/// Atomically replace `path` with `bytes`.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
  let parent = match path.parent() {
    Some(parent) if !parent.as_os_str().is_empty() => parent,
    _ => Path::new("."),
  };
  fs::create_dir_all(parent)?;

  let mut temp = NamedTempFile::new_in(parent)?;
  temp.write_all(bytes)?;
  temp.persist(path).map_err(|e| e.error)?;
  Ok(())
}

/// Atomically replace `path` with the pretty JSON form of `value`.
pub fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> io::Result<()> {
  let content = serde_json::to_vec_pretty(value).map_err(io::Error::other)?;
  write_atomic(path, &content)
}
