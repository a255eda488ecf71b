//! Shared test helpers for CLI integration tests.

use std::path::PathBuf;

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use tempfile::TempDir;

/// Get path to a fixture file.
pub fn fixture_path(name: &str) -> PathBuf {
  PathBuf::from(env!("CARGO_MANIFEST_DIR"))
    .join("tests")
    .join("fixtures")
    .join(name)
}

/// Isolated test environment.
///
/// Each test gets its own catalog, queue and config directories.
pub struct TestEnv {
  pub temp: TempDir,
}

impl TestEnv {
  pub fn empty() -> Self {
    Self {
      temp: TempDir::new().unwrap(),
    }
  }

  /// A catalog holding the given fixture datasets, with their rebuild jobs
  /// queued.
  pub fn with_datasets(fixtures: &[&str]) -> Self {
    let env = Self::empty();
    for fixture in fixtures {
      env.cmd().arg("import").arg(fixture_path(fixture)).assert().success();
    }
    env
  }

  fn dir(&self, name: &str) -> PathBuf {
    let p = self.temp.path().join(name);
    std::fs::create_dir_all(&p).unwrap();
    dunce::canonicalize(&p).unwrap_or(p)
  }

  pub fn catalog_path(&self) -> PathBuf {
    self.dir("catalog")
  }

  pub fn queue_path(&self) -> PathBuf {
    self.dir("queue")
  }

  /// Write a file relative to the temp directory and return its path.
  pub fn write_file(&self, relative_path: &str, content: &str) -> PathBuf {
    let path = self.temp.path().join(relative_path);
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, content).unwrap();
    path
  }

  /// Get a pre-configured Command for the catbundle binary.
  ///
  /// Sets environment variables for isolated testing:
  /// - `CATBUNDLE_CATALOG_DIR` / `CATBUNDLE_QUEUE_DIR`: isolated stores
  /// - `XDG_CONFIG_HOME` / `XDG_DATA_HOME` / `HOME`: no user config leaks in
  pub fn cmd(&self) -> Command {
    let mut cmd: Command = cargo_bin_cmd!("catbundle");
    cmd.env("CATBUNDLE_CATALOG_DIR", self.catalog_path());
    cmd.env("CATBUNDLE_QUEUE_DIR", self.queue_path());
    cmd.env("XDG_CONFIG_HOME", self.dir("config"));
    cmd.env("XDG_DATA_HOME", self.dir("data"));
    cmd.env("HOME", self.temp.path());
    cmd.env_remove("CATBUNDLE_QUEUE");
    cmd.env_remove("CATBUNDLE_PARALLELISM");
    cmd.env_remove("RUST_LOG");
    cmd
  }

  /// Run a command with `-o json` and parse its stdout.
  pub fn json(&self, args: &[&str]) -> serde_json::Value {
    let output = self.cmd().args(args).args(["-o", "json"]).output().unwrap();
    assert!(
      output.status.success(),
      "command {:?} failed: {}",
      args,
      String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).unwrap()
  }
}
