use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One queued rebuild of one dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
  pub id: String,
  pub queue: String,
  pub title: String,
  /// Target dataset. Jobs written by producers that only set a title lack it.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub dataset_id: Option<String>,
  /// What triggered the job ("created", "changed", "datastore_create", ...).
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub operation: Option<String>,
  pub enqueued_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobRequest {
  pub queue: String,
  pub title: String,
  pub dataset_id: String,
  pub operation: String,
}

/// Lifecycle of a rebuild job: `Queued -> Running -> {Skipped, Published, Failed}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
  Queued,
  Running,
  /// No significant change since the last publish.
  Skipped,
  Published,
  Failed,
}

impl JobState {
  pub fn is_terminal(self) -> bool {
    matches!(self, JobState::Skipped | JobState::Published | JobState::Failed)
  }

  pub fn as_str(self) -> &'static str {
    match self {
      JobState::Queued => "queued",
      JobState::Running => "running",
      JobState::Skipped => "skipped",
      JobState::Published => "published",
      JobState::Failed => "failed",
    }
  }
}

impl fmt::Display for JobState {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.pad(self.as_str())
  }
}
