//! Job queue seam.
//!
//! [`JobQueue`] is what producers need (list pending work, submit work);
//! [`JobSource`] is what workers need (claim work, report the end state).
//! [`FileQueue`] implements both on a directory tree.

mod store;
mod types;

use std::io;

use thiserror::Error;

pub use store::FileQueue;
pub use types::{Job, JobRequest, JobState};

#[derive(Debug, Error)]
pub enum QueueError {
  #[error("failed to read {path}: {source}")]
  Read {
    path: String,
    #[source]
    source: io::Error,
  },

  #[error("failed to write {path}: {source}")]
  Write {
    path: String,
    #[source]
    source: io::Error,
  },

  #[error("failed to parse job {path}: {source}")]
  Parse {
    path: String,
    #[source]
    source: serde_json::Error,
  },

  #[error("job {job} cannot finish as {state}")]
  NotTerminal { job: String, state: JobState },

  #[error("queue unavailable: {0}")]
  Unavailable(String),
}

/// Producer side of a job queue.
pub trait JobQueue: Send + Sync {
  /// Jobs on `queue` that have not started yet.
  fn list_pending(&self, queue: &str) -> Result<Vec<Job>, QueueError>;

  fn enqueue(&self, request: JobRequest) -> Result<Job, QueueError>;
}

/// Worker side of a job queue.
pub trait JobSource: Send + Sync {
  /// Take the oldest pending job on `queue`, if any. A claimed job is no longer
  /// pending and will not be handed to another worker.
  fn claim_next(&self, queue: &str) -> Result<Option<Job>, QueueError>;

  /// Report a terminal state; the queue drops the job. Non-terminal states are
  /// rejected.
  fn finish(&self, job: &Job, state: JobState) -> Result<(), QueueError>;
}
