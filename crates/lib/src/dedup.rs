//! Keeping at most one pending rebuild per dataset.
//!
//! Before submitting, the deduplicator looks for a pending job on the rebuild
//! queue that targets the same dataset. Jobs carry the dataset id as a
//! structured field; jobs that only have a title are matched through the title
//! grammar `Bundle <label> "<name>" <id>`. Matching is on the exact id, so a
//! pending `abc-1` never shadows `abc-12`.
//!
//! This is best-effort. Two producers can both see an empty queue and both
//! submit; rebuilds are idempotent, so the duplicate only costs work.

use std::sync::{Arc, LazyLock};

use regex_lite::Regex;
use tracing::{debug, info, warn};

use crate::consts::JOB_TITLE_PREFIX;
use crate::queue::{Job, JobQueue, JobRequest, QueueError};

static TITLE_PATTERN: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r#"^Bundle \w+ "[^"]*" ([\w-]+)"#).expect("valid title pattern"));

#[derive(Debug, Clone, PartialEq)]
pub enum EnqueueOutcome {
  Queued(Job),
  /// A pending job already targets the dataset.
  AlreadyQueued { job_id: String },
}

pub struct JobDeduplicator {
  queue: Arc<dyn JobQueue>,
  queue_name: String,
}

impl JobDeduplicator {
  pub fn new(queue: Arc<dyn JobQueue>, queue_name: impl Into<String>) -> Self {
    Self {
      queue,
      queue_name: queue_name.into(),
    }
  }

  pub fn queue_name(&self) -> &str {
    &self.queue_name
  }

  /// Submit a rebuild of `dataset_id` unless one is already pending. `name`
  /// only appears in the job title.
  ///
  /// If the pending jobs cannot be listed the job is submitted anyway.
  pub fn enqueue_if_absent(&self, dataset_id: &str, name: &str, label: &str) -> Result<EnqueueOutcome, QueueError> {
    match self.find_pending(dataset_id) {
      Ok(Some(existing)) => {
        debug!(dataset = %dataset_id, job = %existing.id, "rebuild already pending");
        return Ok(EnqueueOutcome::AlreadyQueued { job_id: existing.id });
      }
      Ok(None) => {}
      Err(e) => {
        warn!(
          dataset = %dataset_id,
          queue = %self.queue_name,
          error = %e,
          "could not list pending jobs, enqueueing anyway"
        );
      }
    }

    let job = self.queue.enqueue(JobRequest {
      queue: self.queue_name.clone(),
      title: job_title(label, name, dataset_id),
      dataset_id: dataset_id.to_string(),
      operation: label.to_string(),
    })?;

    info!(dataset = %dataset_id, job = %job.id, label, "enqueued rebuild");
    Ok(EnqueueOutcome::Queued(job))
  }

  /// The pending job targeting `dataset_id`, if any.
  pub fn find_pending(&self, dataset_id: &str) -> Result<Option<Job>, QueueError> {
    let pending = self.queue.list_pending(&self.queue_name)?;
    Ok(pending.into_iter().find(|job| job_dataset_id(job) == Some(dataset_id)))
  }
}

/// `Bundle <label> "<name>" <id>`. Double quotes in `name` become single quotes
/// so the title always parses back to `id`.
pub fn job_title(label: &str, dataset_name: &str, dataset_id: &str) -> String {
  format!(
    "{} {} \"{}\" {}",
    JOB_TITLE_PREFIX,
    label,
    dataset_name.replace('"', "'"),
    dataset_id
  )
}

/// Dataset id encoded in a job title.
pub fn title_dataset_id(title: &str) -> Option<&str> {
  TITLE_PATTERN
    .captures(title)
    .and_then(|caps| caps.get(1))
    .map(|m| m.as_str())
}

/// The dataset a job targets: the structured field, else the title.
pub fn job_dataset_id(job: &Job) -> Option<&str> {
  match &job.dataset_id {
    Some(id) => Some(id.as_str()),
    None => title_dataset_id(&job.title),
  }
}
