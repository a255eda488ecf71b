//! Worker pool draining the rebuild queue.
//!
//! Jobs are claimed one at a time and only once a slot is free, so a job never
//! sits claimed but idle. Each rebuild runs on the blocking pool; its outcome
//! (or failure, or panic) is reported back to the queue as a terminal state.

use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use crate::dedup::job_dataset_id;
use crate::queue::{Job, JobSource, JobState, QueueError};
use crate::rebuild::{RebuildOptions, RebuildOutcome, Rebuilder};

#[derive(Debug, Error)]
pub enum WorkerError {
  #[error("failed to claim job: {0}")]
  Claim(#[from] QueueError),

  #[error("queue task failed: {0}")]
  Join(#[from] tokio::task::JoinError),

  #[error("worker pool closed")]
  Closed,
}

#[derive(Debug, Clone)]
pub struct WorkerConfig {
  pub queue: String,
  /// Maximum concurrent rebuilds.
  pub parallelism: usize,
  pub options: RebuildOptions,
}

/// Result of one job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobReport {
  pub job_id: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub dataset_id: Option<String>,
  pub state: JobState,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub error: Option<String>,
  #[serde(skip_serializing_if = "Vec::is_empty")]
  pub failed_entries: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct WorkerReport {
  pub jobs: Vec<JobReport>,
}

impl WorkerReport {
  pub fn count(&self, state: JobState) -> usize {
    self.jobs.iter().filter(|j| j.state == state).count()
  }
}

/// Run every pending job on `config.queue` and return once the queue is empty.
///
/// Job failures are reported, not returned; only failing to claim from the
/// queue stops the pool. Jobs already running are still awaited then.
pub async fn run_pending(
  source: Arc<dyn JobSource>,
  rebuilder: Arc<Rebuilder>,
  config: &WorkerConfig,
) -> Result<WorkerReport, WorkerError> {
  let semaphore = Arc::new(Semaphore::new(config.parallelism.max(1)));
  let mut join_set = JoinSet::new();
  let mut claim_error = None;

  info!(queue = %config.queue, parallelism = config.parallelism, "draining rebuild queue");

  loop {
    let permit = semaphore.clone().acquire_owned().await.map_err(|_| WorkerError::Closed)?;

    let claimed = {
      let source = source.clone();
      let queue = config.queue.clone();
      tokio::task::spawn_blocking(move || source.claim_next(&queue)).await?
    };

    let job = match claimed {
      Ok(Some(job)) => job,
      Ok(None) => break,
      Err(e) => {
        error!(queue = %config.queue, error = %e, "failed to claim job");
        claim_error = Some(e);
        break;
      }
    };

    debug!(job = %job.id, title = %job.title, "claimed job");
    let source = source.clone();
    let rebuilder = rebuilder.clone();
    let options = config.options;

    join_set.spawn(async move {
      let _permit = permit;
      let report = execute_job(&job, rebuilder, options).await;

      let finished = {
        let job = job.clone();
        let state = report.state;
        tokio::task::spawn_blocking(move || source.finish(&job, state)).await
      };
      match finished {
        Ok(Ok(())) => {}
        Ok(Err(e)) => warn!(job = %job.id, error = %e, "failed to record job state"),
        Err(e) => warn!(job = %job.id, error = %e, "job state task failed"),
      }

      report
    });
  }

  let mut report = WorkerReport::default();
  while let Some(joined) = join_set.join_next().await {
    match joined {
      Ok(job_report) => report.jobs.push(job_report),
      Err(e) => error!(error = %e, "job task panicked"),
    }
  }

  info!(
    queue = %config.queue,
    published = report.count(JobState::Published),
    skipped = report.count(JobState::Skipped),
    failed = report.count(JobState::Failed),
    "queue drained"
  );

  match claim_error {
    Some(e) => Err(WorkerError::Claim(e)),
    None => Ok(report),
  }
}

async fn execute_job(job: &Job, rebuilder: Arc<Rebuilder>, options: RebuildOptions) -> JobReport {
  let Some(dataset_id) = job_dataset_id(job).map(str::to_string) else {
    warn!(job = %job.id, title = %job.title, "job names no dataset");
    return JobReport {
      job_id: job.id.clone(),
      dataset_id: None,
      state: JobState::Failed,
      error: Some("job names no dataset".to_string()),
      failed_entries: Vec::new(),
    };
  };

  let result = {
    let dataset_id = dataset_id.clone();
    tokio::task::spawn_blocking(move || rebuilder.rebuild(&dataset_id, options)).await
  };

  let (state, error, failed_entries) = match result {
    Ok(Ok(outcome)) => {
      let state = outcome.state();
      let failed_entries = match outcome {
        RebuildOutcome::Published { failed_entries, .. } => failed_entries,
        RebuildOutcome::Skipped { .. } => Vec::new(),
      };
      info!(job = %job.id, dataset = %dataset_id, %state, "job finished");
      (state, None, failed_entries)
    }
    Ok(Err(e)) => {
      error!(job = %job.id, dataset = %dataset_id, error = %e, "rebuild failed");
      (JobState::Failed, Some(e.to_string()), Vec::new())
    }
    Err(e) => {
      error!(job = %job.id, dataset = %dataset_id, error = %e, "rebuild panicked");
      (JobState::Failed, Some(e.to_string()), Vec::new())
    }
  };

  JobReport {
    job_id: job.id.clone(),
    dataset_id: Some(dataset_id),
    state,
    error,
    failed_entries,
  }
}
