//! Directory-backed job queue.
//!
//! # Storage Layout
//!
//! ```text
//! {root}/<queue>/
//! ├── pending/<job id>.json   # Submitted, not started
//! └── running/<job id>.json   # Claimed by a worker
//! ```
//!
//! Job ids are UUIDv7, so file names sort in submission order. A worker claims a
//! job by renaming it from `pending/` to `running/`; the rename succeeds for
//! exactly one worker. Finished jobs are deleted.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::Utc;
use tracing::{debug, info};
use uuid::Uuid;

use super::types::{Job, JobRequest, JobState};
use super::{JobQueue, JobSource, QueueError};
use crate::util::fs::write_json_atomic;

const PENDING_DIR: &str = "pending";
const RUNNING_DIR: &str = "running";

#[derive(Debug, Clone)]
pub struct FileQueue {
  root: PathBuf,
}

impl FileQueue {
  pub fn new(root: PathBuf) -> Self {
    Self { root }
  }

  pub fn root(&self) -> &Path {
    &self.root
  }

  /// Jobs currently claimed by workers.
  pub fn list_running(&self, queue: &str) -> Result<Vec<Job>, QueueError> {
    load_jobs(&self.queue_dir(queue).join(RUNNING_DIR))
  }

  /// Move jobs left in `running/` by a crashed worker back to `pending/`.
  ///
  /// Only safe while no worker is draining `queue`. Returns the number of
  /// jobs moved.
  pub fn recover_running(&self, queue: &str) -> Result<usize, QueueError> {
    let running = self.queue_dir(queue).join(RUNNING_DIR);
    let pending = self.queue_dir(queue).join(PENDING_DIR);
    fs::create_dir_all(&pending).map_err(|e| write_error(&pending, e))?;

    let mut recovered = 0;
    for path in job_files(&running)? {
      let Some(name) = path.file_name() else { continue };
      let target = pending.join(name);
      fs::rename(&path, &target).map_err(|e| write_error(&target, e))?;
      recovered += 1;
    }

    if recovered > 0 {
      info!(queue, recovered, "requeued interrupted jobs");
    }
    Ok(recovered)
  }

  fn queue_dir(&self, queue: &str) -> PathBuf {
    self.root.join(queue)
  }
}

impl JobQueue for FileQueue {
  fn list_pending(&self, queue: &str) -> Result<Vec<Job>, QueueError> {
    load_jobs(&self.queue_dir(queue).join(PENDING_DIR))
  }

  fn enqueue(&self, request: JobRequest) -> Result<Job, QueueError> {
    let job = Job {
      id: Uuid::now_v7().to_string(),
      queue: request.queue,
      title: request.title,
      dataset_id: Some(request.dataset_id),
      operation: Some(request.operation),
      enqueued_at: Utc::now(),
    };

    let path = self
      .queue_dir(&job.queue)
      .join(PENDING_DIR)
      .join(format!("{}.json", job.id));
    write_json_atomic(&path, &job).map_err(|e| write_error(&path, e))?;

    debug!(queue = %job.queue, job = %job.id, title = %job.title, "enqueued job");
    Ok(job)
  }
}

impl JobSource for FileQueue {
  fn claim_next(&self, queue: &str) -> Result<Option<Job>, QueueError> {
    let pending = self.queue_dir(queue).join(PENDING_DIR);
    let running = self.queue_dir(queue).join(RUNNING_DIR);

    for path in job_files(&pending)? {
      let Some(name) = path.file_name() else { continue };
      fs::create_dir_all(&running).map_err(|e| write_error(&running, e))?;
      let target = running.join(name);

      match fs::rename(&path, &target) {
        Ok(()) => return load_job(&target).map(Some),
        // Another worker claimed it first.
        Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
        Err(e) => return Err(write_error(&target, e)),
      }
    }

    Ok(None)
  }

  fn finish(&self, job: &Job, state: JobState) -> Result<(), QueueError> {
    if !state.is_terminal() {
      return Err(QueueError::NotTerminal {
        job: job.id.clone(),
        state,
      });
    }

    let path = self
      .queue_dir(&job.queue)
      .join(RUNNING_DIR)
      .join(format!("{}.json", job.id));

    match fs::remove_file(&path) {
      Ok(()) => {}
      Err(e) if e.kind() == io::ErrorKind::NotFound => {}
      Err(e) => return Err(write_error(&path, e)),
    }

    debug!(queue = %job.queue, job = %job.id, %state, "finished job");
    Ok(())
  }
}

/// Job files in `dir`, sorted by name. A missing directory has no jobs.
fn job_files(dir: &Path) -> Result<Vec<PathBuf>, QueueError> {
  let entries = match fs::read_dir(dir) {
    Ok(entries) => entries,
    Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
    Err(e) => return Err(read_error(dir, e)),
  };

  let mut files = Vec::new();
  for entry in entries {
    let path = entry.map_err(|e| read_error(dir, e))?.path();
    let is_job = path.extension().is_some_and(|ext| ext == "json")
      && !path
        .file_name()
        .is_some_and(|name| name.to_string_lossy().starts_with('.'));
    if is_job {
      files.push(path);
    }
  }
  files.sort();
  Ok(files)
}

fn load_jobs(dir: &Path) -> Result<Vec<Job>, QueueError> {
  let mut jobs = Vec::new();
  for path in job_files(dir)? {
    match load_job(&path) {
      Ok(job) => jobs.push(job),
      // Claimed between listing and reading.
      Err(QueueError::Read { source, .. }) if source.kind() == io::ErrorKind::NotFound => {}
      Err(e) => return Err(e),
    }
  }
  Ok(jobs)
}

fn load_job(path: &Path) -> Result<Job, QueueError> {
  let content = fs::read_to_string(path).map_err(|e| read_error(path, e))?;
  serde_json::from_str(&content).map_err(|e| QueueError::Parse {
    path: path.display().to_string(),
    source: e,
  })
}

fn read_error(path: &Path, source: io::Error) -> QueueError {
  QueueError::Read {
    path: path.display().to_string(),
    source,
  }
}

fn write_error(path: &Path, source: io::Error) -> QueueError {
  QueueError::Write {
    path: path.display().to_string(),
    source,
  }
}
