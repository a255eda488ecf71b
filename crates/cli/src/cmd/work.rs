//! Implementation of the `catbundle work` command.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result, bail};

use catbundle_lib::queue::{JobSource, JobState};
use catbundle_lib::rebuild::RebuildOptions;
use catbundle_lib::worker::{WorkerConfig, run_pending};

use crate::app::App;
use crate::output::{
  OutputFormat, format_duration, print_error, print_info, print_json, print_skipped, print_stat, print_success,
};

/// Drain the configured queue, then exit. Fails if any job failed.
pub fn cmd_work(config: Option<&Path>, parallelism: Option<usize>, recover: bool, output: OutputFormat) -> Result<()> {
  let start = Instant::now();
  let app = App::open(config)?;

  if recover {
    let recovered = app.queue.recover_running(&app.config.queue_name)?;
    if recovered > 0 && !output.is_json() {
      print_info(&format!("Requeued {} interrupted job(s)", recovered));
    }
  }

  let worker_config = WorkerConfig {
    queue: app.config.queue_name.clone(),
    parallelism: parallelism.unwrap_or(app.config.parallelism),
    options: RebuildOptions::default(),
  };
  // Held here so the blocking HTTP client is dropped outside the runtime.
  let rebuilder = Arc::new(app.rebuilder()?);
  let source: Arc<dyn JobSource> = app.queue.clone();

  let rt = tokio::runtime::Runtime::new().context("Failed to create async runtime")?;
  let report = rt
    .block_on(run_pending(source, rebuilder.clone(), &worker_config))
    .context("Worker stopped")?;

  let failed = report.count(JobState::Failed);

  if output.is_json() {
    print_json(&report)?;
  } else if report.jobs.is_empty() {
    print_info("No pending jobs");
  } else {
    for job in &report.jobs {
      let target = job.dataset_id.as_deref().unwrap_or("?");
      match job.state {
        JobState::Published => print_success(&format!("{} published", target)),
        JobState::Skipped => print_skipped(&format!("{} unchanged", target)),
        _ => print_error(&format!(
          "{} failed: {}",
          target,
          job.error.as_deref().unwrap_or("unknown error")
        )),
      }
    }
    println!();
    print_stat("Published", &report.count(JobState::Published).to_string());
    print_stat("Skipped", &report.count(JobState::Skipped).to_string());
    print_stat("Failed", &failed.to_string());
    print_stat("Duration", &format_duration(start.elapsed()));
  }

  if failed > 0 {
    bail!("{} job(s) failed", failed);
  }
  Ok(())
}
