use std::path::Path;

use anyhow::Result;
use serde::Serialize;

use catbundle_lib::queue::{Job, JobQueue, JobState};

use crate::app::App;
use crate::output::{Mark, OutputFormat, print_info, print_json};

/// A job as listed, tagged with the state its directory implies.
#[derive(Serialize)]
struct Listed<'a> {
  state: JobState,
  #[serde(flatten)]
  job: &'a Job,
}

fn listed(state: JobState, jobs: &[Job]) -> Vec<Listed<'_>> {
  jobs.iter().map(|job| Listed { state, job }).collect()
}

pub fn cmd_jobs(config: Option<&Path>, output: OutputFormat) -> Result<()> {
  let app = App::open(config)?;
  let queue = &app.config.queue_name;
  let pending = app.queue.list_pending(queue)?;
  let running = app.queue.list_running(queue)?;

  let running = listed(JobState::Running, &running);
  let pending = listed(JobState::Queued, &pending);

  if output.is_json() {
    print_json(&serde_json::json!({
      "queue": queue,
      "pending": pending,
      "running": running,
    }))?;
    return Ok(());
  }

  if pending.is_empty() && running.is_empty() {
    print_info(&format!("Queue '{}' is empty", queue));
    return Ok(());
  }

  println!("{} job(s) in '{}':", running.len() + pending.len(), queue);
  for entry in running.iter().chain(&pending) {
    println!(
      "  {} {:<8} {}  {}",
      Mark::Note.symbol(),
      entry.state,
      entry.job.enqueued_at.format("%Y-%m-%d %H:%M:%S"),
      entry.job.title
    );
  }
  Ok(())
}
