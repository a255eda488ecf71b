//! Implementation of the `catbundle import` command.

use std::path::Path;

use anyhow::{Context, Result};

use catbundle_lib::catalog::Dataset;
use catbundle_lib::dedup::job_dataset_id;
use catbundle_lib::queue::JobQueue;

use crate::app::App;
use crate::output::{OutputFormat, print_json, print_stat, print_success};

/// Store the dataset described by `file`. Resources without an id get one;
/// the catalog's change hook queues the first rebuild.
pub fn cmd_import(config: Option<&Path>, file: &Path, output: OutputFormat) -> Result<()> {
  let app = App::open(config)?;

  let content = std::fs::read_to_string(file).with_context(|| format!("Failed to read {}", file.display()))?;
  let dataset: Dataset =
    serde_json::from_str(&content).with_context(|| format!("Invalid dataset JSON in {}", file.display()))?;

  let stored = app.catalog.put_dataset(dataset).context("Failed to store dataset")?;
  let queued = app
    .queue
    .list_pending(&app.config.queue_name)?
    .iter()
    .any(|job| job_dataset_id(job) == Some(stored.id.as_str()));

  if output.is_json() {
    print_json(&serde_json::json!({
      "id": stored.id,
      "name": stored.name,
      "resources": stored.resources.len(),
      "rebuild_queued": queued,
    }))?;
  } else {
    print_success(&format!("Stored dataset {}", stored.id));
    print_stat("Name", &stored.name);
    print_stat("Resources", &stored.resources.len().to_string());
    print_stat("Rebuild queued", if queued { "yes" } else { "no" });
  }

  Ok(())
}
