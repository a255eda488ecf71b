//! Implementation of the `catbundle rebuild` command.
//!
//! Runs the rebuild job for one dataset in the foreground, bypassing the queue.

use std::path::Path;
use std::time::Instant;

use anyhow::{Context, Result};

use catbundle_lib::rebuild::{RebuildOptions, RebuildOutcome};

use crate::app::App;
use crate::output::{
  OutputFormat, format_duration, print_json, print_skipped, print_stat, print_success, print_warning, truncate_hash,
};

pub fn cmd_rebuild(config: Option<&Path>, dataset: &str, force: bool, output: OutputFormat) -> Result<()> {
  let start = Instant::now();
  let app = App::open(config)?;
  let rebuilder = app.rebuilder()?;

  let options = RebuildOptions {
    skip_if_unchanged: !force,
  };
  let outcome = rebuilder
    .rebuild(dataset, options)
    .with_context(|| format!("Rebuild of {} failed", dataset))?;

  if output.is_json() {
    let value = match &outcome {
      RebuildOutcome::Skipped { fingerprint } => serde_json::json!({
        "state": outcome.state(),
        "fingerprint": fingerprint,
      }),
      RebuildOutcome::Published {
        resource_id,
        fingerprint,
        created,
        failed_entries,
      } => serde_json::json!({
        "state": outcome.state(),
        "resource_id": resource_id,
        "fingerprint": fingerprint,
        "created": created,
        "failed_entries": failed_entries,
      }),
    };
    print_json(&value)?;
    return Ok(());
  }

  match &outcome {
    RebuildOutcome::Skipped { fingerprint } => {
      print_skipped(&format!("Bundle for {} is up to date", dataset));
      print_stat("Fingerprint", truncate_hash(&fingerprint.0));
    }
    RebuildOutcome::Published {
      resource_id,
      fingerprint,
      created,
      failed_entries,
    } => {
      let verb = if *created { "Created" } else { "Updated" };
      print_success(&format!("{} bundle for {}", verb, dataset));
      print_stat("Resource", resource_id);
      print_stat("Fingerprint", truncate_hash(&fingerprint.0));
      for id in failed_entries {
        print_warning(&format!("Resource {} could not be fetched and is missing from the bundle", id));
      }
    }
  }
  print_stat("Duration", &format_duration(start.elapsed()));

  Ok(())
}
