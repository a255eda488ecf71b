//! `catbundle notify` and `catbundle data-loaded`: feed change notifications
//! to the dispatcher by hand.

use std::path::Path;

use anyhow::Result;

use catbundle_lib::catalog::EntityEvent;
use catbundle_lib::dispatch::DispatchOutcome;

use crate::app::App;
use crate::output::{OutputFormat, print_error, print_info, print_json, print_skipped, print_success};

pub fn cmd_notify(config: Option<&Path>, event: &EntityEvent, output: OutputFormat) -> Result<()> {
  let app = App::open(config)?;
  let outcome = app.dispatcher.on_entity_event(event);
  report(&outcome, output)
}

pub fn cmd_data_loaded(config: Option<&Path>, resource_id: &str, output: OutputFormat) -> Result<()> {
  let app = App::open(config)?;
  let outcome = app.dispatcher.on_data_loaded(resource_id);
  report(&outcome, output)
}

fn report(outcome: &DispatchOutcome, output: OutputFormat) -> Result<()> {
  if output.is_json() {
    let value = match outcome {
      DispatchOutcome::Enqueued(job) => serde_json::json!({ "outcome": "enqueued", "job": job }),
      DispatchOutcome::AlreadyQueued => serde_json::json!({ "outcome": "already_queued" }),
      DispatchOutcome::Ignored(reason) => serde_json::json!({ "outcome": "ignored", "reason": reason.to_string() }),
      DispatchOutcome::Failed(error) => serde_json::json!({ "outcome": "failed", "error": error }),
    };
    print_json(&value)?;
  } else {
    match outcome {
      DispatchOutcome::Enqueued(job) => print_success(&format!("Queued rebuild job {}", job)),
      DispatchOutcome::AlreadyQueued => print_info("A rebuild is already queued"),
      DispatchOutcome::Ignored(reason) => print_skipped(&format!("Ignored ({})", reason)),
      DispatchOutcome::Failed(error) => print_error(&format!("Could not queue rebuild: {}", error)),
    }
  }

  if let DispatchOutcome::Failed(error) = outcome {
    anyhow::bail!("enqueue failed: {}", error);
  }
  Ok(())
}
