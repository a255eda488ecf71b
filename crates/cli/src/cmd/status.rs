//! Status command implementation.
//!
//! Compares a dataset's current manifest with its published bundle.

use std::path::Path;

use anyhow::{Context, Result};

use catbundle_lib::consts::BUNDLE_MARKER_ATTR;
use catbundle_lib::extract::facet_formats;
use catbundle_lib::fingerprint::{Fingerprintable, differs_from_bundle, stored_fingerprint};
use catbundle_lib::manifest::ManifestBuilder;

use crate::app::App;
use crate::output::{OutputFormat, format_bytes, print_info, print_json, print_stat, print_success, print_warning, truncate_hash};

pub fn cmd_status(config: Option<&Path>, dataset: &str, output: OutputFormat) -> Result<()> {
  let app = App::open(config)?;
  let built = ManifestBuilder::new(app.catalog.clone())
    .build_with_state(dataset)
    .with_context(|| format!("Failed to load {}", dataset))?;

  let fingerprint = built.manifest.fingerprint().context("Failed to fingerprint manifest")?;
  let stale = differs_from_bundle(&fingerprint, built.bundle.as_ref());
  let stored = built.bundle.as_ref().and_then(stored_fingerprint);
  let formats = facet_formats(&built.dataset);

  if output.is_json() {
    print_json(&serde_json::json!({
      "id": built.dataset.id,
      "name": built.dataset.name,
      "resources": built.manifest.resources.len(),
      "formats": formats,
      "fingerprint": fingerprint,
      "bundle": built.bundle.as_ref().map(|b| serde_json::json!({
        "id": b.id,
        "generated_at": b.attribute(BUNDLE_MARKER_ATTR),
        "fingerprint": stored,
        "size": b.size,
      })),
      "up_to_date": !stale,
    }))?;
    return Ok(());
  }

  print_info(&format!("Dataset {} ({})", built.dataset.name, built.dataset.id));
  print_stat("Resources", &built.manifest.resources.len().to_string());
  print_stat("Formats", &formats.join(", "));
  print_stat("Fingerprint", truncate_hash(&fingerprint.0));
  println!();

  match &built.bundle {
    Some(bundle) => {
      print_stat("Bundle", &bundle.id);
      print_stat("Generated at", bundle.attribute(BUNDLE_MARKER_ATTR).unwrap_or("?"));
      print_stat(
        "Bundle fingerprint",
        stored.as_ref().map(|f| truncate_hash(&f.0)).unwrap_or("none"),
      );
      if let Some(size) = bundle.size {
        print_stat("Size", &format_bytes(size));
      }
    }
    None => print_stat("Bundle", "none"),
  }
  println!();

  if stale {
    print_warning("Bundle is out of date");
  } else {
    print_success("Bundle is up to date");
  }

  Ok(())
}
