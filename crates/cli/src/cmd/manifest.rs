use std::path::Path;

use anyhow::{Context, Result};

use catbundle_lib::manifest::ManifestBuilder;

use crate::app::App;
use crate::output::print_json;

/// Print the manifest for `dataset` as it would be packaged, without fetch
/// annotations. Always JSON.
pub fn cmd_manifest(config: Option<&Path>, dataset: &str) -> Result<()> {
  let app = App::open(config)?;
  let manifest = ManifestBuilder::new(app.catalog.clone())
    .build(dataset)
    .with_context(|| format!("Failed to build manifest for {}", dataset))?;
  print_json(&manifest)
}
