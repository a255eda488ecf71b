use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};

use catbundle_lib::catalog::{Catalog, NewResource, Payload};

use crate::app::App;
use crate::output::{OutputFormat, format_bytes, print_json, print_stat, print_success};

pub fn cmd_add_resource(
  config: Option<&Path>,
  dataset: &str,
  name: String,
  format: String,
  url: Option<String>,
  file: Option<PathBuf>,
  output: OutputFormat,
) -> Result<()> {
  let app = App::open(config)?;

  let payload = match (url, file) {
    (Some(url), None) => Payload::Remote { url },
    (None, Some(path)) => {
      let bytes = std::fs::read(&path).with_context(|| format!("Failed to read {}", path.display()))?;
      let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| name.clone());
      Payload::Upload { filename, bytes }
    }
    _ => bail!("exactly one of --url or --file is required"),
  };

  let resource = app
    .catalog
    .create_resource(
      dataset,
      NewResource {
        name,
        format,
        description: None,
        payload,
        attributes: BTreeMap::new(),
      },
    )
    .with_context(|| format!("Failed to add resource to {}", dataset))?;

  if output.is_json() {
    print_json(&resource)?;
  } else {
    print_success(&format!("Added resource {}", resource.id));
    print_stat("Dataset", &resource.dataset_id);
    print_stat("Source", resource.content.reference());
    if let Some(size) = resource.size {
      print_stat("Size", &format_bytes(size));
    }
  }

  Ok(())
}
