//! Separating the generated bundle from a dataset's real resources.

use tracing::warn;

use crate::catalog::{Dataset, Resource};

/// Split `resources` into the bundle (if any) and everything else, preserving
/// order.
///
/// At most one resource should carry the bundle marker. If several do, the
/// first is returned as the bundle and the rest are still left out of
/// `remaining`.
pub fn extract_bundle_resource(resources: &[Resource]) -> (Option<&Resource>, Vec<&Resource>) {
  let mut bundle = None;
  let mut remaining = Vec::with_capacity(resources.len());

  for res in resources {
    if !res.is_bundle() {
      remaining.push(res);
    } else if bundle.is_none() {
      bundle = Some(res);
    } else {
      warn!(dataset = %res.dataset_id, resource = %res.id, "ignoring additional bundle resource");
    }
  }

  (bundle, remaining)
}

/// Distinct resource formats for a search index, in first-seen order.
///
/// The bundle is not a data resource, so its `ZIP` format is not listed
/// unless a real resource also has it.
pub fn facet_formats(dataset: &Dataset) -> Vec<String> {
  let (_, remaining) = extract_bundle_resource(&dataset.resources);
  let mut formats: Vec<String> = Vec::new();
  for res in remaining {
    let format = res.format.trim();
    if !format.is_empty() && !formats.iter().any(|f| f.eq_ignore_ascii_case(format)) {
      formats.push(format.to_string());
    }
  }
  formats
}
