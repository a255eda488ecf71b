//! Building a manifest from live catalog state.

use std::sync::Arc;

use thiserror::Error;
use tracing::debug;

use super::types::Manifest;
use crate::catalog::{Catalog, CatalogError, Dataset, Resource};
use crate::extract::extract_bundle_resource;

#[derive(Debug, Error)]
pub enum ManifestError {
  /// The dataset was deleted between the request and the build.
  #[error("dataset not found: {0}")]
  DatasetNotFound(String),

  #[error("failed to load dataset {dataset}: {source}")]
  Catalog {
    dataset: String,
    #[source]
    source: CatalogError,
  },
}

/// A manifest together with the catalog state it was built from.
#[derive(Debug, Clone)]
pub struct BuiltManifest {
  pub dataset: Dataset,
  /// The currently published bundle, if any.
  pub bundle: Option<Resource>,
  pub manifest: Manifest,
}

pub struct ManifestBuilder {
  catalog: Arc<dyn Catalog>,
}

impl ManifestBuilder {
  pub fn new(catalog: Arc<dyn Catalog>) -> Self {
    Self { catalog }
  }

  pub fn build(&self, dataset_id: &str) -> Result<Manifest, ManifestError> {
    self.build_with_state(dataset_id).map(|built| built.manifest)
  }

  /// Load the dataset once and return it alongside its manifest and bundle.
  pub fn build_with_state(&self, dataset_id: &str) -> Result<BuiltManifest, ManifestError> {
    let dataset = self.catalog.get_dataset(dataset_id).map_err(|e| {
      if e.is_not_found() {
        ManifestError::DatasetNotFound(dataset_id.to_string())
      } else {
        ManifestError::Catalog {
          dataset: dataset_id.to_string(),
          source: e,
        }
      }
    })?;

    let (bundle, _) = extract_bundle_resource(&dataset.resources);
    let bundle = bundle.cloned();
    let manifest = Manifest::from_dataset(&dataset);

    debug!(
      dataset = %dataset.id,
      resources = manifest.resources.len(),
      has_bundle = bundle.is_some(),
      "built manifest"
    );

    Ok(BuiltManifest {
      dataset,
      bundle,
      manifest,
    })
  }
}
