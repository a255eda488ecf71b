//! Upserting the bundle resource.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::SecondsFormat;
use thiserror::Error;
use tracing::{info, warn};

use crate::catalog::{Catalog, CatalogError, Dataset, NewResource, Payload, Resource, ResourcePatch};
use crate::consts::{BUNDLE_FINGERPRINT_ATTR, BUNDLE_FORMAT, BUNDLE_MARKER_ATTR, BUNDLE_RESOURCE_NAME};
use crate::fingerprint::Fingerprint;

const BUNDLE_DESCRIPTION: &str = "Every resource of this dataset in one ZIP file, with a datapackage.json manifest.";

#[derive(Debug, Error)]
#[error("failed to publish bundle for {dataset}: {source}")]
pub struct PublishError {
  pub dataset: String,
  #[source]
  pub source: CatalogError,
}

#[derive(Debug, Clone)]
pub struct PublishedBundle {
  pub resource: Resource,
  /// False when an existing bundle was updated in place.
  pub created: bool,
}

pub struct ArchivePublisher {
  catalog: Arc<dyn Catalog>,
}

impl ArchivePublisher {
  pub fn new(catalog: Arc<dyn Catalog>) -> Self {
    Self { catalog }
  }

  /// Store `archive` as the dataset's bundle.
  ///
  /// Patches `existing_bundle` in place when given, so the bundle keeps its id;
  /// otherwise creates it. If the existing bundle vanished in the meantime a new
  /// one is created.
  pub fn publish(
    &self,
    dataset: &Dataset,
    archive: Vec<u8>,
    fingerprint: &Fingerprint,
    existing_bundle: Option<&Resource>,
  ) -> Result<PublishedBundle, PublishError> {
    let payload = Payload::Upload {
      filename: format!("{}.zip", dataset.name),
      bytes: archive,
    };
    let attributes = bundle_attributes(dataset, fingerprint);

    if let Some(bundle) = existing_bundle {
      let patch = ResourcePatch {
        name: Some(BUNDLE_RESOURCE_NAME.to_string()),
        format: Some(BUNDLE_FORMAT.to_string()),
        payload: Some(payload.clone()),
        attributes: attributes.clone(),
      };

      match self.catalog.patch_resource(&bundle.id, patch) {
        Ok(resource) => {
          info!(dataset = %dataset.id, resource = %resource.id, %fingerprint, "updated bundle");
          return Ok(PublishedBundle {
            resource,
            created: false,
          });
        }
        Err(e) if e.is_not_found() => {
          warn!(dataset = %dataset.id, resource = %bundle.id, "bundle disappeared, creating a new one");
        }
        Err(e) => {
          return Err(PublishError {
            dataset: dataset.id.clone(),
            source: e,
          });
        }
      }
    }

    let resource = self
      .catalog
      .create_resource(
        &dataset.id,
        NewResource {
          name: BUNDLE_RESOURCE_NAME.to_string(),
          format: BUNDLE_FORMAT.to_string(),
          description: Some(BUNDLE_DESCRIPTION.to_string()),
          payload,
          attributes,
        },
      )
      .map_err(|e| PublishError {
        dataset: dataset.id.clone(),
        source: e,
      })?;

    info!(dataset = %dataset.id, resource = %resource.id, %fingerprint, "created bundle");
    Ok(PublishedBundle {
      resource,
      created: true,
    })
  }
}

/// Marker and fingerprint attributes. The marker records the dataset's
/// modification time as of the manifest build.
fn bundle_attributes(dataset: &Dataset, fingerprint: &Fingerprint) -> BTreeMap<String, String> {
  BTreeMap::from([
    (
      BUNDLE_MARKER_ATTR.to_string(),
      dataset.metadata_modified.to_rfc3339_opts(SecondsFormat::AutoSi, true),
    ),
    (BUNDLE_FINGERPRINT_ATTR.to_string(), fingerprint.0.clone()),
  ])
}
