//! Catalog access.
//!
//! The catalog owns datasets and resources. The bundler reads datasets, creates
//! and patches the bundle resource, and listens to the catalog's change
//! notifications. [`Catalog`] is the seam; [`FileCatalog`] is a JSON-on-disk
//! implementation used by the CLI and tests.

mod events;
mod store;
mod types;

use std::io;

use thiserror::Error;

pub use events::{Entity, EntityEvent, EntityListener, Operation};
pub use store::FileCatalog;
pub use types::{Dataset, NewResource, Payload, Resource, ResourceContent, ResourcePatch};

/// Errors returned by catalog operations.
#[derive(Debug, Error)]
pub enum CatalogError {
  #[error("dataset not found: {0}")]
  DatasetNotFound(String),

  #[error("resource not found: {0}")]
  ResourceNotFound(String),

  #[error("invalid id {0:?}: ids must not be empty, start with '.', or contain path separators or '..'")]
  InvalidId(String),

  #[error("failed to lock catalog at {path}: {source}")]
  Lock {
    path: String,
    #[source]
    source: io::Error,
  },

  #[error("failed to read {path}: {source}")]
  Read {
    path: String,
    #[source]
    source: io::Error,
  },

  #[error("failed to write {path}: {source}")]
  Write {
    path: String,
    #[source]
    source: io::Error,
  },

  #[error("failed to parse {path}: {source}")]
  Parse {
    path: String,
    #[source]
    source: serde_json::Error,
  },

  #[error("failed to serialize catalog record: {0}")]
  Serialize(#[source] serde_json::Error),
}

impl CatalogError {
  /// True when the requested dataset or resource does not exist.
  pub fn is_not_found(&self) -> bool {
    matches!(self, CatalogError::DatasetNotFound(_) | CatalogError::ResourceNotFound(_))
  }
}

/// Operations the bundler needs from a catalog.
///
/// Writes must be atomic per call; the bundler adds no locking of its own.
pub trait Catalog: Send + Sync {
  /// Load a dataset by id or name.
  fn get_dataset(&self, id: &str) -> Result<Dataset, CatalogError>;

  /// Load a resource by id. `Resource::dataset_id` names the owning dataset.
  fn get_resource(&self, id: &str) -> Result<Resource, CatalogError>;

  fn create_resource(&self, dataset_id: &str, resource: NewResource) -> Result<Resource, CatalogError>;

  fn patch_resource(&self, id: &str, patch: ResourcePatch) -> Result<Resource, CatalogError>;
}
