//! JSON-on-disk catalog.
//!
//! # Storage Layout
//!
//! ```text
//! {root}/
//! ├── datasets/<dataset id>.json          # Dataset record, resources inline
//! └── uploads/<resource id>/<filename>    # Uploaded resource content
//! ```
//!
//! Every write is a read-modify-write of one dataset record, done while holding
//! `{root}/.lock` so handles in other processes cannot interleave. The record
//! is replaced atomically (temp file + rename) and the registered listener is
//! notified once the lock is released.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock, Weak};

use chrono::Utc;
use tracing::{debug, warn};
use uuid::Uuid;

use super::events::{EntityEvent, EntityListener, Operation};
use super::types::{Dataset, NewResource, Payload, Resource, ResourceContent, ResourcePatch};
use super::{Catalog, CatalogError};
use crate::util::fs::{write_atomic, write_json_atomic};
use crate::util::hash::hash_bytes;
use crate::util::lock::DirLock;

const DATASETS_DIR: &str = "datasets";
const UPLOADS_DIR: &str = "uploads";

pub struct FileCatalog {
  root: PathBuf,
  listener: RwLock<Option<Weak<dyn EntityListener>>>,
}

impl FileCatalog {
  pub fn new(root: PathBuf) -> Self {
    Self {
      root,
      listener: RwLock::new(None),
    }
  }

  pub fn root(&self) -> &Path {
    &self.root
  }

  /// Register the change listener. The catalog keeps a weak reference, so the
  /// caller owns the listener's lifetime.
  pub fn register_listener(&self, listener: &Arc<dyn EntityListener>) {
    let mut slot = self.listener.write().unwrap_or_else(|e| e.into_inner());
    *slot = Some(Arc::downgrade(listener));
  }

  /// Path of an uploaded resource's content, if it is an upload.
  pub fn upload_path(&self, resource: &Resource) -> Option<PathBuf> {
    match &resource.content {
      ResourceContent::Upload { filename } => Some(
        self
          .root
          .join(UPLOADS_DIR)
          .join(&resource.id)
          .join(sanitize_filename(filename)),
      ),
      ResourceContent::Remote { .. } => None,
    }
  }

  /// All datasets, ordered by id.
  pub fn list_datasets(&self) -> Result<Vec<Dataset>, CatalogError> {
    let dir = self.root.join(DATASETS_DIR);
    let entries = match fs::read_dir(&dir) {
      Ok(entries) => entries,
      Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
      Err(e) => return Err(read_error(&dir, e)),
    };

    let mut datasets = Vec::new();
    for entry in entries {
      let path = entry.map_err(|e| read_error(&dir, e))?.path();
      if path.extension().is_some_and(|ext| ext == "json") {
        datasets.push(load_dataset_file(&path)?);
      }
    }
    datasets.sort_by(|a, b| a.id.cmp(&b.id));
    Ok(datasets)
  }

  /// Insert or replace a dataset record.
  ///
  /// Resources are stored as given, with `dataset_id` filled in and missing ids
  /// generated. `metadata_modified` is set to now. Ids must be usable as file
  /// names.
  pub fn put_dataset(&self, mut dataset: Dataset) -> Result<Dataset, CatalogError> {
    check_id(&dataset.id)?;
    for resource in dataset.resources.iter().filter(|r| !r.id.is_empty()) {
      check_id(&resource.id)?;
    }

    let operation = {
      let _guard = self.lock()?;
      let existed = self.dataset_path(&dataset.id).exists();

      for resource in &mut dataset.resources {
        if resource.id.is_empty() {
          resource.id = Uuid::now_v7().to_string();
        }
        resource.dataset_id = dataset.id.clone();
      }
      dataset.metadata_modified = Utc::now();
      self.save_dataset(&dataset)?;

      if existed { Operation::Changed } else { Operation::Created }
    };

    debug!(dataset = %dataset.id, %operation, "stored dataset");
    self.notify(&EntityEvent::dataset(&dataset.id, operation));
    Ok(dataset)
  }

  /// Remove a resource from its dataset, along with any uploaded content.
  ///
  /// Listeners see the resource deletion followed by a change to the owning
  /// dataset, whose composition changed.
  pub fn delete_resource(&self, id: &str) -> Result<(), CatalogError> {
    let dataset_id = {
      let _guard = self.lock()?;
      let mut dataset = self.find_resource_owner(id)?;
      let removed = dataset
        .resources
        .iter()
        .position(|r| r.id == id)
        .map(|idx| dataset.resources.remove(idx));
      dataset.metadata_modified = Utc::now();
      self.save_dataset(&dataset)?;

      if removed.as_ref().is_some_and(|r| self.upload_path(r).is_some()) {
        let dir = self.root.join(UPLOADS_DIR).join(id);
        if let Err(e) = fs::remove_dir_all(&dir)
          && e.kind() != io::ErrorKind::NotFound
        {
          warn!(resource = %id, error = %e, "failed to remove uploaded content");
        }
      }
      dataset.id
    };

    debug!(dataset = %dataset_id, resource = %id, "deleted resource");
    self.notify(&EntityEvent::resource(id, Operation::Deleted));
    self.notify(&EntityEvent::dataset(&dataset_id, Operation::Changed));
    Ok(())
  }

  fn lock(&self) -> Result<DirLock, CatalogError> {
    DirLock::exclusive(&self.root).map_err(|e| CatalogError::Lock {
      path: self.root.display().to_string(),
      source: e,
    })
  }

  fn dataset_path(&self, id: &str) -> PathBuf {
    self.root.join(DATASETS_DIR).join(format!("{}.json", id))
  }

  fn save_dataset(&self, dataset: &Dataset) -> Result<(), CatalogError> {
    let path = self.dataset_path(&dataset.id);
    write_json_atomic(&path, dataset).map_err(|e| write_error(&path, e))
  }

  fn find_dataset(&self, id_or_name: &str) -> Result<Dataset, CatalogError> {
    // Names are free text; only a valid id can address a record file.
    if check_id(id_or_name).is_ok() {
      let path = self.dataset_path(id_or_name);
      match load_dataset_file(&path) {
        Ok(dataset) => return Ok(dataset),
        Err(CatalogError::Read { source, .. }) if source.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(e),
      }
    }

    self
      .list_datasets()?
      .into_iter()
      .find(|d| d.name == id_or_name)
      .ok_or_else(|| CatalogError::DatasetNotFound(id_or_name.to_string()))
  }

  fn find_resource_owner(&self, resource_id: &str) -> Result<Dataset, CatalogError> {
    self
      .list_datasets()?
      .into_iter()
      .find(|d| d.resource(resource_id).is_some())
      .ok_or_else(|| CatalogError::ResourceNotFound(resource_id.to_string()))
  }

  /// Write uploaded bytes to storage and describe the stored content.
  fn store_payload(
    &self,
    resource_id: &str,
    payload: Payload,
  ) -> Result<(ResourceContent, Option<u64>, Option<String>), CatalogError> {
    match payload {
      Payload::Remote { url } => Ok((ResourceContent::Remote { url }, None, None)),
      Payload::Upload { filename, bytes } => {
        let dir = self.root.join(UPLOADS_DIR).join(resource_id);
        // Replacing an upload may change its filename; drop the old one first.
        if dir.exists() {
          fs::remove_dir_all(&dir).map_err(|e| write_error(&dir, e))?;
        }
        let path = dir.join(sanitize_filename(&filename));
        write_atomic(&path, &bytes).map_err(|e| write_error(&path, e))?;

        let hash = hash_bytes(&bytes);
        Ok((ResourceContent::Upload { filename }, Some(bytes.len() as u64), Some(hash.0)))
      }
    }
  }

  fn notify(&self, event: &EntityEvent) {
    let listener = {
      let slot = self.listener.read().unwrap_or_else(|e| e.into_inner());
      slot.as_ref().and_then(Weak::upgrade)
    };

    if let Some(listener) = listener {
      listener.on_entity_event(event);
    }
  }
}

impl Catalog for FileCatalog {
  fn get_dataset(&self, id: &str) -> Result<Dataset, CatalogError> {
    self.find_dataset(id)
  }

  fn get_resource(&self, id: &str) -> Result<Resource, CatalogError> {
    let dataset = self.find_resource_owner(id)?;
    dataset
      .resource(id)
      .cloned()
      .ok_or_else(|| CatalogError::ResourceNotFound(id.to_string()))
  }

  fn create_resource(&self, dataset_id: &str, resource: NewResource) -> Result<Resource, CatalogError> {
    let created = {
      let _guard = self.lock()?;
      let mut dataset = self.find_dataset(dataset_id)?;

      let id = Uuid::now_v7().to_string();
      let (content, size, hash) = self.store_payload(&id, resource.payload)?;
      let created = Resource {
        id,
        dataset_id: dataset.id.clone(),
        name: resource.name,
        format: resource.format,
        description: resource.description,
        content,
        size,
        hash,
        attributes: resource.attributes,
      };

      dataset.resources.push(created.clone());
      dataset.metadata_modified = Utc::now();
      self.save_dataset(&dataset)?;
      created
    };

    debug!(dataset = %created.dataset_id, resource = %created.id, "created resource");
    self.notify(&EntityEvent::resource(&created.id, Operation::Created));
    Ok(created)
  }

  fn patch_resource(&self, id: &str, patch: ResourcePatch) -> Result<Resource, CatalogError> {
    let patched = {
      let _guard = self.lock()?;
      let mut dataset = self.find_resource_owner(id)?;

      let stored = match patch.payload {
        Some(payload) => Some(self.store_payload(id, payload)?),
        None => None,
      };

      let resource = dataset
        .resources
        .iter_mut()
        .find(|r| r.id == id)
        .ok_or_else(|| CatalogError::ResourceNotFound(id.to_string()))?;

      if let Some(name) = patch.name {
        resource.name = name;
      }
      if let Some(format) = patch.format {
        resource.format = format;
      }
      if let Some((content, size, hash)) = stored {
        resource.content = content;
        resource.size = size;
        resource.hash = hash;
      }
      resource.attributes.extend(patch.attributes);

      let patched = resource.clone();
      dataset.metadata_modified = Utc::now();
      self.save_dataset(&dataset)?;
      patched
    };

    debug!(dataset = %patched.dataset_id, resource = %patched.id, "patched resource");
    self.notify(&EntityEvent::resource(&patched.id, Operation::Changed));
    Ok(patched)
  }
}

fn load_dataset_file(path: &Path) -> Result<Dataset, CatalogError> {
  let content = fs::read_to_string(path).map_err(|e| read_error(path, e))?;
  serde_json::from_str(&content).map_err(|e| CatalogError::Parse {
    path: path.display().to_string(),
    source: e,
  })
}

/// Dataset and resource ids name files and directories in the store.
fn check_id(id: &str) -> Result<(), CatalogError> {
  let valid = !id.is_empty()
    && !id.contains("..")
    && !id.contains(['/', '\\', '\0'])
    && !id.starts_with('.');
  if valid {
    Ok(())
  } else {
    Err(CatalogError::InvalidId(id.to_string()))
  }
}

/// Keep only the final path component so uploads cannot escape their directory.
fn sanitize_filename(filename: &str) -> String {
  let name = filename.rsplit(['/', '\\']).next().unwrap_or(filename);
  if name.is_empty() || name == "." || name == ".." {
    "upload".to_string()
  } else {
    name.to_string()
  }
}

fn read_error(path: &Path, source: io::Error) -> CatalogError {
  CatalogError::Read {
    path: path.display().to_string(),
    source,
  }
}

fn write_error(path: &Path, source: io::Error) -> CatalogError {
  CatalogError::Write {
    path: path.display().to_string(),
    source,
  }
}
