//! Fixtures and fakes shared by unit tests.

use std::collections::{BTreeMap, HashMap};
use std::io::{Cursor, Read};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use chrono::Utc;

use crate::catalog::{
  Catalog, CatalogError, Dataset, EntityEvent, EntityListener, FileCatalog, NewResource, Resource, ResourceContent,
  ResourcePatch,
};
use crate::consts::{BUNDLE_FINGERPRINT_ATTR, BUNDLE_FORMAT, BUNDLE_MARKER_ATTR, BUNDLE_RESOURCE_NAME};
use crate::fetch::{ContentFetcher, FetchError};
use crate::queue::{Job, JobQueue, JobRequest, QueueError};

pub fn remote_resource(id: &str, name: &str, url: &str) -> Resource {
  Resource {
    id: id.to_string(),
    dataset_id: "ds1".to_string(),
    name: name.to_string(),
    format: "CSV".to_string(),
    description: None,
    content: ResourceContent::Remote { url: url.to_string() },
    size: None,
    hash: None,
    attributes: BTreeMap::new(),
  }
}

pub fn bundle_resource(id: &str, generated_at: &str, fingerprint: &str) -> Resource {
  Resource {
    id: id.to_string(),
    dataset_id: "ds1".to_string(),
    name: BUNDLE_RESOURCE_NAME.to_string(),
    format: BUNDLE_FORMAT.to_string(),
    description: None,
    content: ResourceContent::Upload {
      filename: "roads.zip".to_string(),
    },
    size: None,
    hash: None,
    attributes: BTreeMap::from([
      (BUNDLE_MARKER_ATTR.to_string(), generated_at.to_string()),
      (BUNDLE_FINGERPRINT_ATTR.to_string(), fingerprint.to_string()),
    ]),
  }
}

/// Dataset `id` named "roads" holding `resources`.
pub fn dataset_with(id: &str, resources: Vec<Resource>) -> Dataset {
  let mut dataset = Dataset::new(id, "roads");
  dataset.resources = resources
    .into_iter()
    .map(|mut res| {
      res.dataset_id = id.to_string();
      res
    })
    .collect();
  dataset
}

pub fn pending_job(id: &str, title: &str, dataset_id: Option<&str>) -> Job {
  Job {
    id: id.to_string(),
    queue: "default".to_string(),
    title: title.to_string(),
    dataset_id: dataset_id.map(str::to_string),
    operation: None,
    enqueued_at: Utc::now(),
  }
}

/// Entries of a ZIP archive keyed by name.
pub fn read_zip_entries(bytes: &[u8]) -> BTreeMap<String, Vec<u8>> {
  let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
  let mut entries = BTreeMap::new();
  for i in 0..archive.len() {
    let mut file = archive.by_index(i).unwrap();
    let mut content = Vec::new();
    file.read_to_end(&mut content).unwrap();
    entries.insert(file.name().to_string(), content);
  }
  entries
}

#[derive(Default)]
pub struct RecordingListener {
  events: Mutex<Vec<EntityEvent>>,
}

impl RecordingListener {
  pub fn events(&self) -> Vec<EntityEvent> {
    self.events.lock().unwrap().clone()
  }
}

impl EntityListener for RecordingListener {
  fn on_entity_event(&self, event: &EntityEvent) {
    self.events.lock().unwrap().push(event.clone());
  }
}

/// Serves fixed bytes per resource id; every other resource fails with 404.
#[derive(Default)]
pub struct MapFetcher {
  content: HashMap<String, Vec<u8>>,
}

impl MapFetcher {
  pub fn with(mut self, resource_id: &str, bytes: &[u8]) -> Self {
    self.content.insert(resource_id.to_string(), bytes.to_vec());
    self
  }
}

impl ContentFetcher for MapFetcher {
  fn fetch(&self, resource: &Resource) -> Result<Vec<u8>, FetchError> {
    self
      .content
      .get(&resource.id)
      .cloned()
      .ok_or_else(|| FetchError::Status {
        url: resource.content.reference().to_string(),
        status: 404,
      })
  }
}

/// In-memory queue recording every call.
#[derive(Default)]
pub struct FakeQueue {
  pending: Mutex<Vec<Job>>,
  fail_listing: bool,
  list_calls: AtomicUsize,
}

impl FakeQueue {
  pub fn with_pending(jobs: Vec<Job>) -> Self {
    Self {
      pending: Mutex::new(jobs),
      ..Self::default()
    }
  }

  pub fn failing_listing() -> Self {
    Self {
      fail_listing: true,
      ..Self::default()
    }
  }

  pub fn pending(&self) -> Vec<Job> {
    self.pending.lock().unwrap().clone()
  }

  pub fn list_calls(&self) -> usize {
    self.list_calls.load(Ordering::SeqCst)
  }
}

impl JobQueue for FakeQueue {
  fn list_pending(&self, _queue: &str) -> Result<Vec<Job>, QueueError> {
    self.list_calls.fetch_add(1, Ordering::SeqCst);
    if self.fail_listing {
      return Err(QueueError::Unavailable("listing disabled".to_string()));
    }
    Ok(self.pending())
  }

  fn enqueue(&self, request: JobRequest) -> Result<Job, QueueError> {
    let mut pending = self.pending.lock().unwrap();
    let job = Job {
      id: format!("job-{}", pending.len() + 1),
      queue: request.queue,
      title: request.title,
      dataset_id: Some(request.dataset_id),
      operation: Some(request.operation),
      enqueued_at: Utc::now(),
    };
    pending.push(job.clone());
    Ok(job)
  }
}

/// A [`FileCatalog`] that counts the writes the publisher makes.
pub struct CountingCatalog {
  pub inner: Arc<FileCatalog>,
  creates: AtomicUsize,
  patches: AtomicUsize,
}

impl CountingCatalog {
  pub fn new(inner: Arc<FileCatalog>) -> Self {
    Self {
      inner,
      creates: AtomicUsize::new(0),
      patches: AtomicUsize::new(0),
    }
  }

  pub fn creates(&self) -> usize {
    self.creates.load(Ordering::SeqCst)
  }

  pub fn patches(&self) -> usize {
    self.patches.load(Ordering::SeqCst)
  }

  pub fn writes(&self) -> usize {
    self.creates() + self.patches()
  }
}

impl Catalog for CountingCatalog {
  fn get_dataset(&self, id: &str) -> Result<Dataset, CatalogError> {
    self.inner.get_dataset(id)
  }

  fn get_resource(&self, id: &str) -> Result<Resource, CatalogError> {
    self.inner.get_resource(id)
  }

  fn create_resource(&self, dataset_id: &str, resource: NewResource) -> Result<Resource, CatalogError> {
    self.creates.fetch_add(1, Ordering::SeqCst);
    self.inner.create_resource(dataset_id, resource)
  }

  fn patch_resource(&self, id: &str, patch: ResourcePatch) -> Result<Resource, CatalogError> {
    self.patches.fetch_add(1, Ordering::SeqCst);
    self.inner.patch_resource(id, patch)
  }
}
