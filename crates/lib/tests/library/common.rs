use std::collections::BTreeMap;
use std::sync::Arc;

use catbundle_lib::catalog::{Catalog, Dataset, EntityListener, FileCatalog, NewResource, Payload};
use catbundle_lib::dedup::JobDeduplicator;
use catbundle_lib::dispatch::ChangeDispatcher;
use catbundle_lib::fetch::StorageFetcher;
use catbundle_lib::queue::{FileQueue, JobQueue};
use catbundle_lib::rebuild::Rebuilder;
use tempfile::TempDir;

pub const QUEUE: &str = "default";

/// A catalog and queue on disk, wired the way the CLI wires them.
pub struct Pipeline {
  pub _temp: TempDir,
  pub catalog: Arc<FileCatalog>,
  pub queue: Arc<FileQueue>,
  pub dispatcher: Arc<ChangeDispatcher>,
  pub rebuilder: Arc<Rebuilder>,
}

impl Pipeline {
  pub fn new() -> Self {
    let temp = TempDir::new().unwrap();
    let catalog = Arc::new(FileCatalog::new(temp.path().join("catalog")));
    let queue = Arc::new(FileQueue::new(temp.path().join("queue")));

    let job_queue: Arc<dyn JobQueue> = queue.clone();
    let dispatcher = Arc::new(ChangeDispatcher::new(
      catalog.clone(),
      JobDeduplicator::new(job_queue, QUEUE),
    ));
    let listener: Arc<dyn EntityListener> = dispatcher.clone();
    catalog.register_listener(&listener);

    let fetcher = Arc::new(StorageFetcher::new(catalog.clone()));
    let rebuilder = Arc::new(Rebuilder::new(catalog.clone(), fetcher));

    Self {
      _temp: temp,
      catalog,
      queue,
      dispatcher,
      rebuilder,
    }
  }

  pub fn add_dataset(&self, id: &str, name: &str) -> Dataset {
    self.catalog.put_dataset(Dataset::new(id, name)).unwrap()
  }

  pub fn upload(&self, dataset: &str, name: &str, bytes: &[u8]) -> String {
    self
      .catalog
      .create_resource(
        dataset,
        NewResource {
          name: name.to_string(),
          format: "CSV".to_string(),
          description: None,
          payload: Payload::Upload {
            filename: format!("{}.csv", name),
            bytes: bytes.to_vec(),
          },
          attributes: BTreeMap::new(),
        },
      )
      .unwrap()
      .id
  }

  pub fn pending(&self) -> usize {
    self.queue.list_pending(QUEUE).unwrap().len()
  }
}
