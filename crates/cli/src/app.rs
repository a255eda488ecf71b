//! Wiring shared by the commands: config, catalog, queue and dispatcher.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::debug;

use catbundle_lib::catalog::{Catalog, EntityListener, FileCatalog};
use catbundle_lib::config::Config;
use catbundle_lib::dedup::JobDeduplicator;
use catbundle_lib::dispatch::ChangeDispatcher;
use catbundle_lib::fetch::{DefaultFetcher, HttpFetcher, StorageFetcher};
use catbundle_lib::queue::{FileQueue, JobQueue};
use catbundle_lib::rebuild::Rebuilder;

pub struct App {
  pub config: Config,
  pub catalog: Arc<FileCatalog>,
  pub queue: Arc<FileQueue>,
  pub dispatcher: Arc<ChangeDispatcher>,
}

impl App {
  /// Load config and open the stores. The dispatcher is registered with the
  /// catalog, so writes made through `catalog` enqueue rebuilds.
  pub fn open(config_path: Option<&Path>) -> Result<Self> {
    let config = Config::load(config_path).context("Failed to load configuration")?;
    let catalog_dir = config.catalog_dir()?;
    let queue_dir = config.queue_dir()?;
    debug!(catalog = %catalog_dir.display(), queue = %queue_dir.display(), "opening stores");

    let catalog = Arc::new(FileCatalog::new(catalog_dir));
    let queue = Arc::new(FileQueue::new(queue_dir));

    let job_queue: Arc<dyn JobQueue> = queue.clone();
    let shared_catalog: Arc<dyn Catalog> = catalog.clone();
    let dispatcher = Arc::new(ChangeDispatcher::new(
      shared_catalog,
      JobDeduplicator::new(job_queue, config.queue_name.clone()),
    ));
    let listener: Arc<dyn EntityListener> = dispatcher.clone();
    catalog.register_listener(&listener);

    Ok(Self {
      config,
      catalog,
      queue,
      dispatcher,
    })
  }

  pub fn rebuilder(&self) -> Result<Rebuilder> {
    let http = HttpFetcher::new(self.config.fetch_timeout, &self.config.user_agent)
      .context("Failed to create HTTP client")?;
    let fetcher = DefaultFetcher::new(StorageFetcher::new(self.catalog.clone()), http);
    Ok(Rebuilder::new(self.catalog.clone(), Arc::new(fetcher)))
  }
}
