//! Turning catalog changes into rebuild requests.
//!
//! [`ChangeDispatcher`] is registered with the catalog as its
//! [`EntityListener`]. Every dataset create/update and every change to a real
//! resource requests a rebuild of the owning dataset. Changes to the bundle
//! resource itself are dropped, otherwise publishing a bundle would schedule
//! the next rebuild forever.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, error, warn};

use crate::catalog::{Catalog, CatalogError, Entity, EntityEvent, EntityListener, Operation};
use crate::dedup::{EnqueueOutcome, JobDeduplicator};

/// Job label for datastore reloads.
pub const DATA_LOADED_LABEL: &str = "datastore_create";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
  Deleted,
  BundleResource,
  /// The entity or its dataset no longer exists.
  Unresolved,
}

impl fmt::Display for IgnoreReason {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      IgnoreReason::Deleted => "deleted",
      IgnoreReason::BundleResource => "bundle resource",
      IgnoreReason::Unresolved => "unresolved",
    })
  }
}

/// What the dispatcher did with one notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
  Ignored(IgnoreReason),
  Enqueued(String),
  AlreadyQueued,
  /// The queue rejected the job.
  Failed(String),
}

pub struct ChangeDispatcher {
  catalog: Arc<dyn Catalog>,
  dedup: JobDeduplicator,
}

impl ChangeDispatcher {
  pub fn new(catalog: Arc<dyn Catalog>, dedup: JobDeduplicator) -> Self {
    Self { catalog, dedup }
  }

  pub fn on_entity_event(&self, event: &EntityEvent) -> DispatchOutcome {
    if event.operation == Operation::Deleted {
      debug!(entity = %event.entity.id(), "ignoring deletion");
      return DispatchOutcome::Ignored(IgnoreReason::Deleted);
    }

    let label = event.operation.as_str();
    match &event.entity {
      Entity::Dataset { id } => self.dispatch_dataset(id, label),
      Entity::Resource { id } => self.dispatch_resource(id, label),
    }
  }

  /// Tabular data for `resource_id` was (re)loaded into the datastore.
  pub fn on_data_loaded(&self, resource_id: &str) -> DispatchOutcome {
    self.dispatch_resource(resource_id, DATA_LOADED_LABEL)
  }

  fn dispatch_resource(&self, resource_id: &str, label: &str) -> DispatchOutcome {
    let resource = match self.catalog.get_resource(resource_id) {
      Ok(resource) => resource,
      Err(e) => return unresolved("resource", resource_id, &e),
    };

    if resource.is_bundle() {
      debug!(resource = %resource.id, "ignoring change to bundle resource");
      return DispatchOutcome::Ignored(IgnoreReason::BundleResource);
    }

    self.dispatch_dataset(&resource.dataset_id, label)
  }

  /// A dataset that exists or might exist gets a rebuild. Only a confirmed
  /// missing dataset drops the event; a read failure enqueues by id, with the
  /// id standing in for the name in the job title.
  fn dispatch_dataset(&self, dataset_id: &str, label: &str) -> DispatchOutcome {
    match self.catalog.get_dataset(dataset_id) {
      Ok(dataset) => self.enqueue(&dataset.id, &dataset.name, label),
      Err(e) if e.is_not_found() => unresolved("dataset", dataset_id, &e),
      Err(e) => {
        warn!(dataset = %dataset_id, error = %e, "could not read dataset, enqueueing by id");
        self.enqueue(dataset_id, dataset_id, label)
      }
    }
  }

  fn enqueue(&self, dataset_id: &str, name: &str, label: &str) -> DispatchOutcome {
    match self.dedup.enqueue_if_absent(dataset_id, name, label) {
      Ok(EnqueueOutcome::Queued(job)) => DispatchOutcome::Enqueued(job.id),
      Ok(EnqueueOutcome::AlreadyQueued { .. }) => DispatchOutcome::AlreadyQueued,
      Err(e) => {
        error!(dataset = %dataset_id, error = %e, "failed to enqueue rebuild");
        DispatchOutcome::Failed(e.to_string())
      }
    }
  }
}

impl EntityListener for ChangeDispatcher {
  fn on_entity_event(&self, event: &EntityEvent) {
    ChangeDispatcher::on_entity_event(self, event);
  }
}

fn unresolved(kind: &str, id: &str, err: &CatalogError) -> DispatchOutcome {
  if err.is_not_found() {
    debug!(kind, id, "entity gone before dispatch");
  } else {
    warn!(kind, id, error = %err, "could not resolve entity, dropping event");
  }
  DispatchOutcome::Ignored(IgnoreReason::Unresolved)
}
