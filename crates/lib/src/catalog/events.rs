//! Change notifications raised by the catalog.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The kind of change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
  Created,
  Changed,
  Deleted,
}

impl Operation {
  pub fn as_str(self) -> &'static str {
    match self {
      Operation::Created => "created",
      Operation::Changed => "changed",
      Operation::Deleted => "deleted",
    }
  }
}

impl fmt::Display for Operation {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// What changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Entity {
  Dataset { id: String },
  Resource { id: String },
}

impl Entity {
  pub fn id(&self) -> &str {
    match self {
      Entity::Dataset { id } | Entity::Resource { id } => id,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityEvent {
  pub entity: Entity,
  pub operation: Operation,
}

impl EntityEvent {
  pub fn dataset(id: impl Into<String>, operation: Operation) -> Self {
    Self {
      entity: Entity::Dataset { id: id.into() },
      operation,
    }
  }

  pub fn resource(id: impl Into<String>, operation: Operation) -> Self {
    Self {
      entity: Entity::Resource { id: id.into() },
      operation,
    }
  }
}

/// Callback registered with a catalog to observe changes.
///
/// Called after the change is durable. Implementations must not panic and
/// must not fail the write that raised the event.
pub trait EntityListener: Send + Sync {
  fn on_entity_event(&self, event: &EntityEvent);
}
