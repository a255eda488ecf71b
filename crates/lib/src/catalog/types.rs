//! Catalog records as seen by the bundler.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::consts::BUNDLE_MARKER_ATTR;

/// A dataset and its ordered resources.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
  pub id: String,
  /// URL-safe name (slug). Mutable, unlike `id`.
  pub name: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub title: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub notes: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub license_id: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub author: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub maintainer: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub version: Option<String>,
  #[serde(default)]
  pub tags: Vec<String>,
  #[serde(default)]
  pub extras: BTreeMap<String, String>,
  #[serde(default)]
  pub resources: Vec<Resource>,
  #[serde(default = "Utc::now")]
  pub metadata_modified: DateTime<Utc>,
}

impl Dataset {
  pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
    Self {
      id: id.into(),
      name: name.into(),
      title: None,
      notes: None,
      license_id: None,
      author: None,
      maintainer: None,
      version: None,
      tags: Vec::new(),
      extras: BTreeMap::new(),
      resources: Vec::new(),
      metadata_modified: Utc::now(),
    }
  }

  pub fn resource(&self, id: &str) -> Option<&Resource> {
    self.resources.iter().find(|r| r.id == id)
  }
}

/// Where a resource's bytes live.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResourceContent {
  /// Stored by the catalog itself.
  Upload { filename: String },
  /// Hosted elsewhere.
  Remote { url: String },
}

impl ResourceContent {
  /// The reference recorded in manifests: the upload filename or the remote URL.
  pub fn reference(&self) -> &str {
    match self {
      ResourceContent::Upload { filename } => filename,
      ResourceContent::Remote { url } => url,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
  /// Generated by the catalog when empty.
  #[serde(default)]
  pub id: String,
  /// Owning dataset. Filled in by the catalog when the resource is stored.
  #[serde(default)]
  pub dataset_id: String,
  pub name: String,
  #[serde(default)]
  pub format: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub description: Option<String>,
  pub content: ResourceContent,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub size: Option<u64>,
  /// Hex SHA-256 of the content, when the catalog knows it.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub hash: Option<String>,
  #[serde(default)]
  pub attributes: BTreeMap<String, String>,
}

impl Resource {
  pub fn attribute(&self, key: &str) -> Option<&str> {
    self.attributes.get(key).map(String::as_str)
  }

  /// True for the generated bundle resource.
  pub fn is_bundle(&self) -> bool {
    self.attributes.contains_key(BUNDLE_MARKER_ATTR)
  }
}

/// Bytes or a URL supplied when creating or replacing resource content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
  Upload { filename: String, bytes: Vec<u8> },
  Remote { url: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewResource {
  pub name: String,
  pub format: String,
  pub description: Option<String>,
  pub payload: Payload,
  pub attributes: BTreeMap<String, String>,
}

/// Partial update of a resource. `None` fields are left alone and `attributes`
/// are merged over the existing ones.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResourcePatch {
  pub name: Option<String>,
  pub format: Option<String>,
  pub payload: Option<Payload>,
  pub attributes: BTreeMap<String, String>,
}
