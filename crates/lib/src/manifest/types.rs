//! Manifest types.
//!
//! # Format
//!
//! ```json
//! {
//!   "profile": "data-package",
//!   "id": "ds1",
//!   "name": "roads",
//!   "title": "Road network",
//!   "keywords": ["transport"],
//!   "extras": {},
//!   "resources": [
//!     {
//!       "id": "0190...",
//!       "name": "Roads 2024",
//!       "path": "roads_2024.csv",
//!       "format": "CSV",
//!       "source": "https://example.com/roads.csv",
//!       "attributes": {}
//!     }
//!   ]
//! }
//! ```
//!
//! Struct fields serialize in declaration order and maps are [`BTreeMap`]s,
//! which keeps the serialization canonical without a separate normalizer.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::catalog::{Dataset, Resource};
use crate::consts::MANIFEST_FILENAME;
use crate::extract::extract_bundle_resource;

pub const MANIFEST_PROFILE: &str = "data-package";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
  pub profile: String,
  pub id: String,
  pub name: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub title: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub description: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub license: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub author: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub maintainer: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub version: Option<String>,
  #[serde(default)]
  pub keywords: Vec<String>,
  #[serde(default)]
  pub extras: BTreeMap<String, String>,
  pub resources: Vec<ResourceDescriptor>,
}

/// One resource entry in the manifest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceDescriptor {
  pub id: String,
  pub name: String,
  /// Location of the payload inside the bundle.
  pub path: String,
  pub format: String,
  /// Upload filename or remote URL.
  pub source: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub description: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub size: Option<u64>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub hash: Option<String>,
  #[serde(default)]
  pub attributes: BTreeMap<String, String>,
  /// Set only in the packaged copy, when the payload could not be retrieved.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub fetch_error: Option<String>,
}

impl Manifest {
  /// Describe `dataset` as it is now. The bundle resource is left out and the
  /// remaining resources keep the dataset's order.
  pub fn from_dataset(dataset: &Dataset) -> Self {
    let (_, resources) = extract_bundle_resource(&dataset.resources);

    let mut taken = HashSet::from([MANIFEST_FILENAME.to_string()]);
    let resources = resources
      .into_iter()
      .map(|res| ResourceDescriptor::new(res, &mut taken))
      .collect();

    Self {
      profile: MANIFEST_PROFILE.to_string(),
      id: dataset.id.clone(),
      name: dataset.name.clone(),
      title: dataset.title.clone(),
      description: dataset.notes.clone(),
      license: dataset.license_id.clone(),
      author: dataset.author.clone(),
      maintainer: dataset.maintainer.clone(),
      version: dataset.version.clone(),
      keywords: dataset.tags.clone(),
      extras: dataset.extras.clone(),
      resources,
    }
  }

  /// Compact canonical JSON, the input to the fingerprint.
  pub fn to_canonical_json(&self) -> Result<Vec<u8>, serde_json::Error> {
    serde_json::to_vec(self)
  }

  /// Indented JSON, as written into the bundle.
  pub fn to_pretty_json(&self) -> Result<Vec<u8>, serde_json::Error> {
    serde_json::to_vec_pretty(self)
  }

  /// Descriptors whose payload could not be packaged.
  pub fn failed_resources(&self) -> impl Iterator<Item = &ResourceDescriptor> {
    self.resources.iter().filter(|r| r.fetch_error.is_some())
  }
}

impl ResourceDescriptor {
  fn new(resource: &Resource, taken: &mut HashSet<String>) -> Self {
    Self {
      id: resource.id.clone(),
      name: resource.name.clone(),
      path: archive_path(&resource.name, &resource.format, taken),
      format: resource.format.clone(),
      source: resource.content.reference().to_string(),
      description: resource.description.clone(),
      size: resource.size,
      hash: resource.hash.clone(),
      attributes: resource.attributes.clone(),
      fetch_error: None,
    }
  }
}

/// File name for a resource inside the bundle: the sanitized resource name
/// plus an extension from its format, suffixed `-1`, `-2`, ... on collision.
fn archive_path(name: &str, format: &str, taken: &mut HashSet<String>) -> String {
  let mut stem: String = name
    .trim()
    .chars()
    .map(|c| {
      if c.is_alphanumeric() || c == '-' || c == '_' || c == '.' {
        c
      } else {
        '_'
      }
    })
    .collect();
  stem = stem.trim_matches('.').to_string();
  if stem.is_empty() {
    stem = "resource".to_string();
  }

  let ext = format.trim().to_lowercase();
  let ext = if ext.is_empty() || !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
    String::new()
  } else {
    format!(".{}", ext)
  };
  // Drop an extension the name already carries, compared without lowercasing
  // the name, whose byte length may change.
  if let Some(cut) = stem.len().checked_sub(ext.len()).filter(|&cut| stem.is_char_boundary(cut))
    && !ext.is_empty()
    && stem[cut..].eq_ignore_ascii_case(&ext)
  {
    stem.truncate(cut);
  }

  let mut candidate = format!("{}{}", stem, ext);
  let mut n = 1;
  while taken.contains(&candidate) {
    candidate = format!("{}-{}{}", stem, n, ext);
    n += 1;
  }
  taken.insert(candidate.clone());
  candidate
}
