//! Retrieving resource bytes.
//!
//! [`ContentFetcher`] is the seam the archive assembler uses. [`HttpFetcher`]
//! downloads remote resources, [`StorageFetcher`] reads uploads out of a
//! [`FileCatalog`], and [`DefaultFetcher`] routes between them.

use std::fs;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, info};

use crate::catalog::{FileCatalog, Resource, ResourceContent};

#[derive(Debug, Error)]
pub enum FetchError {
  #[error("request to {url} failed: {source}")]
  Http {
    url: String,
    #[source]
    source: reqwest::Error,
  },

  #[error("{url} returned HTTP {status}")]
  Status { url: String, status: u16 },

  #[error("failed to build HTTP client: {0}")]
  Client(#[source] reqwest::Error),

  #[error("uploaded content missing at {0}")]
  MissingUpload(PathBuf),

  #[error("failed to read {path}: {source}")]
  Read {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("resource {0} has no fetchable content")]
  Unsupported(String),
}

/// Source of a resource's byte content.
pub trait ContentFetcher: Send + Sync {
  fn fetch(&self, resource: &Resource) -> Result<Vec<u8>, FetchError>;
}

/// Downloads `Remote` resources over HTTP(S).
pub struct HttpFetcher {
  client: reqwest::blocking::Client,
}

impl HttpFetcher {
  pub fn new(timeout: Duration, user_agent: &str) -> Result<Self, FetchError> {
    let client = reqwest::blocking::Client::builder()
      .timeout(timeout)
      .user_agent(user_agent)
      .build()
      .map_err(FetchError::Client)?;
    Ok(Self { client })
  }

  fn get(&self, url: &str) -> Result<Vec<u8>, FetchError> {
    info!(url, "fetching resource");

    let response = self.client.get(url).send().map_err(|e| FetchError::Http {
      url: url.to_string(),
      source: e,
    })?;

    if !response.status().is_success() {
      return Err(FetchError::Status {
        url: url.to_string(),
        status: response.status().as_u16(),
      });
    }

    let bytes = response.bytes().map_err(|e| FetchError::Http {
      url: url.to_string(),
      source: e,
    })?;

    debug!(url, size = bytes.len(), "download complete");
    Ok(bytes.to_vec())
  }
}

impl ContentFetcher for HttpFetcher {
  fn fetch(&self, resource: &Resource) -> Result<Vec<u8>, FetchError> {
    match &resource.content {
      ResourceContent::Remote { url } => self.get(url),
      ResourceContent::Upload { .. } => Err(FetchError::Unsupported(resource.id.clone())),
    }
  }
}

/// Reads `Upload` resources from the catalog's storage directory.
pub struct StorageFetcher {
  catalog: Arc<FileCatalog>,
}

impl StorageFetcher {
  pub fn new(catalog: Arc<FileCatalog>) -> Self {
    Self { catalog }
  }
}

impl ContentFetcher for StorageFetcher {
  fn fetch(&self, resource: &Resource) -> Result<Vec<u8>, FetchError> {
    let path = self
      .catalog
      .upload_path(resource)
      .ok_or_else(|| FetchError::Unsupported(resource.id.clone()))?;

    fs::read(&path).map_err(|e| {
      if e.kind() == io::ErrorKind::NotFound {
        FetchError::MissingUpload(path.clone())
      } else {
        FetchError::Read { path: path.clone(), source: e }
      }
    })
  }
}

/// Uploads from storage, everything else over HTTP.
pub struct DefaultFetcher {
  storage: StorageFetcher,
  http: HttpFetcher,
}

impl DefaultFetcher {
  pub fn new(storage: StorageFetcher, http: HttpFetcher) -> Self {
    Self { storage, http }
  }
}

impl ContentFetcher for DefaultFetcher {
  fn fetch(&self, resource: &Resource) -> Result<Vec<u8>, FetchError> {
    match resource.content {
      ResourceContent::Upload { .. } => self.storage.fetch(resource),
      ResourceContent::Remote { .. } => self.http.fetch(resource),
    }
  }
}
