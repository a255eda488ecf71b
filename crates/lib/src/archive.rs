//! Assembling the bundle ZIP.
//!
//! The archive holds one entry per non-bundle resource, at the path recorded in
//! its manifest descriptor, plus `datapackage.json`. A resource whose bytes
//! cannot be retrieved is marked with `fetch_error` in the packaged manifest and
//! the rest are packaged anyway.

use std::io::{self, Cursor, Write};
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info, warn};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::catalog::Catalog;
use crate::consts::MANIFEST_FILENAME;
use crate::fetch::{ContentFetcher, FetchError};
use crate::fingerprint::{Fingerprint, FingerprintError, Fingerprintable};
use crate::manifest::{BuiltManifest, Manifest, ManifestBuilder, ManifestError, ResourceDescriptor};

#[derive(Debug, Error)]
pub enum ArchiveError {
  #[error(transparent)]
  Manifest(#[from] ManifestError),

  #[error("failed to serialize manifest: {0}")]
  Serialize(#[source] FingerprintError),

  #[error("failed to write archive: {0}")]
  Zip(#[from] zip::result::ZipError),

  #[error("failed to write archive entry: {0}")]
  Io(#[from] io::Error),
}

/// A finished bundle, ready to publish.
#[derive(Debug, Clone)]
pub struct AssembledBundle {
  /// The manifest as packaged, including any `fetch_error` annotations.
  pub manifest: Manifest,
  pub archive: Vec<u8>,
  /// Fingerprint of the canonical manifest, before annotations.
  pub fingerprint: Fingerprint,
}

impl AssembledBundle {
  pub fn failures(&self) -> Vec<&ResourceDescriptor> {
    self.manifest.failed_resources().collect()
  }
}

pub struct ArchiveAssembler {
  builder: ManifestBuilder,
  fetcher: Arc<dyn ContentFetcher>,
}

impl ArchiveAssembler {
  pub fn new(catalog: Arc<dyn Catalog>, fetcher: Arc<dyn ContentFetcher>) -> Self {
    Self {
      builder: ManifestBuilder::new(catalog),
      fetcher,
    }
  }

  /// Build the manifest for `dataset_id` and package the dataset.
  pub fn assemble(&self, dataset_id: &str) -> Result<AssembledBundle, ArchiveError> {
    let built = self.builder.build_with_state(dataset_id)?;
    self.assemble_manifest(&built)
  }

  /// Package a dataset whose manifest has already been built.
  pub fn assemble_manifest(&self, built: &BuiltManifest) -> Result<AssembledBundle, ArchiveError> {
    let fingerprint = built.manifest.fingerprint().map_err(ArchiveError::Serialize)?;
    let mut manifest = built.manifest.clone();

    let base_options = SimpleFileOptions::default()
      .compression_method(CompressionMethod::Deflated)
      .last_modified_time(zip::DateTime::default());
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));

    for descriptor in &mut manifest.resources {
      let fetched = match built.dataset.resource(&descriptor.id) {
        Some(resource) => self.fetcher.fetch(resource),
        None => Err(FetchError::Unsupported(descriptor.id.clone())),
      };

      match fetched {
        Ok(bytes) => {
          let options = base_options.large_file(bytes.len() as u64 >= u32::MAX as u64);
          writer.start_file(descriptor.path.as_str(), options)?;
          writer.write_all(&bytes)?;
          debug!(dataset = %manifest.id, path = %descriptor.path, size = bytes.len(), "packaged resource");
        }
        Err(e) => {
          warn!(
            dataset = %manifest.id,
            resource = %descriptor.id,
            error = %e,
            "could not retrieve resource, packaging without it"
          );
          descriptor.fetch_error = Some(e.to_string());
        }
      }
    }

    writer.start_file(MANIFEST_FILENAME, base_options)?;
    writer.write_all(&manifest.to_pretty_json().map_err(ArchiveError::Serialize)?)?;
    let archive = writer.finish()?.into_inner();

    info!(
      dataset = %manifest.id,
      resources = manifest.resources.len(),
      failed = manifest.failed_resources().count(),
      size = archive.len(),
      "assembled bundle"
    );

    Ok(AssembledBundle {
      manifest,
      archive,
      fingerprint,
    })
  }
}
