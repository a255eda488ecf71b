//! The rebuild job: build, compare, assemble, publish.
//!
//! ```text
//! build manifest ──> fingerprint ──> unchanged? ──yes──> Skipped
//!                                        │
//!                                        no
//!                                        v
//!                             assemble ZIP ──> publish ──> Published
//! ```
//!
//! A rebuild holds no locks and is idempotent: running it twice for the same
//! catalog state publishes once and skips once.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info};

use crate::archive::{ArchiveAssembler, ArchiveError};
use crate::catalog::Catalog;
use crate::fetch::ContentFetcher;
use crate::fingerprint::{Fingerprint, FingerprintError, Fingerprintable, differs_from_bundle};
use crate::manifest::{ManifestBuilder, ManifestError};
use crate::publish::{ArchivePublisher, PublishError};
use crate::queue::JobState;

#[derive(Debug, Error)]
pub enum RebuildError {
  #[error("dataset not found: {0}")]
  NotFound(String),

  #[error(transparent)]
  Manifest(ManifestError),

  #[error("failed to fingerprint manifest: {0}")]
  Fingerprint(#[source] FingerprintError),

  #[error(transparent)]
  Archive(#[from] ArchiveError),

  #[error(transparent)]
  Publish(#[from] PublishError),
}

impl From<ManifestError> for RebuildError {
  fn from(err: ManifestError) -> Self {
    match err {
      ManifestError::DatasetNotFound(id) => RebuildError::NotFound(id),
      other => RebuildError::Manifest(other),
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RebuildOptions {
  /// Skip assembling and publishing when the manifest fingerprint matches the
  /// published bundle.
  pub skip_if_unchanged: bool,
}

impl Default for RebuildOptions {
  fn default() -> Self {
    Self { skip_if_unchanged: true }
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RebuildOutcome {
  Skipped {
    fingerprint: Fingerprint,
  },
  Published {
    resource_id: String,
    fingerprint: Fingerprint,
    created: bool,
    /// Ids of resources whose bytes could not be packaged.
    failed_entries: Vec<String>,
  },
}

impl RebuildOutcome {
  pub fn state(&self) -> JobState {
    match self {
      RebuildOutcome::Skipped { .. } => JobState::Skipped,
      RebuildOutcome::Published { .. } => JobState::Published,
    }
  }

  pub fn fingerprint(&self) -> &Fingerprint {
    match self {
      RebuildOutcome::Skipped { fingerprint } | RebuildOutcome::Published { fingerprint, .. } => fingerprint,
    }
  }
}

pub struct Rebuilder {
  builder: ManifestBuilder,
  assembler: ArchiveAssembler,
  publisher: ArchivePublisher,
}

impl Rebuilder {
  pub fn new(catalog: Arc<dyn Catalog>, fetcher: Arc<dyn ContentFetcher>) -> Self {
    Self {
      builder: ManifestBuilder::new(catalog.clone()),
      assembler: ArchiveAssembler::new(catalog.clone(), fetcher),
      publisher: ArchivePublisher::new(catalog),
    }
  }

  pub fn rebuild(&self, dataset_id: &str, options: RebuildOptions) -> Result<RebuildOutcome, RebuildError> {
    let built = self.builder.build_with_state(dataset_id)?;
    let fingerprint = built.manifest.fingerprint().map_err(RebuildError::Fingerprint)?;

    if options.skip_if_unchanged && !differs_from_bundle(&fingerprint, built.bundle.as_ref()) {
      info!(dataset = %built.dataset.id, %fingerprint, "bundle is current, skipping");
      return Ok(RebuildOutcome::Skipped { fingerprint });
    }

    debug!(dataset = %built.dataset.id, %fingerprint, "rebuilding bundle");
    let bundle = self.assembler.assemble_manifest(&built)?;
    let failed_entries = bundle.failures().iter().map(|d| d.id.clone()).collect();

    let published = self.publisher.publish(
      &built.dataset,
      bundle.archive,
      &bundle.fingerprint,
      built.bundle.as_ref(),
    )?;

    Ok(RebuildOutcome::Published {
      resource_id: published.resource.id,
      fingerprint: bundle.fingerprint,
      created: published.created,
      failed_entries,
    })
  }
}
