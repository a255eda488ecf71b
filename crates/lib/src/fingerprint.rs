//! Manifest fingerprints and change detection.
//!
//! A fingerprint is the full SHA-256 of a manifest's canonical JSON. The value
//! recorded on the published bundle is compared with a freshly computed one to
//! decide whether a rebuild would change anything.
//!
//! Only manifest content is covered. If a remote resource's bytes change while
//! its URL, size and hash attributes stay the same, the fingerprint does not
//! change and the bundle keeps the old bytes until some other change lands.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::catalog::Resource;
use crate::consts::BUNDLE_FINGERPRINT_ATTR;
use crate::manifest::Manifest;
use crate::util::hash::hash_bytes;

pub type FingerprintError = serde_json::Error;

/// Lowercase hex SHA-256 of a canonical manifest.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fingerprint(pub String);

impl fmt::Display for Fingerprint {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.0)
  }
}

pub trait Fingerprintable: Serialize {
  fn fingerprint(&self) -> Result<Fingerprint, FingerprintError> {
    let serialized = serde_json::to_vec(self)?;
    Ok(Fingerprint(hash_bytes(&serialized).0))
  }
}

impl Fingerprintable for Manifest {}

/// The fingerprint recorded on a published bundle.
pub fn stored_fingerprint(bundle: &Resource) -> Option<Fingerprint> {
  bundle
    .attribute(BUNDLE_FINGERPRINT_ATTR)
    .filter(|value| !value.is_empty())
    .map(|value| Fingerprint(value.to_string()))
}

/// True unless `existing_bundle` records exactly `fingerprint`.
pub fn differs_from_bundle(fingerprint: &Fingerprint, existing_bundle: Option<&Resource>) -> bool {
  let Some(bundle) = existing_bundle else {
    debug!("no bundle yet");
    return true;
  };

  match stored_fingerprint(bundle) {
    Some(stored) if stored == *fingerprint => false,
    Some(stored) => {
      debug!(stored = %stored, computed = %fingerprint, "manifest fingerprint changed");
      true
    }
    None => {
      debug!(bundle = %bundle.id, "bundle has no recorded fingerprint");
      true
    }
  }
}

/// Whether `new_manifest` warrants rebuilding `existing_bundle`.
pub fn has_changed_significantly(
  new_manifest: &Manifest,
  existing_bundle: Option<&Resource>,
) -> Result<bool, FingerprintError> {
  let fingerprint = new_manifest.fingerprint()?;
  Ok(differs_from_bundle(&fingerprint, existing_bundle))
}
