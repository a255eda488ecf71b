//! Canonical dataset manifest.
//!
//! The manifest (`datapackage.json` inside the bundle) describes the dataset's
//! metadata and every resource except the bundle itself. Its canonical JSON
//! form is what the fingerprint is computed over, so building it twice from
//! unchanged catalog state must produce identical bytes.

mod builder;
mod types;

pub use builder::{BuiltManifest, ManifestBuilder, ManifestError};
pub use types::{MANIFEST_PROFILE, Manifest, ResourceDescriptor};
