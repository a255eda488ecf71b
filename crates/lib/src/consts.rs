//! Shared names and reserved attribute keys.

pub const APP_NAME: &str = "catbundle";

/// Marker attribute present only on the generated bundle resource. Its value is
/// the dataset's `metadata_modified` at the time the bundle was published.
pub const BUNDLE_MARKER_ATTR: &str = "bundle_generated_at";

/// Attribute holding the fingerprint of the manifest packaged in the bundle.
pub const BUNDLE_FINGERPRINT_ATTR: &str = "bundle_manifest_hash";

pub const BUNDLE_RESOURCE_NAME: &str = "All resource data";

pub const BUNDLE_FORMAT: &str = "ZIP";

/// Name of the manifest file inside the bundle.
pub const MANIFEST_FILENAME: &str = "datapackage.json";

pub const DEFAULT_QUEUE: &str = "default";

/// Leading word of rebuild job titles: `Bundle <label> "<name>" <id>`.
pub const JOB_TITLE_PREFIX: &str = "Bundle";

pub const DEFAULT_PARALLELISM: usize = 4;
