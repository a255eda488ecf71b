//! catbundle-lib: bundle maintenance for data catalog datasets
//!
//! Every dataset in a catalog gets one generated "bundle" resource: a ZIP holding
//! all of the dataset's other resources plus a `datapackage.json` manifest. This
//! crate provides the pieces that keep that bundle current:
//! - `dispatch`: turns catalog change events into rebuild requests
//! - `dedup`: keeps at most one pending rebuild job per dataset
//! - `manifest` / `fingerprint`: canonical manifest and change detection
//! - `archive` / `publish`: assembling the ZIP and upserting the bundle resource
//! - `rebuild` / `worker`: the job entrypoint and the pool that runs it

pub mod archive;
pub mod catalog;
pub mod config;
pub mod consts;
pub mod dedup;
pub mod dispatch;
pub mod extract;
pub mod fetch;
pub mod fingerprint;
pub mod manifest;
pub mod paths;
pub mod publish;
pub mod queue;
pub mod rebuild;
pub mod util;
pub mod worker;
