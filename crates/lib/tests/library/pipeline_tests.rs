use std::sync::Arc;

use catbundle_lib::catalog::Catalog;
use catbundle_lib::consts::{BUNDLE_FINGERPRINT_ATTR, MANIFEST_FILENAME};
use catbundle_lib::extract::extract_bundle_resource;
use catbundle_lib::queue::{JobQueue, JobSource, JobState};
use catbundle_lib::rebuild::RebuildOptions;
use catbundle_lib::worker::{WorkerConfig, run_pending};

use super::common::{Pipeline, QUEUE};

fn worker_config() -> WorkerConfig {
  WorkerConfig {
    queue: QUEUE.to_string(),
    parallelism: 2,
    options: RebuildOptions::default(),
  }
}

async fn drain(pipeline: &Pipeline) -> catbundle_lib::worker::WorkerReport {
  let source: Arc<dyn JobSource> = pipeline.queue.clone();
  run_pending(source, pipeline.rebuilder.clone(), &worker_config())
    .await
    .unwrap()
}

#[tokio::test]
async fn edits_collapse_into_one_rebuild() {
  let pipeline = Pipeline::new();
  pipeline.add_dataset("ds1", "roads");
  pipeline.upload("ds1", "a", b"1\n");
  pipeline.upload("ds1", "b", b"2\n");

  assert_eq!(pipeline.pending(), 1);

  let report = drain(&pipeline).await;
  assert_eq!(report.jobs.len(), 1);
  assert_eq!(report.count(JobState::Published), 1);
  assert_eq!(pipeline.pending(), 0);
}

#[tokio::test]
async fn publishing_does_not_requeue() {
  let pipeline = Pipeline::new();
  pipeline.add_dataset("ds1", "roads");
  pipeline.upload("ds1", "a", b"1\n");

  drain(&pipeline).await;

  // Creating and then patching the bundle both notify the dispatcher.
  assert_eq!(pipeline.pending(), 0);
  let dataset = pipeline.catalog.get_dataset("ds1").unwrap();
  let (bundle, rest) = extract_bundle_resource(&dataset.resources);
  assert_eq!(rest.len(), 1);
  assert!(bundle.unwrap().attribute(BUNDLE_FINGERPRINT_ATTR).is_some());
}

#[tokio::test]
async fn unchanged_dataset_is_skipped() {
  let pipeline = Pipeline::new();
  pipeline.add_dataset("ds1", "roads");
  pipeline.upload("ds1", "a", b"1\n");
  drain(&pipeline).await;

  let dataset = pipeline.catalog.get_dataset("ds1").unwrap();
  pipeline.catalog.put_dataset(dataset).unwrap();
  assert_eq!(pipeline.pending(), 1);

  let report = drain(&pipeline).await;
  assert_eq!(report.count(JobState::Skipped), 1);
}

#[tokio::test]
async fn new_resource_triggers_republish() {
  let pipeline = Pipeline::new();
  pipeline.add_dataset("ds1", "roads");
  pipeline.upload("ds1", "a", b"1\n");
  drain(&pipeline).await;
  let before = pipeline.catalog.get_dataset("ds1").unwrap();
  let (first, _) = extract_bundle_resource(&before.resources);
  let first = first.unwrap().clone();

  pipeline.upload("ds1", "b", b"2\n");
  let report = drain(&pipeline).await;
  assert_eq!(report.count(JobState::Published), 1);

  let after = pipeline.catalog.get_dataset("ds1").unwrap();
  let (second, rest) = extract_bundle_resource(&after.resources);
  let second = second.unwrap();
  assert_eq!(rest.len(), 2);
  assert_eq!(second.id, first.id);
  assert_ne!(
    second.attribute(BUNDLE_FINGERPRINT_ATTR),
    first.attribute(BUNDLE_FINGERPRINT_ATTR)
  );
}

#[tokio::test]
async fn datasets_rebuild_independently() {
  let pipeline = Pipeline::new();
  pipeline.add_dataset("ds1", "roads");
  pipeline.add_dataset("ds2", "rail");
  pipeline.upload("ds1", "a", b"1\n");
  pipeline.upload("ds2", "b", b"2\n");

  assert_eq!(pipeline.pending(), 2);
  let report = drain(&pipeline).await;
  assert_eq!(report.count(JobState::Published), 2);

  let mut ids: Vec<_> = report.jobs.iter().filter_map(|j| j.dataset_id.clone()).collect();
  ids.sort();
  assert_eq!(ids, vec!["ds1", "ds2"]);
}

#[tokio::test]
async fn deleted_resource_leaves_the_bundle() {
  let pipeline = Pipeline::new();
  pipeline.add_dataset("ds1", "roads");
  let keep = pipeline.upload("ds1", "a", b"1\n");
  let gone = pipeline.upload("ds1", "b", b"2\n");
  drain(&pipeline).await;

  pipeline.catalog.delete_resource(&gone).unwrap();
  assert_eq!(pipeline.pending(), 1);

  let report = drain(&pipeline).await;
  assert_eq!(report.count(JobState::Published), 1);

  let dataset = pipeline.catalog.get_dataset("ds1").unwrap();
  let (bundle, _) = extract_bundle_resource(&dataset.resources);
  let path = pipeline.catalog.upload_path(bundle.unwrap()).unwrap();
  let mut archive = zip::ZipArchive::new(std::fs::File::open(path).unwrap()).unwrap();
  let manifest: serde_json::Value =
    serde_json::from_reader(archive.by_name(MANIFEST_FILENAME).unwrap()).unwrap();
  let ids: Vec<_> = manifest["resources"]
    .as_array()
    .unwrap()
    .iter()
    .map(|r| r["id"].as_str().unwrap().to_string())
    .collect();
  assert_eq!(ids, vec![keep]);
  assert!(archive.by_name("b.csv").is_err());
}

#[test]
fn data_loaded_on_real_resource_enqueues() {
  let pipeline = Pipeline::new();
  pipeline.add_dataset("ds1", "roads");
  let id = pipeline.upload("ds1", "a", b"1\n");
  let job = pipeline.queue.list_pending(QUEUE).unwrap().remove(0);
  pipeline.queue.claim_next(QUEUE).unwrap();
  pipeline.queue.finish(&job, JobState::Published).unwrap();

  let outcome = pipeline.dispatcher.on_data_loaded(&id);
  assert!(matches!(outcome, catbundle_lib::dispatch::DispatchOutcome::Enqueued(_)));
  let pending = pipeline.queue.list_pending(QUEUE).unwrap();
  assert_eq!(pending[0].operation.as_deref(), Some("datastore_create"));
}
