use predicates::prelude::*;

use super::common::TestEnv;

fn pending(env: &TestEnv) -> Vec<serde_json::Value> {
  env.json(&["jobs"])["pending"].as_array().unwrap().clone()
}

#[test]
fn import_queues_one_rebuild() {
  let env = TestEnv::empty();

  env
    .cmd()
    .arg("import")
    .arg(super::common::fixture_path("roads.json"))
    .assert()
    .success()
    .stdout(predicate::str::contains("Stored dataset ds1"));

  let jobs = pending(&env);
  assert_eq!(jobs.len(), 1);
  assert_eq!(jobs[0]["dataset_id"], "ds1");
  assert_eq!(jobs[0]["title"], "Bundle created \"roads\" ds1");
  assert_eq!(jobs[0]["state"], "queued");
}

#[test]
fn further_changes_do_not_queue_duplicates() {
  let env = TestEnv::with_datasets(&["roads.json"]);
  let file = env.write_file("a.csv", "1\n");

  env
    .cmd()
    .args(["add-resource", "ds1", "--name", "a", "--file"])
    .arg(file)
    .assert()
    .success();
  env
    .cmd()
    .args(["notify", "dataset", "ds1"])
    .assert()
    .success()
    .stdout(predicate::str::contains("already queued"));

  assert_eq!(pending(&env).len(), 1);
}

#[test]
fn bundle_events_are_ignored() {
  let env = TestEnv::with_datasets(&["roads.json"]);
  env.cmd().arg("work").assert().success();
  assert!(pending(&env).is_empty());

  let status = env.json(&["status", "ds1"]);
  let bundle_id = status["bundle"]["id"].as_str().unwrap().to_string();

  let outcome = env.json(&["notify", "resource", &bundle_id]);
  assert_eq!(outcome["outcome"], "ignored");
  assert_eq!(outcome["reason"], "bundle resource");

  let outcome = env.json(&["data-loaded", &bundle_id]);
  assert_eq!(outcome["outcome"], "ignored");

  assert!(pending(&env).is_empty());
}

#[test]
fn deletions_are_ignored() {
  let env = TestEnv::with_datasets(&["roads.json"]);
  env.cmd().arg("work").assert().success();

  let outcome = env.json(&["notify", "dataset", "ds1", "--operation", "deleted"]);
  assert_eq!(outcome["reason"], "deleted");
  assert!(pending(&env).is_empty());
}

#[test]
fn data_loaded_queues_with_datastore_label() {
  let env = TestEnv::with_datasets(&["rail.json"]);
  env.cmd().arg("work").assert().success();

  let manifest = env.json(&["manifest", "ds2"]);
  let resource_id = manifest["resources"][0]["id"].as_str().unwrap().to_string();

  let outcome = env.json(&["data-loaded", &resource_id]);
  assert_eq!(outcome["outcome"], "enqueued");

  let jobs = pending(&env);
  assert_eq!(jobs.len(), 1);
  assert_eq!(jobs[0]["operation"], "datastore_create");
}

#[test]
fn unknown_entities_are_dropped() {
  let env = TestEnv::empty();

  let outcome = env.json(&["notify", "resource", "missing"]);
  assert_eq!(outcome["reason"], "unresolved");
  let outcome = env.json(&["data-loaded", "missing"]);
  assert_eq!(outcome["reason"], "unresolved");
}
