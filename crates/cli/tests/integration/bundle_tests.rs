use predicates::prelude::*;

use super::common::TestEnv;

fn add_upload(env: &TestEnv, name: &str, content: &str) {
  let path = env.write_file(&format!("files/{}.csv", name), content);
  env
    .cmd()
    .args(["add-resource", "ds1", "--name", name, "--format", "CSV", "--file"])
    .arg(path)
    .assert()
    .success();
}

#[test]
fn rebuild_publishes_then_skips() {
  let env = TestEnv::with_datasets(&["roads.json"]);
  add_upload(&env, "a", "x,y\n1,2\n");
  add_upload(&env, "b", "x,y\n3,4\n");

  env
    .cmd()
    .args(["rebuild", "ds1"])
    .assert()
    .success()
    .stdout(predicate::str::contains("Created bundle for ds1"));

  env
    .cmd()
    .args(["rebuild", "ds1"])
    .assert()
    .success()
    .stdout(predicate::str::contains("up to date"));
}

#[test]
fn forced_rebuild_updates_in_place() {
  let env = TestEnv::with_datasets(&["roads.json"]);
  add_upload(&env, "a", "1\n");

  let first = env.json(&["rebuild", "ds1"]);
  let second = env.json(&["rebuild", "ds1", "--force"]);

  assert_eq!(first["state"], "published");
  assert_eq!(second["state"], "published");
  assert_eq!(second["created"], false);
  assert_eq!(first["resource_id"], second["resource_id"]);
  assert_eq!(first["fingerprint"], second["fingerprint"]);
}

#[test]
fn adding_resource_changes_fingerprint() {
  let env = TestEnv::with_datasets(&["roads.json"]);
  add_upload(&env, "a", "1\n");
  add_upload(&env, "b", "2\n");

  let first = env.json(&["rebuild", "ds1"]);
  add_upload(&env, "c", "3\n");
  let status = env.json(&["status", "ds1"]);
  assert_eq!(status["up_to_date"], false);

  let second = env.json(&["rebuild", "ds1"]);
  assert_eq!(second["state"], "published");
  assert_ne!(first["fingerprint"], second["fingerprint"]);

  let manifest = env.json(&["manifest", "ds1"]);
  let names: Vec<_> = manifest["resources"]
    .as_array()
    .unwrap()
    .iter()
    .map(|r| r["path"].as_str().unwrap().to_string())
    .collect();
  assert_eq!(names, vec!["a.csv", "b.csv", "c.csv"]);
}

#[test]
fn status_reports_bundle_and_formats() {
  let env = TestEnv::with_datasets(&["roads.json"]);
  add_upload(&env, "a", "1\n");

  let before = env.json(&["status", "ds1"]);
  assert!(before["bundle"].is_null());
  assert_eq!(before["up_to_date"], false);

  env.cmd().args(["rebuild", "ds1"]).assert().success();

  let after = env.json(&["status", "roads"]);
  assert_eq!(after["up_to_date"], true);
  assert_eq!(after["formats"], serde_json::json!(["CSV"]));
  assert_eq!(after["resources"], 1);
  assert_eq!(after["bundle"]["fingerprint"], after["fingerprint"]);
}

#[test]
fn unreachable_resource_is_reported_but_published() {
  let env = TestEnv::with_datasets(&["rail.json"]);

  let outcome = env.json(&["rebuild", "ds2"]);

  assert_eq!(outcome["state"], "published");
  assert_eq!(outcome["failed_entries"].as_array().unwrap().len(), 1);
}

#[test]
fn rebuild_unknown_dataset_fails() {
  let env = TestEnv::empty();
  env
    .cmd()
    .args(["rebuild", "nope"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("dataset not found"));
}

#[test]
fn manifest_never_lists_bundle() {
  let env = TestEnv::with_datasets(&["roads.json"]);
  add_upload(&env, "a", "1\n");
  env.cmd().args(["rebuild", "ds1"]).assert().success();

  env
    .cmd()
    .args(["manifest", "ds1"])
    .assert()
    .success()
    .stdout(predicate::str::contains("\"profile\": \"data-package\""))
    .stdout(predicate::str::contains("All resource data").not());
}
