use predicates::prelude::*;

use super::common::TestEnv;

#[test]
fn work_on_empty_queue() {
  let env = TestEnv::empty();
  env
    .cmd()
    .arg("work")
    .assert()
    .success()
    .stdout(predicate::str::contains("No pending jobs"));
}

#[test]
fn work_drains_queue() {
  let env = TestEnv::with_datasets(&["roads.json", "rail.json"]);

  let report = env.json(&["work", "--parallelism", "2"]);
  let jobs = report["jobs"].as_array().unwrap();
  assert_eq!(jobs.len(), 2);
  assert!(jobs.iter().all(|j| j["state"] == "published"));

  let queue = env.json(&["jobs"]);
  assert!(queue["pending"].as_array().unwrap().is_empty());
  assert!(queue["running"].as_array().unwrap().is_empty());
}

#[test]
fn requeued_unchanged_dataset_is_skipped() {
  let env = TestEnv::with_datasets(&["roads.json"]);
  env.cmd().arg("work").assert().success();

  env.cmd().args(["notify", "dataset", "ds1"]).assert().success();
  env
    .cmd()
    .arg("work")
    .assert()
    .success()
    .stdout(predicate::str::contains("ds1 unchanged"));
}

#[test]
fn recover_requeues_interrupted_jobs() {
  let env = TestEnv::with_datasets(&["roads.json"]);

  // Simulate a worker that claimed the job and died.
  let queue_dir = env.queue_path().join("default");
  let pending = std::fs::read_dir(queue_dir.join("pending"))
    .unwrap()
    .next()
    .unwrap()
    .unwrap()
    .path();
  std::fs::create_dir_all(queue_dir.join("running")).unwrap();
  std::fs::rename(&pending, queue_dir.join("running").join(pending.file_name().unwrap())).unwrap();

  env
    .cmd()
    .arg("work")
    .assert()
    .success()
    .stdout(predicate::str::contains("No pending jobs"));

  let queue = env.json(&["jobs"]);
  assert_eq!(queue["running"][0]["state"], "running");
  env
    .cmd()
    .arg("jobs")
    .assert()
    .success()
    .stdout(predicate::str::contains("running"));

  env
    .cmd()
    .args(["work", "--recover"])
    .assert()
    .success()
    .stdout(predicate::str::contains("Requeued 1 interrupted job(s)"))
    .stdout(predicate::str::contains("ds1 published"));
}

#[test]
fn failed_job_fails_the_command() {
  let env = TestEnv::with_datasets(&["roads.json"]);
  std::fs::remove_file(env.catalog_path().join("datasets").join("ds1.json")).unwrap();

  env
    .cmd()
    .arg("work")
    .assert()
    .failure()
    .stderr(predicate::str::contains("1 job(s) failed"));
}

#[test]
fn queue_name_comes_from_config_file() {
  let env = TestEnv::empty();
  let config = env.write_file("custom.toml", "queue_name = \"bundles\"\n");

  env
    .cmd()
    .arg("--config")
    .arg(&config)
    .arg("import")
    .arg(super::common::fixture_path("roads.json"))
    .assert()
    .success();

  assert!(env.queue_path().join("bundles").join("pending").exists());
  env
    .cmd()
    .arg("--config")
    .arg(&config)
    .arg("work")
    .assert()
    .success()
    .stdout(predicate::str::contains("ds1 published"));
}
