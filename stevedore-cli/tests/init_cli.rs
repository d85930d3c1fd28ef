use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use serde_yaml::Value;
use tempfile::TempDir;

fn node_project(dir: &Path) {
    fs::write(
        dir.join("package.json"),
        r#"{"name":"shop","main":"server.js","scripts":{"start":"node server.js"},"dependencies":{"express":"^4.18.0"}}"#,
    )
    .unwrap();
    fs::write(dir.join("server.js"), "require('express')().listen(3000);\n").unwrap();
}

fn stevedore(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("stevedore").expect("stevedore binary");
    cmd.env("HOME", home.path())
        .env("USERPROFILE", home.path())
        .env("NO_COLOR", "1")
        .env_remove("RUST_LOG");
    cmd
}

fn entries(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
        .collect();
    names.sort();
    names
}

#[test]
fn dry_run_prints_exactly_what_init_writes() {
    let home = TempDir::new().unwrap();
    let dry = TempDir::new().unwrap();
    let real = TempDir::new().unwrap();
    node_project(dry.path());
    node_project(real.path());

    let output = stevedore(&home)
        .arg("init")
        .arg(dry.path())
        .args(["--non-interactive", "--dry-run"])
        .output()
        .unwrap();
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert_eq!(entries(dry.path()), vec!["package.json", "server.js"]);

    stevedore(&home)
        .arg("init")
        .arg(real.path())
        .arg("--non-interactive")
        .assert()
        .success();

    let mut expected = Vec::new();
    for file in ["Dockerfile", ".dockerignore", "docker-compose.yaml", "stevedore.yaml"] {
        expected.extend(fs::read(real.path().join(file)).unwrap());
    }
    assert_eq!(output.stdout, expected);
}

#[test]
fn init_writes_compose_files_and_config() {
    let home = TempDir::new().unwrap();
    let project = TempDir::new().unwrap();
    node_project(project.path());

    stevedore(&home)
        .arg("init")
        .arg(project.path())
        .args(["--non-interactive", "--port", "8080"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Dockerfile"))
        .stdout(predicate::str::contains("created"));

    let config: Value =
        serde_yaml::from_str(&fs::read_to_string(project.path().join("stevedore.yaml")).unwrap())
            .unwrap();
    assert_eq!(config["name"], Value::from("shop"));
    assert_eq!(config["port"], Value::from(8080));
    assert_eq!(config["target"], Value::from("compose"));

    let dockerfile = fs::read_to_string(project.path().join("Dockerfile")).unwrap();
    assert!(dockerfile.contains("EXPOSE 8080"));
}

#[test]
fn second_init_keeps_edited_file_without_force() {
    let home = TempDir::new().unwrap();
    let project = TempDir::new().unwrap();
    node_project(project.path());

    stevedore(&home)
        .arg("init")
        .arg(project.path())
        .arg("--non-interactive")
        .assert()
        .success();
    fs::write(project.path().join("Dockerfile"), "FROM my/own\n").unwrap();

    stevedore(&home)
        .arg("init")
        .arg(project.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("--force"));
    assert_eq!(
        fs::read_to_string(project.path().join("Dockerfile")).unwrap(),
        "FROM my/own\n"
    );

    stevedore(&home)
        .arg("init")
        .arg(project.path())
        .arg("--force")
        .assert()
        .success();
    assert_ne!(
        fs::read_to_string(project.path().join("Dockerfile")).unwrap(),
        "FROM my/own\n"
    );
}

#[test]
fn kubernetes_target_creates_manifest_dir() {
    let home = TempDir::new().unwrap();
    let project = TempDir::new().unwrap();
    node_project(project.path());

    stevedore(&home)
        .arg("init")
        .arg(project.path())
        .args(["--target", "kubernetes", "--replicas", "2", "--force"])
        .assert()
        .success();

    assert!(project.path().join("k8s/deployment.yaml").is_file());
    assert!(project.path().join("k8s/service.yaml").is_file());
    assert!(project.path().join("skaffold.yaml").is_file());
    assert!(!project.path().join("docker-compose.yaml").exists());
}

#[test]
fn failed_init_rolls_back_and_names_the_path() {
    let home = TempDir::new().unwrap();
    let project = TempDir::new().unwrap();
    node_project(project.path());
    // A directory squatting on skaffold.yaml makes a late write fail.
    fs::create_dir(project.path().join("skaffold.yaml")).unwrap();

    stevedore(&home)
        .arg("init")
        .arg(project.path())
        .args(["--target", "kubernetes", "--force"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("skaffold.yaml"))
        .stderr(predicate::str::contains("rolled back"));

    assert_eq!(
        entries(project.path()),
        vec!["package.json", "server.js", "skaffold.yaml"]
    );
}

#[test]
fn unknown_stack_is_an_error() {
    let home = TempDir::new().unwrap();
    let project = TempDir::new().unwrap();
    stevedore(&home)
        .arg("init")
        .arg(project.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("could not detect"));
}

#[test]
fn diff_reports_changes_and_writes_nothing() {
    let home = TempDir::new().unwrap();
    let project = TempDir::new().unwrap();
    node_project(project.path());

    stevedore(&home)
        .arg("diff")
        .arg(project.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("+++ b/Dockerfile"));
    assert_eq!(entries(project.path()), vec!["package.json", "server.js"]);

    stevedore(&home)
        .arg("init")
        .arg(project.path())
        .arg("--non-interactive")
        .assert()
        .success();
    stevedore(&home)
        .arg("diff")
        .arg(project.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("No differences"));
}
