//! Integration tests for the coveo-backup CLI

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

const ENV_VARS: &[&str] = &[
    "COVEO_ORGANIZATION_ID",
    "COVEO_API_KEY",
    "COVEO_BACKUP_DIR",
    "COVEO_BACKUP_REPO",
    "COVEO_PLATFORM_URL",
    "COVEO_POLL_INTERVAL_SECS",
    "COVEO_MAX_POLL_ATTEMPTS",
    "COVEO_RESOURCE_CATEGORIES",
    "RUST_LOG",
];

/// Command isolated from the caller's environment, rooted at `base`
fn backup_cmd(base: &Path) -> Command {
    let mut cmd = Command::cargo_bin("coveo-backup").unwrap();
    for var in ENV_VARS {
        cmd.env_remove(var);
    }
    cmd.current_dir(base).env("COVEO_BACKUP_DIR", base);
    cmd
}

fn zip_bytes(member: &str, contents: &str) -> Vec<u8> {
    let mut zip = ZipWriter::new(std::io::Cursor::new(Vec::new()));
    zip.start_file(member, SimpleFileOptions::default()).unwrap();
    zip.write_all(contents.as_bytes()).unwrap();
    zip.finish().unwrap().into_inner()
}

fn write_zip(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, zip_bytes("snapshot.json", contents)).unwrap();
    path
}

#[test]
fn test_cli_help() {
    let temp = TempDir::new().unwrap();
    backup_cmd(temp.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Coveo organization"))
        .stdout(predicate::str::contains("Usage"));
}

#[test]
fn test_missing_organization_fails_without_remote_call() {
    let temp = TempDir::new().unwrap();
    backup_cmd(temp.path())
        .env("COVEO_PLATFORM_URL", "http://127.0.0.1:9/rest")
        .env("COVEO_API_KEY", "key")
        .assert()
        .failure()
        .stderr(predicate::str::contains("COVEO_ORGANIZATION_ID"));

    assert!(!temp.path().join("snapshots").exists());
}

#[test]
fn test_missing_api_key_fails() {
    let temp = TempDir::new().unwrap();
    backup_cmd(temp.path())
        .arg("run")
        .env("COVEO_ORGANIZATION_ID", "myorg")
        .assert()
        .failure()
        .stderr(predicate::str::contains("COVEO_API_KEY"));
}

#[test]
fn test_compare_identical_archives() {
    let temp = TempDir::new().unwrap();
    let a = write_zip(temp.path(), "a.zip", r#"{"a": 1, "b": [1, 2]}"#);
    let b = write_zip(temp.path(), "b.zip", r#"{"b": [1, 2], "a": 1}"#);

    backup_cmd(temp.path())
        .arg("compare")
        .arg(&a)
        .arg(&b)
        .assert()
        .success()
        .stdout(predicate::str::contains("identical"));
}

#[test]
fn test_compare_different_archives() {
    let temp = TempDir::new().unwrap();
    let a = write_zip(temp.path(), "a.zip", r#"{"a": 1}"#);
    let b = write_zip(temp.path(), "b.zip", r#"{"a": 2}"#);

    backup_cmd(temp.path())
        .arg("compare")
        .arg(&a)
        .arg(&b)
        .assert()
        .code(1)
        .stdout(predicate::str::contains("different"))
        .stdout(predicate::str::contains("a: 1 -> 2"));
}

#[test]
fn test_compare_missing_archive_is_different() {
    let temp = TempDir::new().unwrap();
    let a = write_zip(temp.path(), "a.zip", "{}");

    backup_cmd(temp.path())
        .arg("compare")
        .arg(&a)
        .arg(temp.path().join("missing.zip"))
        .assert()
        .code(1)
        .stdout(predicate::str::contains("different"));
}

#[test]
fn test_list_empty() {
    let temp = TempDir::new().unwrap();
    backup_cmd(temp.path())
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("No snapshots found"));
}

#[test]
fn test_list_shows_newest_first() {
    let temp = TempDir::new().unwrap();
    let snapshots = temp.path().join("snapshots");
    fs::create_dir_all(&snapshots).unwrap();
    write_zip(&snapshots, "snapshot_20250101_120000.zip", "{}");
    write_zip(&snapshots, "snapshot_20250102_120000.zip", "{}");
    fs::write(snapshots.join("notes.txt"), "ignored").unwrap();

    let output = backup_cmd(temp.path()).arg("list").assert().success();
    let stdout = String::from_utf8(output.get_output().stdout.clone()).unwrap();

    let newer = stdout.find("snapshot_20250102_120000.zip").unwrap();
    let older = stdout.find("snapshot_20250101_120000.zip").unwrap();
    assert!(newer < older);
    assert!(!stdout.contains("notes.txt"));
    assert!(stdout.contains("Total: 2 snapshot(s)"));
}

#[test]
fn test_history_empty() {
    let temp = TempDir::new().unwrap();
    backup_cmd(temp.path())
        .arg("history")
        .assert()
        .success()
        .stdout(predicate::str::contains("No runs recorded yet."));
}

#[test]
fn test_config_hides_api_key() {
    let temp = TempDir::new().unwrap();
    backup_cmd(temp.path())
        .arg("config")
        .env("COVEO_ORGANIZATION_ID", "myorg")
        .env("COVEO_API_KEY", "super-secret-key")
        .assert()
        .success()
        .stdout(predicate::str::contains("myorg"))
        .stdout(predicate::str::contains("(set, hidden)"))
        .stdout(predicate::str::contains("super-secret-key").not());
}

#[test]
fn test_invalid_settings_override_rejected() {
    let temp = TempDir::new().unwrap();
    backup_cmd(temp.path())
        .arg("config")
        .env("COVEO_MAX_POLL_ATTEMPTS", "many")
        .assert()
        .failure()
        .stderr(predicate::str::contains("COVEO_MAX_POLL_ATTEMPTS"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_backup_cycle_against_mock_platform() {
    let server = MockServer::start().await;
    let document = r#"{"fields": [{"name": "title"}], "pipelines": []}"#;

    Mock::given(method("POST"))
        .and(path("/rest/organizations/myorg/snapshots"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": "snap-1"})))
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/organizations/myorg/snapshots/snap-1"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"id": "snap-1", "status": "COMPLETED"})),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/organizations/myorg/snapshots/snap-1/content"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(zip_bytes("export.json", document)))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/rest/organizations/myorg/snapshots/snap-1"))
        .respond_with(ResponseTemplate::new(204))
        .expect(2)
        .mount(&server)
        .await;

    let temp = TempDir::new().unwrap();
    git2::Repository::init(temp.path()).unwrap();
    let base = temp.path().to_path_buf();
    let platform_url = format!("{}/rest", server.uri());

    tokio::task::spawn_blocking(move || {
        for _ in 0..2 {
            backup_cmd(&base)
                .env("COVEO_ORGANIZATION_ID", "myorg")
                .env("COVEO_API_KEY", "key")
                .env("COVEO_PLATFORM_URL", &platform_url)
                .env("COVEO_POLL_INTERVAL_SECS", "0")
                .assert()
                .success();
        }

        let archives: Vec<_> = fs::read_dir(base.join("snapshots"))
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.path().extension().is_some_and(|ext| ext == "zip"))
            .collect();
        assert_eq!(archives.len(), 1);

        let repo = git2::Repository::open(&base).unwrap();
        let head = repo.head().unwrap().peel_to_commit().unwrap();
        assert_eq!(head.parent_count(), 0);
        assert!(head.message().unwrap().starts_with("Backup snapshot: "));

        backup_cmd(&base)
            .arg("history")
            .assert()
            .success()
            .stdout(predicate::str::contains("kept"))
            .stdout(predicate::str::contains("discarded"));
    })
    .await
    .unwrap();
}

#[tokio::test(flavor = "multi_thread")]
async fn test_failed_export_still_deletes_remote_snapshot() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/rest/organizations/myorg/snapshots"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": "snap-9"})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/organizations/myorg/snapshots/snap-9"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"id": "snap-9", "status": "COMPLETED"})),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/organizations/myorg/snapshots/snap-9/content"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/rest/organizations/myorg/snapshots/snap-9"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let temp = TempDir::new().unwrap();
    let base = temp.path().to_path_buf();
    let platform_url = format!("{}/rest", server.uri());

    tokio::task::spawn_blocking(move || {
        backup_cmd(&base)
            .env("COVEO_ORGANIZATION_ID", "myorg")
            .env("COVEO_API_KEY", "key")
            .env("COVEO_PLATFORM_URL", &platform_url)
            .env("COVEO_POLL_INTERVAL_SECS", "0")
            .assert()
            .failure();

        let leftovers = fs::read_dir(base.join("snapshots"))
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.path().is_file() && e.file_name() != ".backup.lock")
            .count();
        assert_eq!(leftovers, 0);
    })
    .await
    .unwrap();
}
