//! End-to-end tests for the CLI binary.

mod support;

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::json;
use support::socket_guard::start_mock_server_or_skip;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const EXTENT: &str = "-106,39,-105,40";

/// A command isolated from the user's config file and environment.
fn tnm_download(config_home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("tnm-download").unwrap();
    cmd.env("XDG_CONFIG_HOME", config_home.path())
        .env_remove("TNM_API_URL")
        .env_remove("RUST_LOG");
    cmd
}

async fn mount_catalog(server: &MockServer, items: serde_json::Value) {
    let total = items.as_array().map_or(0, Vec::len);
    Mock::given(method("GET"))
        .and(path("/api/v1/products"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "total": total,
            "items": items,
            "messages": [],
            "errors": [],
        })))
        .mount(server)
        .await;
}

fn item(server: &MockServer, id: &str, dataset: &str) -> serde_json::Value {
    json!({
        "title": format!("Tile {id}"),
        "sourceId": id,
        "downloadURL": format!("{}/files/{id}.tif", server.uri()),
        "sizeInBytes": 4,
        "format": "GeoTIFF",
        "datasets": [dataset],
    })
}

async fn mount_file(server: &MockServer, id: &str, status: u16) {
    Mock::given(method("GET"))
        .and(path(format!("/files/{id}.tif")))
        .respond_with(ResponseTemplate::new(status).set_body_string(format!("{id}!!")))
        .mount(server)
        .await;
}

fn api_url(server: &MockServer) -> String {
    format!("{}/api/v1/products", server.uri())
}

#[test]
fn test_binary_help_exits_zero() {
    let home = TempDir::new().unwrap();
    tnm_download(&home)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--extent"))
        .stdout(predicate::str::contains("--output_dir"))
        .stdout(predicate::str::contains("--threads"));
}

#[test]
fn test_binary_version_exits_zero() {
    let home = TempDir::new().unwrap();
    tnm_download(&home)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_binary_missing_required_args_exits_one() {
    let home = TempDir::new().unwrap();
    tnm_download(&home)
        .args(["-o", "out"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("--extent"));
}

#[test]
fn test_binary_threads_out_of_range_exits_one() {
    let home = TempDir::new().unwrap();
    tnm_download(&home)
        .args(["-e", EXTENT, "-o", "out", "-t", "0"])
        .assert()
        .code(1);
}

#[tokio::test]
async fn test_binary_invalid_extent_exits_one_without_network() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    let home = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();

    for bad in ["1,2,3", "-105,39,-106,40", "west,39,-105,40", "-106,39,-105,95"] {
        tnm_download(&home)
            .args(["--api-url", &api_url(&server), "-o"])
            .arg(out.path())
            .arg(format!("--extent={bad}"))
            .assert()
            .code(1)
            .stderr(predicate::str::contains("invalid extent"));
    }
}

#[tokio::test]
async fn test_binary_unusable_output_dir_exits_before_query() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    let home = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    let not_a_dir = out.path().join("tiles.tif");
    std::fs::write(&not_a_dir, "occupied").unwrap();

    tnm_download(&home)
        .args(["-e", EXTENT, "--api-url", &api_url(&server), "--all", "-o"])
        .arg(&not_a_dir)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Failed to create output directory"));
}

#[tokio::test]
async fn test_binary_no_products_exits_zero() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    mount_catalog(&server, json!([])).await;
    let home = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();

    tnm_download(&home)
        .args(["-e", EXTENT, "--api-url", &api_url(&server), "-o"])
        .arg(out.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("No products found in requested extent"));
}

#[tokio::test]
async fn test_binary_all_downloads_everything() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    mount_catalog(&server, json!([item(&server, "a", "NED"), item(&server, "b", "NED")])).await;
    mount_file(&server, "a", 200).await;
    mount_file(&server, "b", 200).await;
    let home = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    let target = out.path().join("new").join("dir");

    tnm_download(&home)
        .args(["-e", EXTENT, "--api-url", &api_url(&server), "--all", "-t", "2", "-o"])
        .arg(&target)
        .assert()
        .success()
        .stdout(predicate::str::contains("Downloaded 2 of 2 files"));

    assert_eq!(std::fs::read_to_string(target.join("a.tif")).unwrap(), "a!!");
    assert_eq!(std::fs::read_to_string(target.join("b.tif")).unwrap(), "b!!");
}

#[tokio::test]
async fn test_binary_failed_download_exits_one() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    mount_catalog(
        &server,
        json!([
            item(&server, "a", "NED"),
            item(&server, "b", "NED"),
            item(&server, "c", "NED"),
        ]),
    )
    .await;
    mount_file(&server, "a", 200).await;
    mount_file(&server, "b", 500).await;
    mount_file(&server, "c", 200).await;
    let home = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();

    tnm_download(&home)
        .args(["-e", EXTENT, "--api-url", &api_url(&server), "--all", "-o"])
        .arg(out.path())
        .assert()
        .code(1)
        .stdout(predicate::str::contains("Downloaded 2 of 3 files"))
        .stdout(predicate::str::contains("1 failed:"))
        .stdout(predicate::str::contains("b: HTTP 500"));

    assert!(out.path().join("a.tif").is_file());
    assert!(out.path().join("c.tif").is_file());
    assert!(!out.path().join("b.tif").exists());
}

#[tokio::test]
async fn test_binary_by_dataset_writes_into_dataset_folders() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    mount_catalog(&server, json!([item(&server, "a", "NED"), item(&server, "b", "US Topo")])).await;
    mount_file(&server, "a", 200).await;
    mount_file(&server, "b", 200).await;
    let home = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();

    tnm_download(&home)
        .args(["-e", EXTENT, "--api-url", &api_url(&server), "--all", "--by-dataset", "-o"])
        .arg(out.path())
        .assert()
        .success();

    assert!(out.path().join("NED").join("a.tif").is_file());
    assert!(out.path().join("US Topo").join("b.tif").is_file());
}

#[tokio::test]
async fn test_binary_without_terminal_requires_all() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    mount_catalog(&server, json!([item(&server, "a", "NED")])).await;
    Mock::given(method("GET"))
        .and(path("/files/a.tif"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    let home = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();

    tnm_download(&home)
        .args(["-e", EXTENT, "--api-url", &api_url(&server), "-o"])
        .arg(out.path())
        .assert()
        .code(1)
        .stderr(predicate::str::contains("--all"));
}

#[tokio::test]
async fn test_binary_reads_threads_from_config_file() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    mount_catalog(&server, json!([])).await;
    let home = TempDir::new().unwrap();
    let config_dir = home.path().join("tnm-download");
    std::fs::create_dir_all(&config_dir).unwrap();
    std::fs::write(
        config_dir.join("config.toml"),
        format!("threads = 3\napi_url = \"{}\"\n", api_url(&server)),
    )
    .unwrap();
    let out = TempDir::new().unwrap();

    tnm_download(&home)
        .args(["-e", EXTENT, "-o"])
        .arg(out.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("No products found"));
}

#[test]
fn test_binary_invalid_config_exits_one() {
    let home = TempDir::new().unwrap();
    let config_dir = home.path().join("tnm-download");
    std::fs::create_dir_all(&config_dir).unwrap();
    std::fs::write(config_dir.join("config.toml"), "threads = 100\n").unwrap();

    tnm_download(&home)
        .args(["-e", EXTENT, "-o", "out"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("threads"));
}
