//! End-to-end transform runs against a mock media host.

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{method, path, path_regex};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

fn can_bind_localhost() -> bool {
    std::net::TcpListener::bind("127.0.0.1:0").is_ok()
}

/// A signed-in `RESTYLE_HOME` whose media host points at `server`.
fn signed_in_home(server: &MockServer) -> TempDir {
    let home = TempDir::new().expect("create temp restyle home");
    fs::write(
        home.path().join("session.json"),
        json!({
            "email": "ana@example.com",
            "local_id": "uid-42",
            "id_token": "id-token-0123456789abcdef",
            "refresh_token": "refresh-token",
            "expires": 4_102_444_800_000_u64,
        })
        .to_string(),
    )
    .unwrap();
    fs::write(
        home.path().join("config.toml"),
        format!(
            "[media]\ncloud_name = \"demo\"\nupload_preset = \"unsigned\"\nupload_base_url = \"{uri}\"\ndelivery_base_url = \"{uri}\"\n",
            uri = server.uri()
        ),
    )
    .unwrap();
    home
}

fn write_photo(dir: &Path) -> PathBuf {
    let path = dir.join("me.png");
    image::RgbImage::from_pixel(64, 48, image::Rgb([180, 140, 90]))
        .save(&path)
        .unwrap();
    path
}

async fn mount_upload_ok(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/v1_1/demo/image/upload"))
        .respond_with(|req: &Request| {
            let body = String::from_utf8_lossy(&req.body).to_string();
            assert!(body.contains("filename=\"upload.jpg\""));
            assert!(body.contains("unsigned"));
            ResponseTemplate::new(200).set_body_json(json!({
                "public_id": "abc123",
                "secure_url": "https://cdn.example/abc123.jpg",
            }))
        })
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_transform_with_preset_prints_urls() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let server = MockServer::start().await;
    mount_upload_ok(&server).await;
    let home = signed_in_home(&server);
    let photo = write_photo(home.path());

    cargo_bin_cmd!("restyle")
        .env("RESTYLE_HOME", home.path())
        .arg("transform")
        .arg(&photo)
        .args(["--preset", "Bald", "--remove"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Original      https://cdn.example/abc123.jpg",
        ))
        .stdout(predicate::str::contains(
            "/demo/image/upload/e_gen_replace:from_hair;to_bald%20head%2C%20keep%20same%20person%2C%20preserve%20face;preserve-geometry_true/abc123",
        ))
        .stdout(predicate::str::contains(
            "/demo/image/upload/e_gen_remove:prompt_hair/abc123",
        ));
}

#[tokio::test]
async fn test_transform_without_remove_builds_replace_only() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let server = MockServer::start().await;
    mount_upload_ok(&server).await;
    let home = signed_in_home(&server);
    let photo = write_photo(home.path());

    cargo_bin_cmd!("restyle")
        .env("RESTYLE_HOME", home.path())
        .arg("transform")
        .arg(&photo)
        .args(["--to", "short hair", "--augment", "aggressive"])
        .assert()
        .success()
        .stdout(predicate::str::contains("to_short%20hair%2C%20same%20person%2C%20same%20face"))
        .stdout(predicate::str::contains("e_gen_remove").not());
}

#[tokio::test]
async fn test_transform_upload_failure_reports_body() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1_1/demo/image/upload"))
        .respond_with(
            ResponseTemplate::new(400)
                .set_body_string(r#"{"error":{"message":"Upload preset must be whitelisted"}}"#),
        )
        .expect(1)
        .mount(&server)
        .await;
    let home = signed_in_home(&server);
    let photo = write_photo(home.path());

    cargo_bin_cmd!("restyle")
        .env("RESTYLE_HOME", home.path())
        .arg("transform")
        .arg(&photo)
        .assert()
        .failure()
        .stdout(predicate::str::contains("e_gen_replace").not())
        .stderr(predicate::str::contains("Upload failed"))
        .stderr(predicate::str::contains("Upload preset must be whitelisted"));
}

#[tokio::test]
async fn test_transform_missing_photo_never_uploads() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    let home = signed_in_home(&server);

    cargo_bin_cmd!("restyle")
        .env("RESTYLE_HOME", home.path())
        .arg("transform")
        .arg(home.path().join("missing.jpg"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Permission required to access photos"));
}

#[tokio::test]
async fn test_transform_cancelled_pick() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    let home = signed_in_home(&server);

    cargo_bin_cmd!("restyle")
        .env("RESTYLE_HOME", home.path())
        .arg("transform")
        .write_stdin("\n")
        .assert()
        .success()
        .stderr(predicate::str::contains("No photo selected."));
}

#[tokio::test]
async fn test_transform_save_downloads_results() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let server = MockServer::start().await;
    mount_upload_ok(&server).await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/demo/image/upload/e_gen_replace:.*/abc123$"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(vec![9_u8, 9, 9], "image/png"))
        .expect(1)
        .mount(&server)
        .await;
    let home = signed_in_home(&server);
    let photo = write_photo(home.path());
    let out = home.path().join("out");
    fs::create_dir_all(&out).unwrap();

    cargo_bin_cmd!("restyle")
        .env("RESTYLE_HOME", home.path())
        .arg("transform")
        .arg(&photo)
        .arg("--save")
        .arg(&out)
        .assert()
        .success()
        .stderr(predicate::str::contains("Saved AI Transform to"));

    let saved: Vec<_> = fs::read_dir(&out).unwrap().map(|e| e.unwrap().path()).collect();
    assert_eq!(saved.len(), 1);
    assert_eq!(saved[0].extension().unwrap(), "png");
    assert_eq!(fs::read(&saved[0]).unwrap(), vec![9, 9, 9]);
}

/// Serves distinct bytes for the replace and remove results.
async fn mount_results(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path_regex(r"^/demo/image/upload/e_gen_replace:.*/abc123$"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(vec![9_u8, 9, 9], "image/png"))
        .expect(1)
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/demo/image/upload/e_gen_remove:.*/abc123$"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(vec![7_u8, 7, 7], "image/png"))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_transform_save_with_remove_into_new_directory() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let server = MockServer::start().await;
    mount_upload_ok(&server).await;
    mount_results(&server).await;
    let home = signed_in_home(&server);
    let photo = write_photo(home.path());
    let out = home.path().join("results");

    cargo_bin_cmd!("restyle")
        .env("RESTYLE_HOME", home.path())
        .arg("transform")
        .arg(&photo)
        .arg("--remove")
        .arg("--save")
        .arg(&out)
        .assert()
        .success()
        .stderr(predicate::str::contains("Saved AI Transform to"))
        .stderr(predicate::str::contains("Saved AI Remove to"));

    assert!(out.is_dir());
    let mut contents: Vec<_> = fs::read_dir(&out)
        .unwrap()
        .map(|e| fs::read(e.unwrap().path()).unwrap())
        .collect();
    contents.sort();
    assert_eq!(contents, vec![vec![7, 7, 7], vec![9, 9, 9]]);
}

#[tokio::test]
async fn test_transform_save_with_remove_to_file_path() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let server = MockServer::start().await;
    mount_upload_ok(&server).await;
    mount_results(&server).await;
    let home = signed_in_home(&server);
    let photo = write_photo(home.path());
    let out = home.path().join("saved").join("look.jpg");

    cargo_bin_cmd!("restyle")
        .env("RESTYLE_HOME", home.path())
        .arg("transform")
        .arg(&photo)
        .arg("--remove")
        .arg("--save")
        .arg(&out)
        .assert()
        .success();

    let saved = home.path().join("saved");
    assert_eq!(fs::read(saved.join("look-ai-transform.jpg")).unwrap(), vec![9, 9, 9]);
    assert_eq!(fs::read(saved.join("look-ai-remove.jpg")).unwrap(), vec![7, 7, 7]);
    assert!(!out.exists());
}

#[tokio::test]
async fn test_transform_flag_overrides_preset_prompt() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let server = MockServer::start().await;
    mount_upload_ok(&server).await;
    let home = signed_in_home(&server);
    let photo = write_photo(home.path());

    cargo_bin_cmd!("restyle")
        .env("RESTYLE_HOME", home.path())
        .arg("transform")
        .arg(&photo)
        .args(["--preset", "Bald", "--to", "buzz cut", "--augment", "none"])
        .assert()
        .success()
        .stdout(predicate::str::contains("from_hair;to_buzz%20cut;"))
        .stdout(predicate::str::contains("bald").not());
}

#[test]
fn test_transform_requires_session() {
    let home = TempDir::new().unwrap();

    cargo_bin_cmd!("restyle")
        .env("RESTYLE_HOME", home.path())
        .args(["transform", "photo.jpg"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Not signed in"));
}

#[test]
fn test_transform_unknown_preset() {
    let home = TempDir::new().unwrap();

    cargo_bin_cmd!("restyle")
        .env("RESTYLE_HOME", home.path())
        .args(["transform", "photo.jpg", "--preset", "mohawk"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown preset 'mohawk'"));
}
