//! Proxy fallback behavior: static hits stay local, misses forward
//! upstream, rewrites never leak into the forwarded target.

use staticd::config::ServerOptions;

mod common;

fn site(files: &[(&str, &str)]) -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    for (rel, contents) in files {
        std::fs::write(dir.path().join(rel), contents).unwrap();
    }
    dir
}

#[tokio::test]
async fn test_static_hit_is_served_locally() {
    let upstream = common::start_mock_upstream("from upstream").await;
    let dir = site(&[("local.txt", "from disk")]);
    let options = ServerOptions {
        root: Some(dir.path().to_path_buf()),
        proxy: Some(format!("http://{upstream}")),
        ..Default::default()
    };
    let (server, addr) = common::start_server(options).await;

    let response = reqwest::get(format!("http://{addr}/local.txt"))
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    assert_eq!(response.text().await.unwrap(), "from disk");

    server.close();
}

#[tokio::test]
async fn test_static_miss_falls_back_to_upstream() {
    let upstream = common::start_mock_upstream("from upstream").await;
    let dir = site(&[]);
    let options = ServerOptions {
        root: Some(dir.path().to_path_buf()),
        proxy: Some(format!("http://{upstream}")),
        ..Default::default()
    };
    let (server, addr) = common::start_server(options).await;

    let response = reqwest::get(format!("http://{addr}/api/things"))
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    assert_eq!(response.text().await.unwrap(), "from upstream");

    server.close();
}

#[tokio::test]
async fn test_rewritten_requests_forward_original_path() {
    let upstream = common::start_path_echo_upstream().await;
    let dir = site(&[]);
    let options = ServerOptions {
        root: Some(dir.path().to_path_buf()),
        rewrite: Some(("^/api/(.*)".into(), "/$1".into())),
        proxy: Some(format!("http://{upstream}")),
        ..Default::default()
    };
    let (server, addr) = common::start_server(options).await;

    // Rewrite turns /api/data.json into /data.json for the static
    // lookup; the upstream must still see the original target.
    let response = reqwest::get(format!("http://{addr}/api/data.json"))
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    assert_eq!(response.text().await.unwrap(), "/api/data.json");

    server.close();
}

#[tokio::test]
async fn test_rewrite_applies_to_static_lookup() {
    let upstream = common::start_path_echo_upstream().await;
    let dir = site(&[("data.json", "{\"local\": true}")]);
    let options = ServerOptions {
        root: Some(dir.path().to_path_buf()),
        rewrite: Some(("^/api/(.*)".into(), "/$1".into())),
        proxy: Some(format!("http://{upstream}")),
        ..Default::default()
    };
    let (server, addr) = common::start_server(options).await;

    let response = reqwest::get(format!("http://{addr}/api/data.json"))
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    assert_eq!(response.text().await.unwrap(), "{\"local\": true}");

    server.close();
}

#[tokio::test]
async fn test_unreachable_upstream_yields_502() {
    let dir = site(&[]);
    let options = ServerOptions {
        root: Some(dir.path().to_path_buf()),
        // Port 1 is never listening.
        proxy: Some("http://127.0.0.1:1".into()),
        ..Default::default()
    };
    let (server, addr) = common::start_server(options).await;

    let response = reqwest::get(format!("http://{addr}/anything"))
        .await
        .unwrap();
    assert_eq!(response.status(), 502);

    server.close();
}
