//! Shared harness: boots the real server on an ephemeral port.

// Not every test binary uses every helper.
#![allow(dead_code)]

use std::net::SocketAddr;

use spot_server::{Config, ServerState, api};
use tempfile::TempDir;

pub struct TestServer {
    pub addr: SocketAddr,
    pub state: ServerState,
    _work_dir: TempDir,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

pub async fn spawn_server() -> TestServer {
    spawn_server_with(|_| {}).await
}

pub async fn spawn_server_with(configure: impl FnOnce(&mut Config)) -> TestServer {
    let work_dir = tempfile::tempdir().expect("temp work dir");
    let mut config = Config::with_overrides(work_dir.path().to_str().unwrap(), 0);
    config.auth_module = "all_ok".to_string();
    config.api_key = None;
    configure(&mut config);

    let state = ServerState::initialize(&config)
        .await
        .expect("server state");

    let app = api::build_app(&state).with_state(state.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral port");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve");
    });

    TestServer {
        addr,
        state,
        _work_dir: work_dir,
    }
}

/// POST a spot and return its id and the `ETag` from the response.
pub async fn create_spot(
    client: &reqwest::Client,
    server: &TestServer,
    body: serde_json::Value,
) -> (i64, String) {
    let resp = client
        .post(server.url("/api/v1/spot"))
        .json(&body)
        .send()
        .await
        .expect("create request");
    assert_eq!(resp.status().as_u16(), 201, "create should succeed");

    let etag = resp
        .headers()
        .get(reqwest::header::ETAG)
        .expect("ETag header")
        .to_str()
        .unwrap()
        .to_string();
    let json: serde_json::Value = resp.json().await.expect("create body");
    (json["id"].as_i64().expect("numeric id"), etag)
}

/// GET a spot, returning its body and `ETag`.
pub async fn get_spot(
    client: &reqwest::Client,
    server: &TestServer,
    id: i64,
) -> (serde_json::Value, String) {
    let resp = client
        .get(server.url(&format!("/api/v1/spot/{id}")))
        .send()
        .await
        .expect("get request");
    assert_eq!(resp.status().as_u16(), 200, "get should succeed");

    let etag = resp
        .headers()
        .get(reqwest::header::ETAG)
        .expect("ETag header")
        .to_str()
        .unwrap()
        .to_string();
    let json: serde_json::Value = resp.json().await.expect("get body");
    (json, etag)
}
