//! Pluggable auth modules, selected once at startup.

mod common;

use common::{create_spot, spawn_server, spawn_server_with};
use serde_json::json;

#[tokio::test]
async fn all_ok_admits_requests_without_credentials() {
    let server = spawn_server().await;
    let client = reqwest::Client::new();

    let (id, _) = create_spot(&client, &server, json!({"name": "Open door"})).await;

    let resp = client
        .get(server.url(&format!("/api/v1/spot/{id}")))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);
}

#[tokio::test]
async fn api_key_module_gates_the_api() {
    let server = spawn_server_with(|config| {
        config.auth_module = "api_key".to_string();
        config.api_key = Some("sesame".to_string());
    })
    .await;
    let client = reqwest::Client::new();

    // No key
    let resp = client
        .get(server.url("/api/v1/spot/1"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 401);

    // Wrong key
    let resp = client
        .get(server.url("/api/v1/spot/1"))
        .header("x-api-key", "open says me")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 401);

    // Right key reaches the handler (and 404s on the unknown id)
    let resp = client
        .get(server.url("/api/v1/spot/1"))
        .header("x-api-key", "sesame")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 404);

    // Writes are gated too
    let resp = client
        .post(server.url("/api/v1/spot"))
        .json(&json!({"name": "Locked out"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 401);
}

#[tokio::test]
async fn health_stays_public() {
    let server = spawn_server_with(|config| {
        config.auth_module = "api_key".to_string();
        config.api_key = Some("sesame".to_string());
    })
    .await;
    let client = reqwest::Client::new();

    let resp = client.get(server.url("/health")).send().await.unwrap();
    assert_eq!(resp.status().as_u16(), 200);

    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["auth_module"], "api_key");
}
