use std::collections::HashMap;
use std::net::SocketAddr;

use reqwest::StatusCode;
use scorekeeper::{AppState, config::Config, router::create_router};

async fn spawn_server(pairs: &[(&str, &str)]) -> SocketAddr {
    let vars: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    let config = Config::from_lookup(|key| vars.get(key).cloned()).unwrap();
    let app = create_router(AppState::new(config));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .unwrap();
    });
    addr
}

#[tokio::test]
async fn test_peer_address_identifies_client() {
    let addr = spawn_server(&[("RATE_LIMIT_MAX_REQUESTS", "2")]).await;
    let client = reqwest::Client::new();
    let url = format!("http://{}/health", addr);

    for remaining in ["1", "0"] {
        let response = client.get(&url).send().await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["x-ratelimit-remaining"], remaining);
    }

    let response = client.get(&url).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Too many requests");

    // a forwarded address is a different client
    let response = client
        .get(&url)
        .header("x-forwarded-for", "198.51.100.20, 10.0.0.1")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["x-ratelimit-remaining"], "1");
}

#[tokio::test]
async fn test_ops_reset_over_http() {
    let addr = spawn_server(&[("RATE_LIMIT_MAX_REQUESTS", "1"), ("ADMIN_TOKEN", "t0ken")]).await;
    let client = reqwest::Client::new();
    let health = format!("http://{}/health", addr);

    let request = || client.get(&health).header("x-forwarded-for", "192.0.2.9");
    assert_eq!(request().send().await.unwrap().status(), StatusCode::OK);
    assert_eq!(
        request().send().await.unwrap().status(),
        StatusCode::TOO_MANY_REQUESTS
    );

    let response = client
        .delete(format!("http://{}/ops/rate-limit/192.0.2.9", addr))
        .bearer_auth("t0ken")
        .header("x-forwarded-for", "192.0.2.50")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["resp_data"]["removed"], 1);

    assert_eq!(request().send().await.unwrap().status(), StatusCode::OK);
}
