use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use ratelimit_core::algorithms::{InMemorySlidingWindow, InMemoryTokenBucket};
use ratelimit_core::config::{SlidingWindowConfig, TokenBucketConfig};
use ratelimit_core::handlers::AppState;
use ratelimit_core::limiter::RateLimiter;
use ratelimit_core::server::create_app;
use reqwest::Client;
use tokio::time::sleep;

async fn spawn_app(state: AppState) -> String {
    let app = create_app(state);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .unwrap();
    });

    format!("http://{addr}")
}

fn token_bucket_state(capacity: u64, refill_rate: f64) -> AppState {
    let config = TokenBucketConfig::new(capacity, refill_rate).unwrap();
    AppState {
        limiter: Arc::new(RateLimiter::InMemoryTokenBucket(InMemoryTokenBucket::new(
            config,
        ))),
        kv_client: None,
    }
}

fn sliding_window_state(window_size_ms: u64, max_requests: u64) -> AppState {
    let config = SlidingWindowConfig::new(window_size_ms, max_requests).unwrap();
    AppState {
        limiter: Arc::new(RateLimiter::InMemorySlidingWindow(
            InMemorySlidingWindow::new(config),
        )),
        kv_client: None,
    }
}

#[tokio::test]
async fn health_reports_status_without_kv() {
    let base_url = spawn_app(token_bucket_state(10, 1.0)).await;
    let client = Client::new();

    let response = client
        .get(format!("{base_url}/health"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["kv"], false);
}

#[tokio::test]
async fn token_bucket_admits_then_denies_burst() {
    let base_url = spawn_app(token_bucket_state(1, 0.0)).await;
    let client = Client::new();

    let first = client
        .get(format!("{base_url}/limited"))
        .header("X-Real-IP", "203.0.113.5")
        .send()
        .await
        .unwrap();
    assert_eq!(first.status(), 200);

    let second = client
        .get(format!("{base_url}/limited"))
        .header("X-Real-IP", "203.0.113.5")
        .send()
        .await
        .unwrap();
    assert_eq!(second.status(), 429);
    assert!(second.headers().get("retry-after").is_some());

    let body: serde_json::Value = second.json().await.unwrap();
    assert_eq!(body["detail"], "too many requests");
}

#[tokio::test]
async fn token_bucket_refills_over_time() {
    let base_url = spawn_app(token_bucket_state(1, 10.0)).await;
    let client = Client::new();

    let first = client
        .get(format!("{base_url}/limited"))
        .header("X-Real-IP", "198.51.100.9")
        .send()
        .await
        .unwrap();
    assert_eq!(first.status(), 200);

    let denied = client
        .get(format!("{base_url}/limited"))
        .header("X-Real-IP", "198.51.100.9")
        .send()
        .await
        .unwrap();
    assert_eq!(denied.status(), 429);

    sleep(Duration::from_millis(150)).await;

    let refilled = client
        .get(format!("{base_url}/limited"))
        .header("X-Real-IP", "198.51.100.9")
        .send()
        .await
        .unwrap();
    assert_eq!(refilled.status(), 200);
}

#[tokio::test]
async fn distinct_clients_get_independent_buckets() {
    let base_url = spawn_app(token_bucket_state(1, 0.0)).await;
    let client = Client::new();

    let a = client
        .get(format!("{base_url}/limited"))
        .header("X-Real-IP", "192.0.2.1")
        .send()
        .await
        .unwrap();
    assert_eq!(a.status(), 200);

    let b = client
        .get(format!("{base_url}/limited"))
        .header("X-Real-IP", "192.0.2.2")
        .send()
        .await
        .unwrap();
    assert_eq!(b.status(), 200);
}

#[tokio::test]
async fn sliding_window_enforces_max_requests_per_window() {
    let base_url = spawn_app(sliding_window_state(1000, 2)).await;
    let client = Client::new();

    for _ in 0..2 {
        let response = client
            .get(format!("{base_url}/limited"))
            .header("X-Real-IP", "203.0.113.77")
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 200);
    }

    let third = client
        .get(format!("{base_url}/limited"))
        .header("X-Real-IP", "203.0.113.77")
        .send()
        .await
        .unwrap();
    assert_eq!(third.status(), 429);
}

#[tokio::test]
async fn forwarded_for_header_is_used_when_real_ip_absent() {
    let base_url = spawn_app(token_bucket_state(1, 0.0)).await;
    let client = Client::new();

    let first = client
        .get(format!("{base_url}/limited"))
        .header("X-Forwarded-For", "203.0.113.200, 10.0.0.1")
        .send()
        .await
        .unwrap();
    assert_eq!(first.status(), 200);
    let body: serde_json::Value = first.json().await.unwrap();
    assert_eq!(body["client"], "203.0.113.200");

    let second = client
        .get(format!("{base_url}/limited"))
        .header("X-Forwarded-For", "203.0.113.200, 10.0.0.1")
        .send()
        .await
        .unwrap();
    assert_eq!(second.status(), 429);
}
