//! # HTTP Request Handlers
//!
//! This module contains the HTTP request handlers for the rate limiter's
//! reference adapter.
//!
//! ## Handler Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                       Request Handlers                          │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  GET /health   →  health()    liveness + KV PING                │
//! │  GET /limited  →  limited()   derives client key, checks limiter │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Response Shape
//!
//! `/limited` on admission sets `X-RateLimit-Tokens-Left` (3 decimal
//! places) and returns `{"ok":true,"limited":false,"client":<ip>}`. On
//! denial it returns 429 with `{"detail":"too many requests",
//! "retry_after_ms":<int>}` and, when `retry_after_ms > 0`, a
//! `Retry-After` header in whole seconds (ceiling, floor of 1).
//!
//! When the shared backend is unreachable, `result.metadata.mode` carries
//! which degraded-mode policy fired and the body reflects it instead of a
//! normal allow/deny: fail-open returns 200 with `"mode":"fail_open"`, and
//! fail-closed returns 429 with `"mode":"fail_closed"` and the error string.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{ConnectInfo, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::key_extract::client_key;
use crate::limiter::RateLimiter;
use crate::redis_backend::KvClient;
use crate::result::{FailureMode, RateLimitResult};

/// Shared application state handed to every handler via Axum's `State`
/// extractor. Plain `Arc` fields, no `RwLock`: the limiter and KV client
/// both manage their own interior synchronization.
#[derive(Clone)]
pub struct AppState {
    pub limiter: Arc<RateLimiter>,
    pub kv_client: Option<KvClient>,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    kv: bool,
}

/// Liveness probe. Always 200; `kv` reflects a `PING` against the shared
/// backend, or `false` when the server is running in-process only.
///
/// # Response (200 OK)
///
/// ```json
/// {"status": "ok", "kv": true}
/// ```
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let kv = match &state.kv_client {
        Some(client) => client.ping().await,
        None => false,
    };

    Json(HealthResponse { status: "ok", kv })
}

/// Retry-After header value: whole seconds, rounded up, floored at 1.
/// `None` when there's nothing to wait for.
fn retry_after_header_value(retry_after_ms: u64) -> Option<String> {
    if retry_after_ms == 0 {
        return None;
    }
    let seconds = (retry_after_ms + 999) / 1000;
    Some(seconds.max(1).to_string())
}

/// Reference endpoint exercising whichever limiter the server was started
/// with. Derives the caller's key from `X-Real-IP` / `X-Forwarded-For` /
/// peer address and checks out a single token or slot.
///
/// # Response (200 OK)
///
/// ```json
/// {"ok": true, "limited": false, "client": "203.0.113.5"}
/// ```
///
/// # Response (429 Too Many Requests)
///
/// ```json
/// {"detail": "too many requests", "retry_after_ms": 1200}
/// ```
pub async fn limited(
    State(state): State<AppState>,
    headers: HeaderMap,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
) -> Response {
    let client = client_key(&headers, Some(peer));
    let result = match state.limiter.check(&client, 1).await {
        Ok(result) => result,
        Err(err) => return err.into_response(),
    };

    build_limited_response(&client, result)
}

/// Builds the `/limited` response body for an already-computed result.
/// Kept separate from the handler so the degraded-mode branches are
/// testable without standing up a real request.
fn build_limited_response(client: &str, result: RateLimitResult) -> Response {
    if let Some(mode) = result.metadata.mode {
        return match mode {
            FailureMode::FailOpen => Json(serde_json::json!({
                "ok": true,
                "limited": false,
                "mode": "fail_open",
                "note": "shared backend unavailable; request allowed",
            }))
            .into_response(),
            FailureMode::FailClosed => (
                StatusCode::TOO_MANY_REQUESTS,
                Json(serde_json::json!({
                    "detail": "rate limited (shared backend unavailable)",
                    "mode": "fail_closed",
                    "error": result.metadata.error.unwrap_or_default(),
                })),
            )
                .into_response(),
        };
    }

    if !result.allowed {
        let mut response = (
            StatusCode::TOO_MANY_REQUESTS,
            Json(serde_json::json!({
                "detail": "too many requests",
                "retry_after_ms": result.retry_after_ms,
            })),
        )
            .into_response();

        if let Some(retry_after) = retry_after_header_value(result.retry_after_ms) {
            if let Ok(value) = retry_after.parse() {
                response.headers_mut().insert("Retry-After", value);
            }
        }

        return response;
    }

    let mut response = Json(serde_json::json!({
        "ok": true,
        "limited": false,
        "client": client,
    }))
    .into_response();

    let tokens_left = format!("{:.3}", result.remaining);
    if let Ok(value) = tokens_left.parse() {
        response
            .headers_mut()
            .insert("X-RateLimit-Tokens-Left", value);
    }

    response
}
