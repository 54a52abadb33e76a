//! # HTTP Server Module
//!
//! This module provides the HTTP server implementation, built on
//! [Axum](https://github.com/tokio-rs/axum) with the Tokio async runtime.
//!
//! ## Server Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────┐
//! │                      Server                        │
//! ├───────────────────────────────────────────────────┤
//! │  ┌───────────────────────────────────────────┐     │
//! │  │             Middleware Stack               │     │
//! │  │  TraceLayer ─▶ CorsLayer ─▶ Router          │     │
//! │  └───────────────────────────────────────────┘     │
//! │  Routes:                                            │
//! │  ├── GET /health   → health                         │
//! │  └── GET /limited  → limited                        │
//! └───────────────────────────────────────────────────┘
//! ```
//!
//! ## Graceful Shutdown
//!
//! The server listens for `SIGINT` (Ctrl+C) and, on Unix, `SIGTERM`;
//! in-flight requests are allowed to complete before it exits.

use std::net::SocketAddr;

use axum::routing::get;
use axum::Router;
use tokio::signal;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::handlers::{health, limited, AppState};
use crate::middleware::logging_middleware;

pub fn create_app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/limited", get(limited))
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive())
                .layer(axum::middleware::from_fn(logging_middleware)),
        )
}

/// HTTP server wrapper: holds the configured router and bind address.
pub struct Server {
    app: Router,
    bind_address: String,
}

impl Server {
    pub fn new(state: AppState, bind_address: String) -> Self {
        Self {
            app: create_app(state),
            bind_address,
        }
    }

    pub async fn run(self) -> Result<(), Box<dyn std::error::Error>> {
        let listener = tokio::net::TcpListener::bind(&self.bind_address).await?;

        tracing::info!("rate limiter listening on {}", self.bind_address);
        tracing::info!("health check available at /health");

        axum::serve(
            listener,
            self.app
                .into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown_signal())
        .await?;

        Ok(())
    }
}

/// Waits for a shutdown signal (Ctrl+C or, on Unix, SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("received Ctrl+C, initiating graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("received terminate signal, initiating graceful shutdown");
        },
    }
}
