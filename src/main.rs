use std::sync::Arc;

use ratelimit_core::algorithms::{InMemorySlidingWindow, InMemoryTokenBucket};
use ratelimit_core::config::{AlgorithmChoice, BackendChoice, Settings};
use ratelimit_core::handlers::AppState;
use ratelimit_core::limiter::RateLimiter;
use ratelimit_core::redis_backend::{KvClient, SharedSlidingWindow, SharedTokenBucket};
use ratelimit_core::server::Server;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let settings = Settings::from_env()?;

    tracing::info!(
        algorithm = ?settings.algorithm,
        host = %settings.host,
        port = settings.port,
        "loaded settings"
    );

    let (limiter, kv_client) = if settings.backend == BackendChoice::Shared {
        let kv_config = settings.kv_backend_config();
        let client = KvClient::connect(&kv_config).await?;
        let limiter = match settings.algorithm {
            AlgorithmChoice::TokenBucket => RateLimiter::SharedTokenBucket(SharedTokenBucket::new(
                client.clone(),
                kv_config,
                settings.token_bucket,
            )),
            AlgorithmChoice::SlidingWindowLog => {
                RateLimiter::SharedSlidingWindow(SharedSlidingWindow::new(
                    client.clone(),
                    kv_config,
                    settings.sliding_window,
                ))
            }
        };
        (limiter, Some(client))
    } else {
        let limiter = match settings.algorithm {
            AlgorithmChoice::TokenBucket => {
                RateLimiter::InMemoryTokenBucket(InMemoryTokenBucket::new(settings.token_bucket))
            }
            AlgorithmChoice::SlidingWindowLog => RateLimiter::InMemorySlidingWindow(
                InMemorySlidingWindow::new(settings.sliding_window),
            ),
        };
        (limiter, None)
    };

    let state = AppState {
        limiter: Arc::new(limiter),
        kv_client,
    };

    let bind_address = settings.bind_address();
    Server::new(state, bind_address).run().await
}
