//! Tiny concurrent load test for `/limited`.
//!
//! Ported from the Python reference's `scripts/load_test.py`: same flags,
//! same status-code histogram, same percentile math, same exit code
//! convention (non-zero when any request failed to connect at all).

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{bail, Result};
use clap::Parser;
use futures_util::stream::FuturesUnordered;
use futures_util::StreamExt;
use rand::Rng;
use tokio::sync::Semaphore;

#[derive(Parser, Debug)]
#[command(about = "Tiny concurrent load test for /limited")]
struct Args {
    #[arg(long, default_value = "http://localhost:8000/limited")]
    url: String,

    #[arg(long, default_value_t = 200)]
    requests: u32,

    #[arg(long, default_value_t = 25)]
    concurrency: usize,

    #[arg(long, default_value_t = 2.0)]
    timeout: f64,

    /// All requests use the same client identity (expect 429s).
    #[arg(long, conflicts_with = "unique_clients")]
    single_client: bool,

    /// Vary X-Real-IP per request to simulate many clients.
    #[arg(long, conflicts_with = "single_client")]
    unique_clients: bool,
}

struct RequestOutcome {
    /// HTTP status, or `0` on a connection-level failure.
    status: u16,
    latency_ms: f64,
}

fn header_for_request(args: &Args) -> Option<String> {
    if args.unique_clients {
        let mut rng = rand::thread_rng();
        Some(format!(
            "10.{}.{}.{}",
            rng.gen_range(0..=255),
            rng.gen_range(0..=255),
            rng.gen_range(1..=254)
        ))
    } else if args.single_client {
        Some("10.0.0.1".to_string())
    } else {
        None
    }
}

async fn one_request(client: reqwest::Client, url: String, x_real_ip: Option<String>) -> RequestOutcome {
    let start = Instant::now();
    let mut request = client.get(&url).header("User-Agent", "rate-limiter-load-test");
    if let Some(ip) = x_real_ip {
        request = request.header("X-Real-IP", ip);
    }

    match request.send().await {
        Ok(response) => {
            let status = response.status().as_u16();
            let _ = response.bytes().await;
            RequestOutcome {
                status,
                latency_ms: start.elapsed().as_secs_f64() * 1000.0,
            }
        }
        Err(_) => RequestOutcome {
            status: 0,
            latency_ms: start.elapsed().as_secs_f64() * 1000.0,
        },
    }
}

fn percentile(sorted_latencies: &[f64], p: f64) -> f64 {
    if sorted_latencies.is_empty() {
        return 0.0;
    }
    let last = sorted_latencies.len() - 1;
    let k = ((p / 100.0) * last as f64).round() as usize;
    sorted_latencies[k.min(last)]
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    if args.requests == 0 {
        bail!("--requests must be > 0");
    }
    if args.concurrency == 0 {
        bail!("--concurrency must be > 0");
    }

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs_f64(args.timeout))
        .build()?;

    let semaphore = Arc::new(Semaphore::new(args.concurrency));
    let start = Instant::now();

    let mut in_flight = FuturesUnordered::new();
    for _ in 0..args.requests {
        let client = client.clone();
        let url = args.url.clone();
        let x_real_ip = header_for_request(&args);
        let semaphore = semaphore.clone();

        in_flight.push(tokio::spawn(async move {
            let _permit = semaphore.acquire_owned().await.expect("semaphore closed");
            one_request(client, url, x_real_ip).await
        }));
    }

    let mut outcomes = Vec::with_capacity(args.requests as usize);
    while let Some(joined) = in_flight.next().await {
        outcomes.push(joined.expect("load-test task panicked"));
    }

    let total = start.elapsed();

    let mut counts: std::collections::BTreeMap<u16, u32> = std::collections::BTreeMap::new();
    let mut latencies: Vec<f64> = Vec::with_capacity(outcomes.len());
    for outcome in &outcomes {
        *counts.entry(outcome.status).or_insert(0) += 1;
        latencies.push(outcome.latency_ms);
    }
    latencies.sort_by(|a, b| a.partial_cmp(b).unwrap());

    println!("URL: {}", args.url);
    println!(
        "Requests: {}, Concurrency: {}, Time: {:.3}s",
        args.requests,
        args.concurrency,
        total.as_secs_f64()
    );
    println!("Status counts:");
    for (status, count) in &counts {
        println!("  {status}: {count}");
    }

    let mean = if latencies.is_empty() {
        0.0
    } else {
        latencies.iter().sum::<f64>() / latencies.len() as f64
    };
    println!("Latency (ms):");
    println!("  mean={mean:.2}");
    println!(
        "  p50={:.2}  p90={:.2}  p99={:.2}",
        percentile(&latencies, 50.0),
        percentile(&latencies, 90.0),
        percentile(&latencies, 99.0)
    );

    if counts.contains_key(&0) {
        std::process::exit(2);
    }

    Ok(())
}
