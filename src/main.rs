// =============================================================================
// Spotwatch — Gate.io Spot Volume-Surge Scanner — Main Entry Point
// =============================================================================
//
// Discovers every tradable spot pair once at startup, then scans all of them
// every hour: a fixed worker pool drains the symbol queue through a shared
// rate limiter, and any symbol whose hourly volume at least doubled is
// reported on stdout.
// =============================================================================

// ── Module declarations ──────────────────────────────────────────────────────
mod gateio;
mod market_data;
mod runtime_config;
mod scanner;
mod stream;
mod types;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use parking_lot::RwLock;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::gateio::{ConnectionManager, GateIoClient, RateLimiter};
use crate::market_data::{interval_seconds, SymbolStatus};
use crate::runtime_config::ScannerConfig;
use crate::scanner::pool::{spawn_workers, FetchSettings};
use crate::scanner::{Scheduler, SharedStatus, WorkQueue};

/// Startup attempts at the currency-pair listing before giving up.
const LISTING_ATTEMPTS: u32 = 3;

#[tokio::main]
async fn main() -> Result<()> {
    // ── 1. Environment & config ──────────────────────────────────────────
    let _ = dotenv::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Spotwatch starting up");

    let config_path =
        std::env::var("SPOTWATCH_CONFIG").unwrap_or_else(|_| "spotwatch.json".into());
    let mut config = ScannerConfig::load(&config_path).unwrap_or_else(|e| {
        warn!(error = %e, "failed to load config, using defaults");
        ScannerConfig::default()
    });

    // Override worker count from env if available.
    if let Ok(raw) = std::env::var("SPOTWATCH_WORKERS") {
        match raw.parse::<usize>() {
            Ok(n) if n > 0 => config.workers = n,
            _ => warn!(value = %raw, "ignoring invalid SPOTWATCH_WORKERS"),
        }
    }
    config.validate()?;

    info!(
        interval = %config.interval,
        workers = config.workers,
        rate_limit = config.rate_limit_requests,
        window_secs = config.rate_limit_window_secs,
        "configuration resolved"
    );

    // ── 2. Build the API client ──────────────────────────────────────────
    let limiter = Arc::new(RateLimiter::new(
        config.rate_limit_requests,
        Duration::from_secs(config.rate_limit_window_secs),
    ));
    let connection = Arc::new(ConnectionManager::new());
    let client = GateIoClient::new(config.base_url.clone(), connection, limiter);

    // ── 3. One-shot listing mode ─────────────────────────────────────────
    if std::env::args().any(|arg| arg == "--list-pairs") {
        let pairs = client.list_tradable_pairs().await?;
        for pair in &pairs {
            println!("{pair}");
        }
        return Ok(());
    }

    // ── 4. Discover the watch list ───────────────────────────────────────
    let pairs = list_pairs_with_retry(&client).await?;
    info!(count = pairs.len(), "tradable pairs discovered");

    let watchlist: Vec<SharedStatus> = pairs
        .into_iter()
        .map(|pair| Arc::new(RwLock::new(SymbolStatus::new(pair))) as SharedStatus)
        .collect();

    // ── 5. Worker pool ───────────────────────────────────────────────────
    let queue = Arc::new(WorkQueue::new());
    let settings = Arc::new(FetchSettings {
        interval: config.interval.clone(),
        interval_secs: interval_seconds(&config.interval)?,
        max_attempts: config.max_fetch_attempts,
        backoff_base: Duration::from_millis(config.retry_backoff_ms),
    });
    let _workers = spawn_workers(config.workers, queue.clone(), client.clone(), settings);

    // ── 6. Optional candle dump stream ───────────────────────────────────
    if config.stream_dump && !config.stream_symbols.is_empty() {
        let ws_url = config.ws_url.clone();
        let interval = config.interval.clone();
        let symbols = config.stream_symbols.clone();
        tokio::spawn(async move {
            loop {
                if let Err(e) = stream::run_candle_dump(&ws_url, &interval, &symbols).await {
                    error!(error = %e, "candle dump stream error — reconnecting in 5s");
                }
                tokio::time::sleep(Duration::from_secs(5)).await;
            }
        });
    }

    // ── 7. Scheduler ─────────────────────────────────────────────────────
    let scheduler = Scheduler::new(queue, watchlist, config.grace_secs);
    tokio::spawn(scheduler.run());

    info!("All subsystems running. Press Ctrl+C to stop.");

    // ── 8. Graceful shutdown ─────────────────────────────────────────────
    tokio::signal::ctrl_c().await?;
    warn!("Shutdown signal received — stopping");
    Ok(())
}

/// Fetch the tradable-pair listing with a few startup retries. Without a
/// watch list there is nothing to scan, so exhausting the attempts is fatal.
async fn list_pairs_with_retry(client: &GateIoClient) -> Result<Vec<String>> {
    for attempt in 1..=LISTING_ATTEMPTS {
        match client.list_tradable_pairs().await {
            Ok(pairs) if !pairs.is_empty() => return Ok(pairs),
            Ok(_) => warn!(attempt, "currency-pair listing came back empty"),
            Err(e) => warn!(attempt, error = %e, "currency-pair listing failed"),
        }
        if attempt < LISTING_ATTEMPTS {
            tokio::time::sleep(Duration::from_secs(5)).await;
        }
    }
    anyhow::bail!("could not list tradable pairs after {LISTING_ATTEMPTS} attempts")
}
