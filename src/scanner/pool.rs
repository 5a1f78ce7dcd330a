// =============================================================================
// Worker Pool — concurrent symbol fetchers draining the work queue
// =============================================================================
//
// A fixed set of tokio tasks, each looping forever: pop a symbol, fetch its
// two most recent closed hourly bars, fold them into the symbol's window,
// retire the queue item. Fetch failures are retried with exponential backoff
// up to a configured bound; past the bound the symbol simply misses this
// cycle's update and the cycle proceeds. No failure is fatal to the process.
// =============================================================================

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use chrono::Utc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::gateio::GateIoClient;
use crate::market_data::Candle;
use crate::scanner::{SharedStatus, WorkQueue};

/// Bars requested per fetch: the two most recently closed.
const CANDLE_LIMIT: u32 = 2;

/// Per-fetch tunables shared by every worker.
#[derive(Debug, Clone)]
pub struct FetchSettings {
    /// Candlestick bar interval, e.g. "1h".
    pub interval: String,
    /// Length of one bar in seconds; fixes the lookback window.
    pub interval_secs: i64,
    /// Attempts per symbol per cycle before giving up.
    pub max_attempts: u32,
    /// First retry delay; doubles per attempt.
    pub backoff_base: Duration,
}

/// Spawn `count` workers draining `queue`. The handles run for the process
/// lifetime; they are returned so tests can abort them.
pub fn spawn_workers(
    count: usize,
    queue: Arc<WorkQueue>,
    client: GateIoClient,
    settings: Arc<FetchSettings>,
) -> Vec<JoinHandle<()>> {
    info!(count, interval = %settings.interval, "starting worker pool");

    (0..count)
        .map(|id| {
            let queue = queue.clone();
            let client = client.clone();
            let settings = settings.clone();
            tokio::spawn(async move {
                run_worker(id, queue, client, settings).await;
            })
        })
        .collect()
}

async fn run_worker(
    id: usize,
    queue: Arc<WorkQueue>,
    client: GateIoClient,
    settings: Arc<FetchSettings>,
) {
    debug!(worker = id, "worker ready");

    loop {
        let status = queue.pop().await;
        let symbol = status.read().symbol().to_string();

        match fetch_with_retry(&client, &symbol, &settings).await {
            Ok(candles) => {
                debug!(worker = id, symbol = %symbol, count = candles.len(), "window refreshed");
                apply_candles(&status, candles);
            }
            Err(e) => {
                error!(
                    worker = id,
                    symbol = %symbol,
                    attempts = settings.max_attempts,
                    error = %e,
                    "fetch failed — symbol skipped for this cycle"
                );
            }
        }

        queue.complete();
    }
}

/// Fetch the two most recent closed bars for `symbol`, retrying transient
/// failures with exponential backoff up to `max_attempts`.
///
/// The lookback window starts exactly two bars in the past, so the exchange's
/// in-progress bar never fits the response and the two returned entries are
/// the two most recently closed.
async fn fetch_with_retry(
    client: &GateIoClient,
    symbol: &str,
    settings: &FetchSettings,
) -> Result<Vec<Candle>> {
    let mut attempt = 1;
    loop {
        let from = Utc::now().timestamp() - i64::from(CANDLE_LIMIT) * settings.interval_secs;
        match client
            .candlesticks(symbol, &settings.interval, CANDLE_LIMIT, from)
            .await
        {
            Ok(candles) => return Ok(candles),
            Err(e) if attempt < settings.max_attempts => {
                let delay = backoff_delay(attempt, settings.backoff_base);
                warn!(
                    symbol,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "fetch failed — retrying"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

/// Fold fetched bars into the symbol's window, oldest first, so the newest
/// bar always ends in slot 0 regardless of response ordering.
fn apply_candles(status: &SharedStatus, mut candles: Vec<Candle>) {
    candles.sort_unstable_by_key(|c| c.timestamp);
    let mut status = status.write();
    for candle in candles {
        status.push(candle);
    }
}

/// Delay before retry number `attempt + 1`: `base * 2^(attempt - 1)`.
fn backoff_delay(attempt: u32, base: Duration) -> Duration {
    base * 2u32.saturating_pow(attempt.saturating_sub(1))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
