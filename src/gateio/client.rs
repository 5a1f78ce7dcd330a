// =============================================================================
// Gate.io REST API Client — public spot market-data endpoints
// =============================================================================
//
// Both operations are read-only and unauthenticated. Every network call is
// gated by the shared rate limiter *before* it leaves the process, and goes
// through the connection manager so a transport failure swaps the client out
// for the next attempt. Errors are surfaced to the caller without internal
// retries; retry policy lives in the worker pool.
// =============================================================================

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{debug, instrument};

use crate::gateio::{ConnectionManager, RateLimiter};
use crate::market_data::Candle;

/// Public Gate.io v4 REST base URL.
pub const DEFAULT_BASE_URL: &str = "https://api.gateio.ws/api/v4";

/// Read-only client for the Gate.io spot API.
#[derive(Clone)]
pub struct GateIoClient {
    base_url: String,
    connection: Arc<ConnectionManager>,
    limiter: Arc<RateLimiter>,
}

impl GateIoClient {
    pub fn new(
        base_url: impl Into<String>,
        connection: Arc<ConnectionManager>,
        limiter: Arc<RateLimiter>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            connection,
            limiter,
        }
    }

    // -------------------------------------------------------------------------
    // Currency pairs
    // -------------------------------------------------------------------------

    /// GET /spot/currency_pairs — identifiers of every pair currently open
    /// for trading. Called once at startup to build the watch list.
    #[instrument(skip(self), name = "gateio::list_tradable_pairs")]
    pub async fn list_tradable_pairs(&self) -> Result<Vec<String>> {
        let url = format!("{}/spot/currency_pairs", self.base_url);
        let body = self.get_json(&url, &[]).await?;

        let pairs = filter_tradable(&body)?;
        debug!(count = pairs.len(), "tradable pairs listed");
        Ok(pairs)
    }

    // -------------------------------------------------------------------------
    // Candlesticks
    // -------------------------------------------------------------------------

    /// GET /spot/candlesticks — at most `limit` bars at `interval` starting
    /// at `from` (UNIX seconds), chronological ascending.
    ///
    /// The exchange returns an in-progress bar as the last element of an
    /// unbounded query; callers bound `limit` and `from` so that only closed
    /// bars fit the window.
    #[instrument(skip(self), name = "gateio::candlesticks")]
    pub async fn candlesticks(
        &self,
        symbol: &str,
        interval: &str,
        limit: u32,
        from: i64,
    ) -> Result<Vec<Candle>> {
        let url = format!("{}/spot/candlesticks", self.base_url);
        let limit = limit.to_string();
        let from = from.to_string();
        let params = [
            ("currency_pair", symbol),
            ("interval", interval),
            ("limit", limit.as_str()),
            ("from", from.as_str()),
        ];

        let body = self.get_json(&url, &params).await?;
        let candles = parse_candles(&body)
            .with_context(|| format!("bad candlestick payload for {symbol}"))?;

        debug!(symbol, interval, count = candles.len(), "candlesticks fetched");
        Ok(candles)
    }

    // -------------------------------------------------------------------------
    // Internal helpers
    // -------------------------------------------------------------------------

    /// Rate-limited GET returning the parsed JSON body.
    ///
    /// Transport failures drop the shared connection before surfacing; non-2xx
    /// responses bail with status and body.
    async fn get_json(
        &self,
        url: &str,
        params: &[(&str, &str)],
    ) -> Result<serde_json::Value> {
        self.limiter.admit().await;

        let client = self.connection.handle()?;
        let resp = match client.get(url).query(params).send().await {
            Ok(resp) => resp,
            Err(e) => {
                let err = anyhow::Error::new(e).context(format!("GET {url} request failed"));
                self.connection.mark_disconnected(&err);
                return Err(err);
            }
        };

        let status = resp.status();
        let body: serde_json::Value = resp
            .json()
            .await
            .with_context(|| format!("failed to parse response body for GET {url}"))?;

        if !status.is_success() {
            anyhow::bail!("Gate.io GET {url} returned {status}: {body}");
        }
        Ok(body)
    }
}

impl std::fmt::Debug for GateIoClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GateIoClient")
            .field("base_url", &self.base_url)
            .finish()
    }
}

/// Extract the `id` of every instrument whose `trade_status` is `"tradable"`.
fn filter_tradable(body: &serde_json::Value) -> Result<Vec<String>> {
    let entries = body
        .as_array()
        .context("currency_pairs response is not an array")?;

    let pairs = entries
        .iter()
        .filter(|e| e["trade_status"].as_str() == Some("tradable"))
        .filter_map(|e| e["id"].as_str().map(str::to_string))
        .collect();
    Ok(pairs)
}

/// Parse the array-of-arrays candlestick response.
fn parse_candles(body: &serde_json::Value) -> Result<Vec<Candle>> {
    let entries = body
        .as_array()
        .context("candlesticks response is not an array")?;

    entries.iter().map(Candle::from_entry).collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
