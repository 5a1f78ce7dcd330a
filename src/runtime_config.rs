// =============================================================================
// Runtime Configuration — scanner settings loaded at startup
// =============================================================================
//
// All tunables for the polling engine live here. The file is plain JSON;
// every field carries `#[serde(default)]` so a partial (or missing) config
// never breaks startup — absent fields fall back to the values below.
// =============================================================================

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::market_data::interval_seconds;

// =============================================================================
// Default-value helpers (required by serde `default = "..."` attribute)
// =============================================================================

fn default_interval() -> String {
    "1h".to_string()
}

fn default_workers() -> usize {
    5
}

fn default_grace_secs() -> i64 {
    60
}

fn default_rate_limit_requests() -> u32 {
    180
}

fn default_rate_limit_window_secs() -> u64 {
    10
}

fn default_max_fetch_attempts() -> u32 {
    5
}

fn default_retry_backoff_ms() -> u64 {
    500
}

fn default_base_url() -> String {
    crate::gateio::client::DEFAULT_BASE_URL.to_string()
}

fn default_ws_url() -> String {
    "wss://api.gateio.ws/ws/v4/".to_string()
}

// =============================================================================
// ScannerConfig
// =============================================================================

/// Engine configuration, deserialized from `spotwatch.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScannerConfig {
    /// Candlestick bar interval the scanner compares across, e.g. "1h".
    #[serde(default = "default_interval")]
    pub interval: String,

    /// Number of concurrent fetch workers.
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Seconds past the top of the hour before a cycle fires, giving the
    /// exchange time to finalize the just-closed bar.
    #[serde(default = "default_grace_secs")]
    pub grace_secs: i64,

    /// Requests admitted per rate-limit window across all workers.
    #[serde(default = "default_rate_limit_requests")]
    pub rate_limit_requests: u32,

    /// Rate-limit window length in seconds.
    #[serde(default = "default_rate_limit_window_secs")]
    pub rate_limit_window_secs: u64,

    /// Fetch attempts per symbol per cycle before the symbol is skipped.
    #[serde(default = "default_max_fetch_attempts")]
    pub max_fetch_attempts: u32,

    /// First retry delay in milliseconds; doubles per attempt.
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,

    /// REST API base URL.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// WebSocket endpoint for the candle dump stream.
    #[serde(default = "default_ws_url")]
    pub ws_url: String,

    /// Dump raw `spot.candlesticks` frames for `stream_symbols` to stdout.
    #[serde(default)]
    pub stream_dump: bool,

    /// Symbols subscribed by the dump stream (ignored unless `stream_dump`).
    #[serde(default)]
    pub stream_symbols: Vec<String>,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            interval: default_interval(),
            workers: default_workers(),
            grace_secs: default_grace_secs(),
            rate_limit_requests: default_rate_limit_requests(),
            rate_limit_window_secs: default_rate_limit_window_secs(),
            max_fetch_attempts: default_max_fetch_attempts(),
            retry_backoff_ms: default_retry_backoff_ms(),
            base_url: default_base_url(),
            ws_url: default_ws_url(),
            stream_dump: false,
            stream_symbols: Vec::new(),
        }
    }
}

impl ScannerConfig {
    /// Load configuration from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let config: Self = serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse config file {}", path.display()))?;

        info!(path = %path.display(), "configuration loaded");
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations the engine cannot run with.
    pub fn validate(&self) -> Result<()> {
        interval_seconds(&self.interval)
            .with_context(|| format!("config interval '{}' is not supported", self.interval))?;

        if self.workers == 0 {
            anyhow::bail!("config workers must be at least 1");
        }
        if self.rate_limit_requests == 0 {
            anyhow::bail!("config rate_limit_requests must be at least 1");
        }
        if self.max_fetch_attempts == 0 {
            anyhow::bail!("config max_fetch_attempts must be at least 1");
        }
        if !(0..3600).contains(&self.grace_secs) {
            anyhow::bail!("config grace_secs must lie within [0, 3600)");
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = ScannerConfig::default();
        config.validate().expect("defaults must validate");
        assert_eq!(config.interval, "1h");
        assert_eq!(config.workers, 5);
        assert_eq!(config.grace_secs, 60);
    }

    #[test]
    fn partial_json_fills_remaining_defaults() {
        let config: ScannerConfig =
            serde_json::from_str(r#"{ "workers": 8, "stream_dump": true }"#).unwrap();
        assert_eq!(config.workers, 8);
        assert!(config.stream_dump);
        assert_eq!(config.interval, "1h");
        assert_eq!(config.rate_limit_requests, 180);
    }

    #[test]
    fn zero_workers_rejected() {
        let config = ScannerConfig {
            workers: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn unknown_interval_rejected() {
        let config = ScannerConfig {
            interval: "90m".into(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn out_of_range_grace_rejected() {
        let config = ScannerConfig {
            grace_secs: 7200,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
