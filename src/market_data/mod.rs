// =============================================================================
// Market data types — candles and per-symbol window state
// =============================================================================

pub mod symbol_status;

pub use symbol_status::SymbolStatus;

use anyhow::{Context, Result};

/// A single closed OHLCV candle from the Gate.io candlestick endpoint.
///
/// The wire format is an array ordered as
/// `[timestamp, volume, close, high, low, open, amount]` with every field but
/// the timestamp encoded as a JSON string.
#[derive(Debug, Clone, PartialEq)]
pub struct Candle {
    /// Bar open time, UNIX seconds. Unique key within a symbol's history.
    pub timestamp: i64,
    pub volume: f64,
    pub close: f64,
    pub high: f64,
    pub low: f64,
    pub open: f64,
    pub amount: f64,
}

impl Candle {
    /// Parse one element of the candlestick response array.
    pub fn from_entry(entry: &serde_json::Value) -> Result<Self> {
        let arr = entry.as_array().context("candlestick entry is not an array")?;
        if arr.len() < 7 {
            anyhow::bail!("candlestick entry has {} elements, expected 7", arr.len());
        }

        Ok(Self {
            timestamp: parse_i64(&arr[0], "timestamp")?,
            volume: parse_f64(&arr[1], "volume")?,
            close: parse_f64(&arr[2], "close")?,
            high: parse_f64(&arr[3], "high")?,
            low: parse_f64(&arr[4], "low")?,
            open: parse_f64(&arr[5], "open")?,
            amount: parse_f64(&arr[6], "amount")?,
        })
    }
}

/// Length of a candlestick interval string in seconds.
pub fn interval_seconds(interval: &str) -> Result<i64> {
    let secs = match interval {
        "10s" => 10,
        "1m" => 60,
        "5m" => 5 * 60,
        "15m" => 15 * 60,
        "30m" => 30 * 60,
        "1h" => 60 * 60,
        "4h" => 4 * 60 * 60,
        "8h" => 8 * 60 * 60,
        "1d" => 24 * 60 * 60,
        "7d" => 7 * 24 * 60 * 60,
        other => anyhow::bail!("unsupported candlestick interval: {other}"),
    };
    Ok(secs)
}

/// Helper: Gate.io sends numeric values as JSON strings inside candle arrays.
fn parse_f64(val: &serde_json::Value, name: &str) -> Result<f64> {
    match val {
        serde_json::Value::String(s) => s
            .parse::<f64>()
            .with_context(|| format!("failed to parse {name} as f64: {s}")),
        serde_json::Value::Number(n) => n
            .as_f64()
            .with_context(|| format!("field {name} is not a valid f64")),
        _ => anyhow::bail!("field {name} has unexpected JSON type"),
    }
}

fn parse_i64(val: &serde_json::Value, name: &str) -> Result<i64> {
    match val {
        serde_json::Value::String(s) => s
            .parse::<i64>()
            .with_context(|| format!("failed to parse {name} as i64: {s}")),
        serde_json::Value::Number(n) => n
            .as_i64()
            .with_context(|| format!("field {name} is not a valid i64")),
        _ => anyhow::bail!("field {name} has unexpected JSON type"),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parse_entry_with_string_fields() {
        let entry = json!(["1700000000", "123.456", "37020.5", "37050", "36990", "37000", "4567890.12"]);
        let candle = Candle::from_entry(&entry).expect("should parse");
        assert_eq!(candle.timestamp, 1_700_000_000);
        assert!((candle.volume - 123.456).abs() < f64::EPSILON);
        assert!((candle.close - 37020.5).abs() < f64::EPSILON);
        assert!((candle.open - 37000.0).abs() < f64::EPSILON);
    }

    #[test]
    fn parse_entry_with_numeric_timestamp() {
        let entry = json!([1700003600, "9.5", "1.0", "1.1", "0.9", "1.0", "9.6"]);
        let candle = Candle::from_entry(&entry).expect("should parse");
        assert_eq!(candle.timestamp, 1_700_003_600);
        assert!((candle.volume - 9.5).abs() < f64::EPSILON);
    }

    #[test]
    fn parse_entry_rejects_short_array() {
        let entry = json!(["1700000000", "1.0", "2.0"]);
        assert!(Candle::from_entry(&entry).is_err());
    }

    #[test]
    fn parse_entry_rejects_non_array() {
        let entry = json!({"t": 1700000000});
        assert!(Candle::from_entry(&entry).is_err());
    }

    #[test]
    fn parse_entry_rejects_bad_number() {
        let entry = json!(["1700000000", "not-a-number", "1", "1", "1", "1", "1"]);
        assert!(Candle::from_entry(&entry).is_err());
    }

    #[test]
    fn interval_seconds_known_values() {
        assert_eq!(interval_seconds("1h").unwrap(), 3600);
        assert_eq!(interval_seconds("5m").unwrap(), 300);
        assert_eq!(interval_seconds("1d").unwrap(), 86_400);
    }

    #[test]
    fn interval_seconds_rejects_unknown() {
        assert!(interval_seconds("2h").is_err());
    }
}
