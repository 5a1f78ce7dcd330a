// =============================================================================
// Candle Dump Stream — raw spot.candlesticks frames to stdout
// =============================================================================
//
// Optional diagnostic feed, independent of the polling core: subscribes the
// configured symbols to the exchange's candlestick WebSocket channel and
// dumps every text frame as-is. Runs until the stream disconnects or errors,
// then returns so the caller (main.rs) can handle reconnection.
// =============================================================================

use anyhow::{Context, Result};
use chrono::Utc;
use futures_util::{SinkExt, StreamExt};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};

/// Connect, subscribe every symbol, and dump incoming frames.
pub async fn run_candle_dump(ws_url: &str, interval: &str, symbols: &[String]) -> Result<()> {
    info!(url = %ws_url, count = symbols.len(), "connecting to candlestick WebSocket");

    let (ws_stream, _response) = connect_async(ws_url)
        .await
        .context("failed to connect to candlestick WebSocket")?;
    let (mut write, mut read) = ws_stream.split();

    for symbol in symbols {
        let msg = subscribe_message(interval, symbol, Utc::now().timestamp());
        debug!(symbol = %symbol, "subscribing to spot.candlesticks");
        write
            .send(Message::Text(msg))
            .await
            .with_context(|| format!("failed to subscribe {symbol}"))?;
    }

    info!("candle dump stream subscribed");

    loop {
        match read.next().await {
            Some(Ok(Message::Text(text))) => println!("{text}"),
            // Ping / Pong / Binary / Close frames — tungstenite answers pings
            // automatically.
            Some(Ok(_)) => {}
            Some(Err(e)) => {
                return Err(e).context("candle dump WebSocket read error");
            }
            None => {
                warn!("candle dump WebSocket stream ended");
                return Ok(());
            }
        }
    }
}

/// Build one `spot.candlesticks` subscription request.
fn subscribe_message(interval: &str, symbol: &str, time: i64) -> String {
    serde_json::json!({
        "time": time,
        "channel": "spot.candlesticks",
        "event": "subscribe",
        "payload": [interval, symbol],
    })
    .to_string()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subscribe_message_shape() {
        let msg = subscribe_message("1h", "BTC_USDT", 1_700_000_000);
        let parsed: serde_json::Value = serde_json::from_str(&msg).expect("valid JSON");

        assert_eq!(parsed["time"], 1_700_000_000);
        assert_eq!(parsed["channel"], "spot.candlesticks");
        assert_eq!(parsed["event"], "subscribe");
        assert_eq!(parsed["payload"][0], "1h");
        assert_eq!(parsed["payload"][1], "BTC_USDT");
    }
}
