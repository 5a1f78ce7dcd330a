// =============================================================================
// SymbolStatus — two-slot candle window + volume-surge predicate
// =============================================================================
//
// One instance per tradable symbol, created at startup and kept for the
// process lifetime. Slot 0 holds the newest candle seen, slot 1 the one
// before it. Workers refresh the window once per scan cycle; the scheduler
// reads `surge()` only after the cycle has drained, so the instance never
// sees concurrent writers.
// =============================================================================

use crate::market_data::Candle;
use crate::types::SpikeAlert;

/// Per-symbol sliding window of the two most recent closed candles.
#[derive(Debug, Clone)]
pub struct SymbolStatus {
    symbol: String,
    /// `[latest, previous]`; slot 0 always holds the greatest timestamp seen.
    window: [Option<Candle>; 2],
}

impl SymbolStatus {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            window: [None, None],
        }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Insert a candle into the window.
    ///
    /// A candle whose timestamp already occupies a slot is ignored, so
    /// re-fetching the same bars across cycles is a no-op. A new timestamp
    /// rotates the window left (evicting the oldest candle when both slots
    /// are full) and lands in slot 0. Callers push candles oldest-first.
    pub fn push(&mut self, candle: Candle) {
        let seen = self
            .window
            .iter()
            .flatten()
            .any(|c| c.timestamp == candle.timestamp);
        if seen {
            return;
        }

        self.window.swap(0, 1);
        self.window[0] = Some(candle);
    }

    /// Report a volume surge: the latest bar's volume at least doubled the
    /// previous bar's. Requires both slots populated; exact doubling matches.
    pub fn surge(&self) -> Option<SpikeAlert> {
        let latest = self.window[0].as_ref()?;
        let previous = self.window[1].as_ref()?;

        if latest.volume - previous.volume >= previous.volume {
            Some(SpikeAlert {
                symbol: self.symbol.clone(),
                previous_volume: previous.volume,
                latest_volume: latest.volume,
            })
        } else {
            None
        }
    }

    /// Timestamp of the newest candle in the window, if any.
    pub fn latest_timestamp(&self) -> Option<i64> {
        self.window[0].as_ref().map(|c| c.timestamp)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn candle(timestamp: i64, volume: f64) -> Candle {
        Candle {
            timestamp,
            volume,
            close: 1.0,
            high: 1.1,
            low: 0.9,
            open: 1.0,
            amount: volume,
        }
    }

    #[test]
    fn push_is_idempotent_per_timestamp() {
        let mut status = SymbolStatus::new("BTC_USDT");
        status.push(candle(3600, 100.0));
        status.push(candle(3600, 999.0));

        assert_eq!(status.latest_timestamp(), Some(3600));
        assert!(status.surge().is_none());
    }

    #[test]
    fn push_rotates_and_evicts_oldest() {
        let mut status = SymbolStatus::new("BTC_USDT");
        status.push(candle(3600, 10.0));
        status.push(candle(7200, 20.0));
        status.push(candle(10_800, 50.0));

        // Window is now [10_800, 7200]; 3600 evicted.
        let alert = status.surge().expect("50 vs 20 doubled");
        assert!((alert.previous_volume - 20.0).abs() < f64::EPSILON);
        assert!((alert.latest_volume - 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn single_candle_never_surges() {
        let mut status = SymbolStatus::new("BTC_USDT");
        status.push(candle(3600, 1_000_000.0));
        assert!(status.surge().is_none());
    }

    #[test]
    fn exact_doubling_matches() {
        let mut status = SymbolStatus::new("BTC_USDT");
        status.push(candle(3600, 100.0));
        status.push(candle(7200, 200.0));
        assert!(status.surge().is_some());
    }

    #[test]
    fn just_below_doubling_does_not_match() {
        let mut status = SymbolStatus::new("BTC_USDT");
        status.push(candle(3600, 100.0));
        status.push(candle(7200, 200.0 - 1e-9));
        assert!(status.surge().is_none());
    }

    #[test]
    fn surge_message_scenario() {
        let mut status = SymbolStatus::new("X");
        status.push(candle(3600, 100.0));
        status.push(candle(7200, 250.0));

        let alert = status.surge().expect("volume more than doubled");
        assert_eq!(alert.to_string(), "X was 100 and now is 250");
    }

    #[test]
    fn moderate_increase_does_not_surge() {
        let mut status = SymbolStatus::new("X");
        status.push(candle(3600, 100.0));
        status.push(candle(7200, 150.0));
        assert!(status.surge().is_none());
    }

    #[test]
    fn refetch_across_cycles_keeps_window_stable() {
        let mut status = SymbolStatus::new("BTC_USDT");
        // Cycle 1: bars at 3600 and 7200.
        status.push(candle(3600, 10.0));
        status.push(candle(7200, 25.0));
        // Cycle 2: the hour has not rolled over yet; same bars come back.
        status.push(candle(3600, 10.0));
        status.push(candle(7200, 25.0));

        let alert = status.surge().expect("25 vs 10 doubled");
        assert!((alert.previous_volume - 10.0).abs() < f64::EPSILON);
        assert_eq!(status.latest_timestamp(), Some(7200));
    }
}
