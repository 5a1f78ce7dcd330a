// =============================================================================
// Shared types used across the Spotwatch scanner
// =============================================================================

use serde::Serialize;

/// A detected cycle-over-cycle volume surge for one symbol.
///
/// Produced by `SymbolStatus::surge()` once per scan cycle when the latest
/// closed hourly bar carries at least double the previous bar's volume.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpikeAlert {
    pub symbol: String,
    pub previous_volume: f64,
    pub latest_volume: f64,
}

impl std::fmt::Display for SpikeAlert {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} was {} and now is {}",
            self.symbol, self.previous_volume, self.latest_volume
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alert_display_format() {
        let alert = SpikeAlert {
            symbol: "BTC_USDT".into(),
            previous_volume: 100.0,
            latest_volume: 250.0,
        };
        assert_eq!(alert.to_string(), "BTC_USDT was 100 and now is 250");
    }

    #[test]
    fn alert_display_keeps_fractional_volumes() {
        let alert = SpikeAlert {
            symbol: "ETH_BTC".into(),
            previous_volume: 12.5,
            latest_volume: 31.25,
        };
        assert_eq!(alert.to_string(), "ETH_BTC was 12.5 and now is 31.25");
    }
}
