// =============================================================================
// Scheduler — hourly scan cycles aligned to the top of the hour
// =============================================================================
//
// Two states: Idle (sleeping until the next fire time) and Cycle-running
// (queue dispatched, waiting for drain). The first cycle fires immediately at
// startup; every later cycle fires at the top of the hour plus a grace
// offset, giving the exchange time to finalize the just-closed bar. Fire
// times are recomputed from wall-clock "now" after every cycle, so a slow
// cycle delays but never skews the cadence, and cycles can never overlap.
//
// Spawned once at engine startup:
//
//   tokio::spawn(scheduler.run());
//
// =============================================================================

use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::scanner::{SharedStatus, WorkQueue};
use crate::types::SpikeAlert;

/// Hourly scan scheduler. Owns the watch list; the worker pool owns the
/// fetching.
pub struct Scheduler {
    queue: Arc<WorkQueue>,
    watchlist: Vec<SharedStatus>,
    grace_secs: i64,
}

impl Scheduler {
    pub fn new(queue: Arc<WorkQueue>, watchlist: Vec<SharedStatus>, grace_secs: i64) -> Self {
        Self {
            queue,
            watchlist,
            grace_secs,
        }
    }

    /// Run forever: immediate first cycle, then realign to hour + grace.
    pub async fn run(self) {
        info!(
            symbols = self.watchlist.len(),
            grace_secs = self.grace_secs,
            "scheduler started — running initial cycle"
        );

        loop {
            self.run_cycle().await;

            let now = Utc::now();
            let next = next_fire_after(now, self.grace_secs);
            let wait = (next - now)
                .to_std()
                .unwrap_or_else(|_| std::time::Duration::from_secs(0));
            info!(next_fire = %next, "cycle complete — idle until next fire");
            tokio::time::sleep(wait).await;
        }
    }

    /// One full pass: dispatch every symbol, wait for the queue to drain,
    /// then report all surges found.
    async fn run_cycle(&self) {
        let started = Instant::now();

        for status in &self.watchlist {
            self.queue.push(status.clone());
        }
        self.queue.wait_drained().await;

        let alerts = collect_surges(&self.watchlist);
        for alert in &alerts {
            println!("{alert}");
        }
        if alerts.is_empty() {
            info!(
                symbols = self.watchlist.len(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "scan cycle finished — no surges"
            );
        } else {
            warn!(
                symbols = self.watchlist.len(),
                surges = alerts.len(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "scan cycle finished — volume surges detected"
            );
        }
    }
}

/// Scan every symbol's window for a volume surge.
fn collect_surges(watchlist: &[SharedStatus]) -> Vec<SpikeAlert> {
    watchlist
        .iter()
        .filter_map(|status| status.read().surge())
        .collect()
}

/// The next fire instant strictly after `now`: the current hour's top plus
/// `grace_secs` if that is still ahead, otherwise the next hour's.
///
/// Always derived from the wall clock passed in, never from accumulated
/// sleeps, so repeated cycles cannot drift.
pub fn next_fire_after(now: DateTime<Utc>, grace_secs: i64) -> DateTime<Utc> {
    let hour_start = now.timestamp().div_euclid(3600) * 3600;
    let mut fire = hour_start + grace_secs;
    if fire <= now.timestamp() {
        fire += 3600;
    }
    DateTime::from_timestamp(fire, 0).expect("fire time is a valid UNIX timestamp")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market_data::{Candle, SymbolStatus};
    use chrono::{TimeZone, Timelike};
    use parking_lot::RwLock;

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
    fn fire_lands_on_next_hour_plus_grace() {
        let now = Utc.with_ymd_and_hms(2024, 3, 5, 10, 23, 45).unwrap();
        let fire = next_fire_after(now, 60);
        assert_eq!(fire, Utc.with_ymd_and_hms(2024, 3, 5, 11, 1, 0).unwrap());
    }

    #[test]
    fn fire_within_grace_window_uses_current_hour() {
        // 10:00:30 is before 10:01:00, so the current hour's offset still
        // lies ahead.
        let now = Utc.with_ymd_and_hms(2024, 3, 5, 10, 0, 30).unwrap();
        let fire = next_fire_after(now, 60);
        assert_eq!(fire, Utc.with_ymd_and_hms(2024, 3, 5, 10, 1, 0).unwrap());
    }

    #[test]
    fn fire_exactly_at_offset_moves_to_next_hour() {
        let now = Utc.with_ymd_and_hms(2024, 3, 5, 10, 1, 0).unwrap();
        let fire = next_fire_after(now, 60);
        assert_eq!(fire, Utc.with_ymd_and_hms(2024, 3, 5, 11, 1, 0).unwrap());
    }

    #[test]
    fn chained_fires_never_drift() {
        let mut t = Utc.with_ymd_and_hms(2024, 3, 5, 9, 47, 13).unwrap();
        let mut previous: Option<DateTime<Utc>> = None;

        for _ in 0..1000 {
            t = next_fire_after(t, 60);
            assert_eq!(t.minute(), 1);
            assert_eq!(t.second(), 0);
            if let Some(prev) = previous {
                assert_eq!((t - prev).num_seconds(), 3600);
            }
            previous = Some(t);
        }
    }

    #[test]
    fn day_boundary_rolls_over_cleanly() {
        let now = Utc.with_ymd_and_hms(2024, 3, 5, 23, 59, 59).unwrap();
        let fire = next_fire_after(now, 60);
        assert_eq!(fire, Utc.with_ymd_and_hms(2024, 3, 6, 0, 1, 0).unwrap());
    }

    #[test]
    fn collect_surges_reports_only_doubled_symbols() {
        let make = |symbol: &str, prev: f64, latest: f64| -> SharedStatus {
            let mut status = SymbolStatus::new(symbol);
            status.push(candle(3600, prev));
            status.push(candle(7200, latest));
            Arc::new(RwLock::new(status))
        };

        let watchlist = vec![
            make("DOUBLED", 100.0, 250.0),
            make("FLAT", 100.0, 110.0),
            make("EXACT", 50.0, 100.0),
        ];

        let alerts = collect_surges(&watchlist);
        let symbols: Vec<_> = alerts.iter().map(|a| a.symbol.as_str()).collect();
        assert_eq!(symbols, vec!["DOUBLED", "EXACT"]);
    }
}
