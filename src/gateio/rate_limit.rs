// =============================================================================
// Rate Limiter — global fixed-window ceiling on outbound API requests
// =============================================================================
//
// Gate.io allows 200 public requests per rolling 10 seconds per endpoint
// group. We enforce "at most K admissions per window T" across every worker
// through one shared instance: the check-and-increment is a single critical
// section, the wait happens outside the lock.
//
// This is a fixed-window limiter anchored at the recorded window start, not
// a sliding one: up to 2K admissions can land across a window boundary in
// the worst case, which is why the default ceiling stays below the remote
// limit.
// =============================================================================

use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::Instant;
use tracing::{debug, trace};

/// Slack added past the window end before a blocked caller re-checks.
const REARM_MARGIN: Duration = Duration::from_millis(50);

struct WindowState {
    window_start: Instant,
    count: u32,
}

/// Shared fixed-window rate limiter.
///
/// Constructed once at startup and handed to every caller via `Arc`; the
/// shared window state is the single synchronization point that keeps the
/// ceiling global no matter how many workers exist.
pub struct RateLimiter {
    max_requests: u32,
    window: Duration,
    state: Mutex<WindowState>,
}

impl RateLimiter {
    /// Create a limiter admitting at most `max_requests` per `window`.
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            state: Mutex::new(WindowState {
                window_start: Instant::now(),
                count: 0,
            }),
        }
    }

    /// Block until an admission is safe, then record it.
    ///
    /// Never fails; self-throttling is not an error. Safe for any number of
    /// concurrent callers.
    pub async fn admit(&self) {
        loop {
            let rearm_at = {
                let mut state = self.state.lock();
                let now = Instant::now();

                if now.duration_since(state.window_start) > self.window {
                    state.window_start = now;
                    state.count = 1;
                    trace!("rate-limit window reset");
                    return;
                }

                if state.count < self.max_requests {
                    state.count += 1;
                    return;
                }

                state.window_start + self.window + REARM_MARGIN
            };

            debug!(
                max_requests = self.max_requests,
                "rate-limit window full — waiting for next window"
            );
            tokio::time::sleep_until(rearm_at).await;
        }
    }
}

// ---------------------------------------------------------------------------
// Tests (paused tokio clock — admissions observed against synthetic time)
// ---------------------------------------------------------------------------
