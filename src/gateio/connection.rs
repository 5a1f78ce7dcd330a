// =============================================================================
// Connection Manager — owns the single reusable HTTP client
// =============================================================================
//
// Explicit {Disconnected, Connected} state machine. `handle()` lazily builds
// the client on first use; a transport-level failure reported through
// `mark_disconnected()` drops it, and the next `handle()` call builds a fresh
// replacement. The client is only ever swapped wholesale, never repaired in
// place. In-flight requests are not cancelled on a swap — callers treat an
// in-flight failure as retryable.
// =============================================================================

use std::time::Duration;

use anyhow::{Context, Result};
use parking_lot::RwLock;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use tracing::{info, warn};

/// Per-request timeout on the underlying transport.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

enum ConnState {
    Disconnected,
    Connected(reqwest::Client),
}

/// Owner of the one live connection to the remote API.
pub struct ConnectionManager {
    state: RwLock<ConnState>,
}

impl ConnectionManager {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(ConnState::Disconnected),
        }
    }

    /// Return the live client, building one if currently disconnected.
    pub fn handle(&self) -> Result<reqwest::Client> {
        if let ConnState::Connected(client) = &*self.state.read() {
            return Ok(client.clone());
        }

        let mut state = self.state.write();
        // Another caller may have connected while we waited for the lock.
        if let ConnState::Connected(client) = &*state {
            return Ok(client.clone());
        }

        let client = Self::build_client()?;
        info!("API connection established");
        *state = ConnState::Connected(client.clone());
        Ok(client)
    }

    /// Record a transport-level failure and discard the current connection.
    /// The next `handle()` call reconnects lazily.
    pub fn mark_disconnected(&self, err: &anyhow::Error) {
        warn!(error = %err, "transport failure — dropping API connection");
        *self.state.write() = ConnState::Disconnected;
    }

    #[cfg(test)]
    pub fn is_connected(&self) -> bool {
        matches!(&*self.state.read(), ConnState::Connected(_))
    }

    fn build_client() -> Result<reqwest::Client> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        reqwest::Client::builder()
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("failed to build HTTP client")
    }
}

impl Default for ConnectionManager {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_disconnected_and_connects_lazily() {
        let conn = ConnectionManager::new();
        assert!(!conn.is_connected());

        conn.handle().expect("client should build");
        assert!(conn.is_connected());
    }

    #[test]
    fn transport_error_forces_reconnect_on_next_use() {
        let conn = ConnectionManager::new();
        conn.handle().expect("client should build");

        conn.mark_disconnected(&anyhow::anyhow!("connection reset by peer"));
        assert!(!conn.is_connected());

        conn.handle().expect("client should rebuild");
        assert!(conn.is_connected());
    }
}
