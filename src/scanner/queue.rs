// =============================================================================
// Work Queue — shared FIFO of symbols with explicit drain tracking
// =============================================================================
//
// Unbounded MPMC FIFO consumed by the worker pool. Dispatch accounting is
// explicit: popping an item moves it from the queue into the in-flight count
// under the queue lock, and `complete()` retires it. "Drained" means the
// queue is empty AND no worker still holds an item.
// =============================================================================

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;
use tokio::sync::{Notify, Semaphore};

use crate::scanner::SharedStatus;

/// Thread-safe blocking FIFO of symbol-status references.
pub struct WorkQueue {
    items: Mutex<VecDeque<SharedStatus>>,
    /// One permit per queued item; workers park here while the queue is empty.
    available: Semaphore,
    in_flight: AtomicUsize,
    drained: Notify,
}

impl WorkQueue {
    pub fn new() -> Self {
        Self {
            items: Mutex::new(VecDeque::new()),
            available: Semaphore::new(0),
            in_flight: AtomicUsize::new(0),
            drained: Notify::new(),
        }
    }

    /// Enqueue one symbol for processing.
    pub fn push(&self, status: SharedStatus) {
        self.items.lock().push_back(status);
        self.available.add_permits(1);
    }

    /// Take the next symbol, waiting while the queue is empty.
    ///
    /// The returned item counts as in flight until `complete()` is called.
    pub async fn pop(&self) -> SharedStatus {
        let permit = self
            .available
            .acquire()
            .await
            .expect("work queue semaphore is never closed");
        permit.forget();

        let mut items = self.items.lock();
        // in_flight moves up under the same lock, so drain checks never
        // observe a gap between "left the queue" and "counted in flight".
        let status = items
            .pop_front()
            .expect("semaphore permit implies a queued item");
        self.in_flight.fetch_add(1, Ordering::SeqCst);
        status
    }

    /// Retire an item previously returned by `pop()`.
    pub fn complete(&self) {
        let previous = self.in_flight.fetch_sub(1, Ordering::SeqCst);
        debug_assert!(previous > 0, "complete() without a matching pop()");
        if previous == 1 && self.items.lock().is_empty() {
            self.drained.notify_waiters();
        }
    }

    /// Resolve once the queue is empty and every dispatched item has been
    /// completed.
    pub async fn wait_drained(&self) {
        loop {
            let notified = self.drained.notified();
            if self.is_drained() {
                return;
            }
            notified.await;
        }
    }

    fn is_drained(&self) -> bool {
        let items = self.items.lock();
        items.is_empty() && self.in_flight.load(Ordering::SeqCst) == 0
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.items.lock().len()
    }
}

impl Default for WorkQueue {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
