// =============================================================================
// Scanner — work queue, worker pool, and hourly scheduler
// =============================================================================

pub mod pool;
pub mod queue;
pub mod scheduler;

pub use queue::WorkQueue;
pub use scheduler::Scheduler;

use std::sync::Arc;

use parking_lot::RwLock;

use crate::market_data::SymbolStatus;

/// A symbol's status as it travels through the work queue.
///
/// The lock is uncontended by construction: each status is enqueued once per
/// cycle, handed to exactly one worker, and only read by the scheduler after
/// the cycle has drained.
pub type SharedStatus = Arc<RwLock<SymbolStatus>>;
