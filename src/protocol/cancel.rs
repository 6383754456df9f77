//! Cooperative cancellation for blocking driver loops.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared flag checked by the driver between reads and between polls.
///
/// Clones observe the same flag, so one clone can be handed to a signal
/// handler while the driver holds another.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation of whatever the driver is blocked on.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Re-arm after a cancellation has been handled.
    pub fn reset(&self) {
        self.cancelled.store(false, Ordering::SeqCst);
    }
}
