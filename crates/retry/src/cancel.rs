//! Cancellation for blocking retry loops
//!
//! A `CancellationToken` is shared between the caller and any number of
//! operations. Cancelling wakes every operation sleeping in a backoff, so the
//! loop aborts promptly instead of finishing its delay. Operations only
//! observe cancellation between attempts, never during a store call.

use parking_lot::{Condvar, Mutex};
use std::sync::Arc;
use std::time::{Duration, Instant};

#[derive(Debug, Default)]
struct Inner {
    cancelled: Mutex<bool>,
    wake: Condvar,
}

/// Cloneable cancellation signal
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    inner: Arc<Inner>,
}

impl CancellationToken {
    /// Create a token in the non-cancelled state
    pub fn new() -> Self {
        Self::default()
    }

    /// Signal cancellation and wake all sleepers
    pub fn cancel(&self) {
        let mut cancelled = self.inner.cancelled.lock();
        *cancelled = true;
        self.inner.wake.notify_all();
    }

    /// Whether cancellation has been signalled
    pub fn is_cancelled(&self) -> bool {
        *self.inner.cancelled.lock()
    }

    /// Sleep for `timeout` unless cancelled first
    ///
    /// Returns `true` if the sleep ended because of cancellation. A timeout
    /// too large to express as an instant sleeps until cancelled.
    pub fn sleep(&self, timeout: Duration) -> bool {
        let until = Instant::now().checked_add(timeout);
        let mut cancelled = self.inner.cancelled.lock();
        while !*cancelled {
            match until {
                Some(until) => {
                    if self.inner.wake.wait_until(&mut cancelled, until).timed_out() {
                        break;
                    }
                }
                None => self.inner.wake.wait(&mut cancelled),
            }
        }
        *cancelled
    }
}
