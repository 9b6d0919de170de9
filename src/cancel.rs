//! Cooperative cancellation with cancellable timed waits.

use parking_lot::{Condvar, Mutex};
use std::sync::Arc;
use std::time::{Duration, Instant};

struct Inner {
    cancelled: Mutex<bool>,
    cv: Condvar,
}

/// Cloneable cancel flag. `cancel()` wakes every pending `wait()` immediately.
#[derive(Clone)]
pub struct CancelToken {
    inner: Arc<Inner>,
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

impl CancelToken {
    pub fn new() -> Self {
        Self { inner: Arc::new(Inner { cancelled: Mutex::new(false), cv: Condvar::new() }) }
    }

    /// Returns `true` if the token had already been cancelled before this call.
    pub fn cancel(&self) -> bool {
        let mut g = self.inner.cancelled.lock();
        let already = std::mem::replace(&mut *g, true);
        self.inner.cv.notify_all();
        already
    }

    pub fn is_cancelled(&self) -> bool {
        *self.inner.cancelled.lock()
    }

    /// Block for `dur` unless cancelled first. Returns `true` if the full wait elapsed.
    pub fn wait(&self, dur: Duration) -> bool {
        let deadline = Instant::now() + dur;
        let mut g = self.inner.cancelled.lock();
        while !*g {
            if self.inner.cv.wait_until(&mut g, deadline).timed_out() {
                return !*g;
            }
        }
        false
    }
}
