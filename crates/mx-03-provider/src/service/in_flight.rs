//! In-flight counter with a drain barrier.

use parking_lot::{Condvar, Mutex};

/// Counts work that has been accepted but not finished.
///
/// `enter` on submit, `exit` on completion, `wait_drained` blocks until the
/// count is back to zero.
#[derive(Debug, Default)]
pub struct InFlight {
    count: Mutex<usize>,
    drained: Condvar,
}

impl InFlight {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enter(&self) {
        *self.count.lock() += 1;
    }

    pub fn exit(&self) {
        let mut count = self.count.lock();
        *count = count.saturating_sub(1);
        if *count == 0 {
            self.drained.notify_all();
        }
    }

    pub fn current(&self) -> usize {
        *self.count.lock()
    }

    pub fn wait_drained(&self) {
        let mut count = self.count.lock();
        while *count > 0 {
            self.drained.wait(&mut count);
        }
    }
}
