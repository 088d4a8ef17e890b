//! Clock abstraction.
//!
//! The engine never calls `Timestamp::now()` directly; it reads time through
//! a [`Clock`] so TTL and age logic is deterministic under test.

use crate::Timestamp;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Source of the current time.
pub trait Clock: Send + Sync {
    /// The current time.
    fn now(&self) -> Timestamp;
}

/// Clock backed by the system clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Timestamp::now()
    }
}

/// Manually-driven clock for tests.
#[derive(Debug, Default)]
pub struct ManualClock {
    now_millis: AtomicU64,
}

impl ManualClock {
    /// Create a manual clock starting at the given time.
    pub fn new(start: Timestamp) -> Self {
        Self {
            now_millis: AtomicU64::new(start.as_millis()),
        }
    }

    /// Set the current time.
    pub fn set(&self, now: Timestamp) {
        self.now_millis.store(now.as_millis(), Ordering::SeqCst);
    }

    /// Advance the clock by a duration.
    pub fn advance(&self, d: Duration) {
        self.now_millis
            .fetch_add(d.as_millis() as u64, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        Timestamp::from_millis(self.now_millis.load(Ordering::SeqCst))
    }
}
