//! Wall-clock timestamp type.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Milliseconds since the Unix epoch.
///
/// All persisted timestamps use this representation so rows written by one
/// process can be compared against clocks read in another.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct Timestamp(pub u64);

impl Timestamp {
    /// The epoch itself.
    pub const ZERO: Self = Timestamp(0);

    /// Read the system clock.
    pub fn now() -> Self {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or(Duration::ZERO)
            .as_millis() as u64;
        Timestamp(millis)
    }

    /// Create from milliseconds since the epoch.
    pub fn from_millis(millis: u64) -> Self {
        Timestamp(millis)
    }

    /// Milliseconds since the epoch.
    pub fn as_millis(&self) -> u64 {
        self.0
    }

    /// This timestamp shifted forward by a duration.
    pub fn saturating_add(&self, d: Duration) -> Self {
        Timestamp(self.0.saturating_add(d.as_millis() as u64))
    }

    /// Time elapsed from `earlier` to `self`, zero if `earlier` is later.
    pub fn saturating_since(&self, earlier: Timestamp) -> Duration {
        Duration::from_millis(self.0.saturating_sub(earlier.0))
    }

    /// Whether at least `d` has elapsed between `earlier` and `self`.
    pub fn elapsed_at_least(&self, earlier: Timestamp, d: Duration) -> bool {
        self.saturating_since(earlier) >= d
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}ms", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_saturating_add_and_since() {
        let t0 = Timestamp::from_millis(1_000);
        let t1 = t0.saturating_add(Duration::from_secs(60));
        assert_eq!(t1, Timestamp::from_millis(61_000));
        assert_eq!(t1.saturating_since(t0), Duration::from_secs(60));
        assert_eq!(t0.saturating_since(t1), Duration::ZERO);
    }

    #[test]
    fn test_elapsed_at_least() {
        let t0 = Timestamp::from_millis(0);
        let t1 = Timestamp::from_millis(90_000);
        assert!(t1.elapsed_at_least(t0, Duration::from_secs(90)));
        assert!(!t1.elapsed_at_least(t0, Duration::from_secs(91)));
    }
}
