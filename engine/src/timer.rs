use std::time::Duration;

use serde::{Deserialize, Serialize};

/// A duration budget advanced by explicit ticks rather than wall-clock callbacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Countdown {
    #[serde(with = "crate::serde_millis")]
    elapsed: Duration,
    #[serde(with = "crate::serde_millis")]
    limit: Duration,
}

impl Countdown {
    pub fn new(limit: Duration) -> Self {
        Self {
            elapsed: Duration::ZERO,
            limit,
        }
    }

    pub fn reset(&mut self) {
        self.elapsed = Duration::ZERO;
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn limit(&self) -> Duration {
        self.limit
    }

    pub fn remaining(&self) -> Duration {
        self.limit.saturating_sub(self.elapsed)
    }

    pub fn is_done(&self) -> bool {
        self.elapsed >= self.limit
    }

    /// Advances the countdown; returns true on the tick that crosses the limit.
    pub fn tick(&mut self, dt: Duration) -> bool {
        if self.is_done() {
            return false;
        }
        self.elapsed = self.elapsed.saturating_add(dt).min(self.limit);
        self.is_done()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tick_reports_crossing_exactly_once() {
        let mut c = Countdown::new(Duration::from_millis(300));
        assert!(!c.tick(Duration::from_millis(100)));
        assert!(!c.tick(Duration::from_millis(150)));
        assert!(c.tick(Duration::from_millis(100)));
        assert!(!c.tick(Duration::from_millis(100)));
        assert!(c.is_done());
        assert_eq!(c.elapsed(), Duration::from_millis(300));
        assert_eq!(c.remaining(), Duration::ZERO);
    }

    #[test]
    fn zero_limit_is_done_immediately() {
        let mut c = Countdown::new(Duration::ZERO);
        assert!(c.is_done());
        assert!(!c.tick(Duration::from_millis(1)));
    }

    #[test]
    fn reset_clears_elapsed() {
        let mut c = Countdown::new(Duration::from_secs(2));
        c.tick(Duration::from_secs(1));
        c.reset();
        assert_eq!(c.elapsed(), Duration::ZERO);
        assert_eq!(c.remaining(), Duration::from_secs(2));
    }
}
