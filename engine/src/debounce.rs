use std::time::{Duration, Instant};

/// Drops signals that arrive within `interval` of the previous signal.
///
/// The window is measured from the last signal *seen*, not the last one accepted,
/// so a burst of closely spaced signals collapses into its first element.
#[derive(Debug, Clone)]
pub struct Debouncer {
    interval: Duration,
    last_seen: Option<Instant>,
}

impl Debouncer {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_seen: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Returns true if the signal at `now` should be forwarded.
    pub fn accept(&mut self, now: Instant) -> bool {
        let accepted = match self.last_seen {
            Some(prev) => now.saturating_duration_since(prev) >= self.interval,
            None => true,
        };
        self.last_seen = Some(now);
        accepted
    }

    pub fn reset(&mut self) {
        self.last_seen = None;
    }
}
