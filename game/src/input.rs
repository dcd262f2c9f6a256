//! Collapses pointer and keyboard events into a single debounced "activate" signal.

use std::fmt;
use std::time::{Duration, Instant};

use engine::debounce::Debouncer;

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(16);

/// Key codes that count as an activation. Anything else is ignored outright.
pub const ACTIVATION_KEYS: [&str; 4] = ["Space", "Enter", "ArrowUp", "KeyW"];

pub fn is_activation_key(code: &str) -> bool {
    ACTIVATION_KEYS.contains(&code)
}

pub struct InputAdapter {
    debounce: Debouncer,
    callback: Option<Box<dyn FnMut()>>,
}

impl fmt::Debug for InputAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InputAdapter")
            .field("debounce", &self.debounce)
            .field("enabled", &self.is_enabled())
            .finish()
    }
}

impl Default for InputAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl InputAdapter {
    pub fn new() -> Self {
        Self::with_interval(DEFAULT_DEBOUNCE)
    }

    pub fn with_interval(interval: Duration) -> Self {
        Self {
            debounce: Debouncer::new(interval),
            callback: None,
        }
    }

    /// Starts forwarding activations to `callback`, replacing any previous one.
    pub fn enable(&mut self, callback: impl FnMut() + 'static) {
        self.callback = Some(Box::new(callback));
        self.debounce.reset();
    }

    pub fn disable(&mut self) {
        self.callback = None;
    }

    pub fn is_enabled(&self) -> bool {
        self.callback.is_some()
    }

    pub fn pointer_down(&mut self, now: Instant) -> bool {
        self.signal(now)
    }

    pub fn key_down(&mut self, code: &str, now: Instant) -> bool {
        if !is_activation_key(code) {
            return false;
        }
        self.signal(now)
    }

    /// Returns true if the callback ran.
    fn signal(&mut self, now: Instant) -> bool {
        let Some(callback) = self.callback.as_mut() else {
            return false;
        };
        if !self.debounce.accept(now) {
            log::debug!("activation debounced");
            return false;
        }
        callback();
        true
    }
}
