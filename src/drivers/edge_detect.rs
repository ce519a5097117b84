//! Software edge detection and debounce for a sampled input line.
//!
//! Shared by the adapters that have no hardware glitch filter.  The
//! detector sees every sample of the line, tracks the last level, and
//! accepts a qualifying transition only if no edge was accepted within
//! the debounce window before it.  Bounce transitions inside the window
//! are swallowed but still update the tracked level, so a settled line
//! needs a real release and re-press to fire again.

use std::time::Duration;

use crate::app::ports::EdgePolarity;

#[derive(Debug, Clone)]
pub struct EdgeDetector {
    polarity: EdgePolarity,
    level: bool,
    window: Duration,
    last_accepted: Option<Duration>,
}

impl EdgeDetector {
    /// `initial` is the line level at the time the detector is armed.
    pub fn new(polarity: EdgePolarity, initial: bool, window_ms: u32) -> Self {
        Self {
            polarity,
            level: initial,
            window: Duration::from_millis(u64::from(window_ms)),
            last_accepted: None,
        }
    }

    pub fn polarity(&self) -> EdgePolarity {
        self.polarity
    }

    /// Change the window.  Takes effect for the next sample; `0`
    /// disables filtering.
    pub fn set_window(&mut self, window_ms: u32) {
        self.window = Duration::from_millis(u64::from(window_ms));
    }

    /// Feed one sample taken at `now`.  Returns `true` if it completes a
    /// qualifying, non-bouncing edge.
    pub fn sample(&mut self, level: bool, now: Duration) -> bool {
        let from = self.level;
        self.level = level;
        if !self.polarity.matches(from, level) {
            return false;
        }

        let bouncing = self
            .last_accepted
            .is_some_and(|prev| now.saturating_sub(prev) < self.window);
        if bouncing {
            return false;
        }

        self.last_accepted = Some(now);
        true
    }
}
