//! Clock adapters.
//!
//! - [`SystemClock`] — wall-clock time anchored once at construction and
//!   advanced by a monotonic `Instant`, so a later NTP step cannot make
//!   press timestamps run backwards.  On ESP-IDF the anchor comes from
//!   `gettimeofday`, which libc backs with the RTC.
//! - [`ManualClock`] — test clock, advanced explicitly.

use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use portable_atomic::{AtomicU64, Ordering};

use crate::app::ports::ClockPort;

pub struct SystemClock {
    anchor: Duration,
    start: Instant,
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemClock {
    pub fn new() -> Self {
        // A clock set before 1970 is treated as the epoch itself.
        let anchor = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or(Duration::ZERO);
        Self {
            anchor,
            start: Instant::now(),
        }
    }
}

impl ClockPort for SystemClock {
    fn now(&self) -> Duration {
        self.anchor + self.start.elapsed()
    }
}

/// Hand-driven clock for tests.  Nanosecond resolution.
pub struct ManualClock {
    nanos: AtomicU64,
}

impl ManualClock {
    pub fn new(start: Duration) -> Self {
        Self {
            nanos: AtomicU64::new(to_nanos(start)),
        }
    }

    pub fn advance(&self, by: Duration) {
        self.nanos.fetch_add(to_nanos(by), Ordering::AcqRel);
    }

    /// Jump to `at`.  Moving backwards is ignored to keep the clock
    /// monotonic.
    pub fn set(&self, at: Duration) {
        self.nanos.fetch_max(to_nanos(at), Ordering::AcqRel);
    }
}

impl ClockPort for ManualClock {
    fn now(&self) -> Duration {
        Duration::from_nanos(self.nanos.load(Ordering::Acquire))
    }
}

fn to_nanos(d: Duration) -> u64 {
    u64::try_from(d.as_nanos()).unwrap_or(u64::MAX)
}
