//! Shared control state.
//!
//! One record, three writers: the configuration surface owns the tunables
//! (`mode`, `blink_period_ms`, `burst_count`, debounce), the edge handler
//! owns the press statistics, and the actuation task owns `led_on` and
//! `burst_active`.  Every field is its own atomic so no reader ever sees a
//! torn value; there is no cross-field consistency beyond last-write-wins.
//!
//! The trigger flag is the hand-off: the edge handler publishes its
//! statistics and then raises the flag with `Release`; the task takes it
//! with `Acquire`, so a burst never starts before the press that caused it
//! is visible.

use core::fmt::Write as _;
use core::sync::atomic::{AtomicBool, AtomicU8, AtomicU32, Ordering};
use std::time::Duration;

use portable_atomic::AtomicU64;

use crate::config::ControllerConfig;

use super::mode::Mode;

pub struct ControlState {
    // Written by the configuration surface.
    mode: AtomicU8,
    blink_period_ms: AtomicU32,
    burst_count: AtomicU32,
    debounce_enabled: AtomicBool,
    debounce_window_ms: AtomicU32,

    // Written by the edge handler.
    press_count: AtomicU32,
    last_press_ns: AtomicU64,
    inter_press_ns: AtomicU64,
    trigger: AtomicBool,
    dropped_triggers: AtomicU32,

    // Written by the actuation task.
    led_on: AtomicBool,
    burst_active: AtomicBool,
}

/// Point-in-time copy of every field, for logging and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateSnapshot {
    pub mode: Mode,
    pub blink_period_ms: u32,
    pub burst_count: u32,
    pub debounce_enabled: bool,
    pub debounce_window_ms: u32,
    pub press_count: u32,
    pub last_press: Duration,
    pub inter_press_interval: Duration,
    pub led_on: bool,
    pub burst_active: bool,
    pub dropped_triggers: u32,
}

impl ControlState {
    /// Build the start-up record.  `started_at` seeds `last_press` so the
    /// first interval measures time since start.
    pub fn new(config: &ControllerConfig, started_at: Duration) -> Self {
        Self {
            mode: AtomicU8::new(config.mode as u8),
            blink_period_ms: AtomicU32::new(config.blink_period_ms),
            burst_count: AtomicU32::new(config.burst_count),
            debounce_enabled: AtomicBool::new(config.debounce_enabled),
            debounce_window_ms: AtomicU32::new(config.debounce_window_ms),
            press_count: AtomicU32::new(0),
            last_press_ns: AtomicU64::new(as_nanos(started_at)),
            inter_press_ns: AtomicU64::new(0),
            trigger: AtomicBool::new(false),
            dropped_triggers: AtomicU32::new(0),
            led_on: AtomicBool::new(false),
            burst_active: AtomicBool::new(false),
        }
    }

    // ── Tunables ──────────────────────────────────────────────

    pub fn mode(&self) -> Mode {
        Mode::from_raw(self.mode.load(Ordering::Relaxed))
    }

    pub fn set_mode(&self, mode: Mode) {
        self.mode.store(mode as u8, Ordering::Relaxed);
    }

    pub fn blink_period_ms(&self) -> u32 {
        self.blink_period_ms.load(Ordering::Relaxed)
    }

    /// Callers validate `period_ms > 0`.
    pub fn set_blink_period_ms(&self, period_ms: u32) {
        debug_assert!(period_ms > 0);
        self.blink_period_ms.store(period_ms, Ordering::Relaxed);
    }

    pub fn burst_count(&self) -> u32 {
        self.burst_count.load(Ordering::Relaxed)
    }

    pub fn set_burst_count(&self, count: u32) {
        self.burst_count.store(count, Ordering::Relaxed);
    }

    pub fn debounce_enabled(&self) -> bool {
        self.debounce_enabled.load(Ordering::Relaxed)
    }

    pub fn set_debounce_enabled(&self, enabled: bool) {
        self.debounce_enabled.store(enabled, Ordering::Relaxed);
    }

    pub fn debounce_window_ms(&self) -> u32 {
        self.debounce_window_ms.load(Ordering::Relaxed)
    }

    pub fn set_debounce_window_ms(&self, window_ms: u32) {
        self.debounce_window_ms.store(window_ms, Ordering::Relaxed);
    }

    /// Window to program into the I/O port: the configured window while
    /// enabled, zero otherwise.
    pub fn effective_debounce_ms(&self) -> u32 {
        if self.debounce_enabled() {
            self.debounce_window_ms()
        } else {
            0
        }
    }

    // ── Press statistics ──────────────────────────────────────

    pub fn press_count(&self) -> u32 {
        self.press_count.load(Ordering::Relaxed)
    }

    /// External reset / overwrite of the counter.
    pub fn set_press_count(&self, count: u32) {
        self.press_count.store(count, Ordering::Relaxed);
    }

    pub fn last_press(&self) -> Duration {
        Duration::from_nanos(self.last_press_ns.load(Ordering::Acquire))
    }

    pub fn inter_press_interval(&self) -> Duration {
        Duration::from_nanos(self.inter_press_ns.load(Ordering::Acquire))
    }

    /// Record an accepted press at `now`.  Lock-free; returns the new
    /// (wrapping) press count.
    pub fn record_press(&self, now: Duration) -> u32 {
        let now_ns = as_nanos(now);
        let prev_ns = self.last_press_ns.swap(now_ns, Ordering::AcqRel);
        self.inter_press_ns
            .store(now_ns.saturating_sub(prev_ns), Ordering::Release);
        self.press_count.fetch_add(1, Ordering::Relaxed).wrapping_add(1)
    }

    // ── Trigger hand-off ──────────────────────────────────────

    /// Mark a burst request.  Several raises before the task takes it
    /// coalesce into one.
    pub fn raise_trigger(&self) {
        self.trigger.store(true, Ordering::Release);
    }

    /// Consume a pending trigger.
    pub fn take_trigger(&self) -> bool {
        self.trigger.swap(false, Ordering::Acquire)
    }

    pub fn trigger_pending(&self) -> bool {
        self.trigger.load(Ordering::Acquire)
    }

    pub fn dropped_triggers(&self) -> u32 {
        self.dropped_triggers.load(Ordering::Relaxed)
    }

    pub(crate) fn note_dropped_trigger(&self) {
        self.dropped_triggers.fetch_add(1, Ordering::Relaxed);
    }

    // ── Actuation status ──────────────────────────────────────

    pub fn led_on(&self) -> bool {
        self.led_on.load(Ordering::Relaxed)
    }

    pub(crate) fn set_led_on(&self, on: bool) {
        self.led_on.store(on, Ordering::Relaxed);
    }

    pub fn burst_active(&self) -> bool {
        self.burst_active.load(Ordering::Acquire)
    }

    pub(crate) fn set_burst_active(&self, active: bool) {
        self.burst_active.store(active, Ordering::Release);
    }

    pub fn snapshot(&self) -> StateSnapshot {
        StateSnapshot {
            mode: self.mode(),
            blink_period_ms: self.blink_period_ms(),
            burst_count: self.burst_count(),
            debounce_enabled: self.debounce_enabled(),
            debounce_window_ms: self.debounce_window_ms(),
            press_count: self.press_count(),
            last_press: self.last_press(),
            inter_press_interval: self.inter_press_interval(),
            led_on: self.led_on(),
            burst_active: self.burst_active(),
            dropped_triggers: self.dropped_triggers(),
        }
    }
}

fn as_nanos(d: Duration) -> u64 {
    // Saturates in the year 2554.
    u64::try_from(d.as_nanos()).unwrap_or(u64::MAX)
}

// ───────────────────────────────────────────────────────────────
// Surface formatting
// ───────────────────────────────────────────────────────────────

/// `HH:MM:SS.nnnnnnnnn` (UTC time of day).
pub fn format_time_of_day(t: Duration) -> heapless::String<32> {
    let secs = t.as_secs();
    let mut out = heapless::String::new();
    // 18 chars always fit in 32.
    let _ = write!(
        out,
        "{:02}:{:02}:{:02}.{:09}",
        (secs / 3600) % 24,
        (secs / 60) % 60,
        secs % 60,
        t.subsec_nanos()
    );
    out
}

/// `S.nnnnnnnnn` seconds.
pub fn format_interval(d: Duration) -> heapless::String<32> {
    let mut out = heapless::String::new();
    // u64::MAX seconds is 20 digits + 10 = 30 chars.
    let _ = write!(out, "{}.{:09}", d.as_secs(), d.subsec_nanos());
    out
}
