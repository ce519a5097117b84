//! GPIO assignments for the chase-light board.
//!
//! Single source of truth for the default line numbers.  Every default in
//! [`crate::config::ControllerConfig`] references this module rather than
//! hard-coding pin numbers.

use crate::app::ports::LineId;

// ---------------------------------------------------------------------------
// Chase LEDs (active HIGH, series resistor to ground)
// ---------------------------------------------------------------------------

pub const LED1_GPIO: LineId = 11;
pub const LED2_GPIO: LineId = 12;
pub const LED3_GPIO: LineId = 13;

// ---------------------------------------------------------------------------
// User button (external pull-down, HIGH while pressed)
// ---------------------------------------------------------------------------

/// Momentary push-button; a press is a rising edge with the default wiring.
pub const BUTTON_GPIO: LineId = 16;

/// Button sampling period for polled edge sources (milliseconds).
pub const BUTTON_POLL_MS: u64 = 1;
