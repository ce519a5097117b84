//! Configuration surface — named get/set endpoints over the shared
//! control state.
//!
//! | name                 | access | value                                  |
//! |----------------------|--------|----------------------------------------|
//! | `mode`               | rw     | `default` / `on` / `burst` (`0`, `1`)  |
//! | `blinkPeriodMs`      | rw     | integer > 0                            |
//! | `burstCount`         | rw     | integer ≥ 0                            |
//! | `debounceEnabled`    | rw     | `1`/`0`, `true`/`false`                |
//! | `debounceWindowMs`   | rw     | integer ≥ 0                            |
//! | `pressCount`         | rw     | integer (write resets)                 |
//! | `lastPressTime`      | ro     | `HH:MM:SS.nnnnnnnnn`                   |
//! | `interPressInterval` | ro     | `S.nnnnnnnnn`                          |
//! | `ledState`           | ro     | `1`/`0`                                |
//! | `droppedTriggers`    | ro     | integer                                |
//!
//! A rejected write leaves the previous value in place and returns
//! [`Error::InvalidConfiguration`].  An accepted write returns the number
//! of input bytes consumed (the whole input).

use core::fmt;
use core::str::FromStr;
use std::sync::{Arc, Mutex, PoisonError};

use log::{info, warn};

use crate::error::{Error, Result};

use super::mode::Mode;
use super::ports::{HardwarePort, LineId};
use super::signal::ActuatorSignal;
use super::state::{ControlState, format_interval, format_time_of_day};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attribute {
    Mode,
    BlinkPeriodMs,
    BurstCount,
    DebounceEnabled,
    DebounceWindowMs,
    PressCount,
    LastPressTime,
    InterPressInterval,
    LedState,
    DroppedTriggers,
}

impl Attribute {
    pub const ALL: [Self; 10] = [
        Self::Mode,
        Self::BlinkPeriodMs,
        Self::BurstCount,
        Self::DebounceEnabled,
        Self::DebounceWindowMs,
        Self::PressCount,
        Self::LastPressTime,
        Self::InterPressInterval,
        Self::LedState,
        Self::DroppedTriggers,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Mode => "mode",
            Self::BlinkPeriodMs => "blinkPeriodMs",
            Self::BurstCount => "burstCount",
            Self::DebounceEnabled => "debounceEnabled",
            Self::DebounceWindowMs => "debounceWindowMs",
            Self::PressCount => "pressCount",
            Self::LastPressTime => "lastPressTime",
            Self::InterPressInterval => "interPressInterval",
            Self::LedState => "ledState",
            Self::DroppedTriggers => "droppedTriggers",
        }
    }

    pub fn is_writable(self) -> bool {
        matches!(
            self,
            Self::Mode
                | Self::BlinkPeriodMs
                | Self::BurstCount
                | Self::DebounceEnabled
                | Self::DebounceWindowMs
                | Self::PressCount
        )
    }
}

impl FromStr for Attribute {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|a| a.name() == s)
            .ok_or(Error::InvalidConfiguration("unknown attribute"))
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ───────────────────────────────────────────────────────────────
// ConfigSurface
// ───────────────────────────────────────────────────────────────

/// Cheap to clone; hand a copy to every context that needs to read or
/// tune the controller.
#[derive(Clone)]
pub struct ConfigSurface {
    state: Arc<ControlState>,
    signal: Arc<ActuatorSignal>,
    hw: Arc<dyn HardwarePort>,
    button_line: LineId,
    /// Held across a debounce write so the port and the two debounce
    /// fields change together.
    debounce_lock: Arc<Mutex<()>>,
}

impl ConfigSurface {
    pub fn new(
        state: Arc<ControlState>,
        signal: Arc<ActuatorSignal>,
        hw: Arc<dyn HardwarePort>,
        button_line: LineId,
    ) -> Self {
        Self {
            state,
            signal,
            hw,
            button_line,
            debounce_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Current value of `attr` in its surface form.
    pub fn show(&self, attr: Attribute) -> String {
        let s = &self.state;
        match attr {
            Attribute::Mode => s.mode().as_str().to_owned(),
            Attribute::BlinkPeriodMs => s.blink_period_ms().to_string(),
            Attribute::BurstCount => s.burst_count().to_string(),
            Attribute::DebounceEnabled => flag(s.debounce_enabled()).to_owned(),
            Attribute::DebounceWindowMs => s.debounce_window_ms().to_string(),
            Attribute::PressCount => s.press_count().to_string(),
            Attribute::LastPressTime => format_time_of_day(s.last_press()).as_str().to_owned(),
            Attribute::InterPressInterval => {
                format_interval(s.inter_press_interval()).as_str().to_owned()
            }
            Attribute::LedState => flag(s.led_on()).to_owned(),
            Attribute::DroppedTriggers => s.dropped_triggers().to_string(),
        }
    }

    /// Parse and apply `input` to `attr`.
    pub fn store(&self, attr: Attribute, input: &str) -> Result<usize> {
        match self.apply(attr, input.trim()) {
            Ok(()) => {
                info!("Surface: {} = {}", attr, self.show(attr));
                Ok(input.len())
            }
            Err(e) => {
                warn!("Surface: rejected {} <- {:?}: {}", attr, input, e);
                Err(e)
            }
        }
    }

    /// Line-oriented front end: `name` shows, `name=value` stores and
    /// echoes the new value.
    pub fn execute(&self, line: &str) -> Result<String> {
        match line.split_once('=') {
            Some((name, value)) => {
                let attr: Attribute = name.parse()?;
                self.store(attr, value)?;
                Ok(self.show(attr))
            }
            None => Ok(self.show(line.parse()?)),
        }
    }

    fn apply(&self, attr: Attribute, value: &str) -> Result<()> {
        let s = &self.state;
        match attr {
            Attribute::Mode => {
                let mode = Mode::parse(value)
                    .ok_or(Error::InvalidConfiguration("mode: expected default, on or burst"))?;
                s.set_mode(mode);
                self.signal.notify_reconfigured();
            }
            Attribute::BlinkPeriodMs => {
                let period = parse_u32(value, "blinkPeriodMs: expected integer")?;
                if period == 0 {
                    return Err(Error::InvalidConfiguration("blinkPeriodMs: must be > 0"));
                }
                s.set_blink_period_ms(period);
            }
            Attribute::BurstCount => {
                s.set_burst_count(parse_u32(value, "burstCount: expected integer")?);
            }
            Attribute::DebounceEnabled => {
                let enabled = parse_bool(value)
                    .ok_or(Error::InvalidConfiguration("debounceEnabled: expected 0 or 1"))?;
                let _held = self.debounce_lock.lock().unwrap_or_else(PoisonError::into_inner);
                let window = if enabled { s.debounce_window_ms() } else { 0 };
                self.program_debounce(window)?;
                s.set_debounce_enabled(enabled);
            }
            Attribute::DebounceWindowMs => {
                let window = parse_u32(value, "debounceWindowMs: expected integer")?;
                let _held = self.debounce_lock.lock().unwrap_or_else(PoisonError::into_inner);
                if s.debounce_enabled() {
                    self.program_debounce(window)?;
                }
                s.set_debounce_window_ms(window);
            }
            Attribute::PressCount => {
                s.set_press_count(parse_u32(value, "pressCount: expected integer")?);
            }
            Attribute::LastPressTime
            | Attribute::InterPressInterval
            | Attribute::LedState
            | Attribute::DroppedTriggers => {
                return Err(Error::InvalidConfiguration("attribute is read-only"));
            }
        }
        Ok(())
    }

    fn program_debounce(&self, window_ms: u32) -> Result<()> {
        self.hw
            .set_debounce(self.button_line, window_ms)
            .map_err(|_| Error::HardwareWriteFailure(self.button_line))
    }
}

fn flag(b: bool) -> &'static str {
    if b { "1" } else { "0" }
}

fn parse_u32(value: &str, what: &'static str) -> Result<u32> {
    value.parse().map_err(|_| Error::InvalidConfiguration(what))
}

fn parse_bool(value: &str) -> Option<bool> {
    match value {
        "1" => Some(true),
        "0" => Some(false),
        v if v.eq_ignore_ascii_case("true") => Some(true),
        v if v.eq_ignore_ascii_case("false") => Some(false),
        _ => None,
    }
}
