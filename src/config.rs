//! Controller start-up configuration
//!
//! Line assignments and polarity are fixed for the controller's lifetime.
//! The tunables (`mode`, `blink_period_ms`, `burst_count`, debounce) only
//! seed the shared control state; after start they are changed through
//! the configuration surface.

use serde::{Deserialize, Serialize};

use crate::app::mode::Mode;
use crate::app::ports::{EdgePolarity, LineId};
use crate::error::{Error, Result};
use crate::pins;

/// Largest accepted actuation task stack (KiB).
pub const MAX_TASK_STACK_KB: usize = 1024;

/// When a BURST pass runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BurstTrigger {
    /// One sequence per accepted button press.
    #[default]
    Press,
    /// A sequence on every cycle while in BURST, button or not.
    Continuous,
}

/// Core controller configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    // --- Lines ---
    /// LED1, LED2, LED3 in chase order
    pub led_lines: [LineId; 3],
    /// Push-button input
    pub button_line: LineId,
    /// Which button transition counts as a press
    pub edge: EdgePolarity,

    // --- Debounce ---
    /// Hardware debounce window (milliseconds)
    pub debounce_window_ms: u32,
    /// Whether the window is applied at start
    pub debounce_enabled: bool,

    // --- Actuation ---
    /// Initial mode
    pub mode: Mode,
    /// Blink period (milliseconds); idle cycles sleep half of it
    pub blink_period_ms: u32,
    /// Chase repetitions per trigger
    pub burst_count: u32,
    pub burst_trigger: BurstTrigger,
    /// Whether presses during an active burst queue one follow-up burst
    pub burst_retrigger: bool,

    // --- Task ---
    /// Extra wait on shutdown beyond one blink period (milliseconds)
    pub shutdown_grace_ms: u32,
    /// Actuation task stack size (KiB)
    pub task_stack_kb: usize,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            // Lines
            led_lines: [pins::LED1_GPIO, pins::LED2_GPIO, pins::LED3_GPIO],
            button_line: pins::BUTTON_GPIO,
            edge: EdgePolarity::Rising,

            // Debounce
            debounce_window_ms: 200,
            debounce_enabled: true,

            // Actuation
            mode: Mode::Default,
            blink_period_ms: 1000,
            burst_count: 1,
            burst_trigger: BurstTrigger::Press,
            burst_retrigger: true,

            // Task
            shutdown_grace_ms: 500,
            task_stack_kb: 8,
        }
    }
}

impl ControllerConfig {
    /// Overlay a (possibly partial) JSON object on the defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|_| Error::InvalidConfiguration("config: malformed JSON"))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations the controller cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.blink_period_ms == 0 {
            return Err(Error::InvalidConfiguration("blink_period_ms must be > 0"));
        }
        if self.task_stack_kb == 0 {
            return Err(Error::InvalidConfiguration("task_stack_kb must be > 0"));
        }
        if self.task_stack_kb > MAX_TASK_STACK_KB {
            return Err(Error::InvalidConfiguration("task_stack_kb must be <= 1024"));
        }
        let lines = [
            self.led_lines[0],
            self.led_lines[1],
            self.led_lines[2],
            self.button_line,
        ];
        for (i, a) in lines.iter().enumerate() {
            if lines[i + 1..].contains(a) {
                return Err(Error::InvalidConfiguration("line ids must be distinct"));
            }
        }
        Ok(())
    }

    /// Force the line ids to the board wiring in [`pins`].  Returns
    /// `true` if the config named other lines.
    pub fn pin_to_board(&mut self) -> bool {
        let board = [pins::LED1_GPIO, pins::LED2_GPIO, pins::LED3_GPIO];
        let changed = self.led_lines != board || self.button_line != pins::BUTTON_GPIO;
        self.led_lines = board;
        self.button_line = pins::BUTTON_GPIO;
        changed
    }
}
