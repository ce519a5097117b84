//! Three-LED output bank.
//!
//! Drives the chase LEDs through the hardware port.  Lines are
//! independent, so a failed write is logged and the remaining lines are
//! still driven; nothing is rolled back.

use std::sync::Arc;

use log::warn;

use crate::app::ports::{HardwarePort, LineId};
use crate::error::Error;

pub struct LedBank {
    hw: Arc<dyn HardwarePort>,
    lines: [LineId; 3],
}

impl LedBank {
    pub fn new(hw: Arc<dyn HardwarePort>, lines: [LineId; 3]) -> Self {
        Self { hw, lines }
    }

    pub fn lines(&self) -> [LineId; 3] {
        self.lines
    }

    /// Drive LED `index` (0..3).  A failure is logged and reported but
    /// is never fatal.
    pub fn set(&self, index: usize, on: bool) -> Result<(), Error> {
        let line = self.lines[index];
        self.hw.set_line(line, on).map_err(|e| {
            warn!("LED{} (line {}) write failed: {}", index + 1, line, e);
            Error::HardwareWriteFailure(line)
        })
    }

    /// Drive all three LEDs to the same level.  Returns the number of
    /// lines that failed.
    pub fn set_all(&self, on: bool) -> usize {
        (0..self.lines.len())
            .filter(|&i| self.set(i, on).is_err())
            .count()
    }
}
