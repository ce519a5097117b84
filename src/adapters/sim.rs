//! Simulated GPIO bank.
//!
//! Implements [`HardwarePort`] entirely in memory for host runs and tests.
//! Output writes are recorded as a toggle history (level changes only,
//! timestamped from the injected clock).  Input lines are driven from the
//! outside with [`SimGpio::set_input`] / [`SimGpio::press`]; edges pass
//! through the same [`EdgeDetector`] the polled adapter uses, so the
//! debounce window programmed through the port behaves as on hardware.
//!
//! Fault injection hooks let tests exercise every start-up unwind path.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use log::trace;

use crate::app::ports::{
    ClockPort, EdgeCallback, EdgePolarity, EdgeSource, HardwarePort, LineId, LineMode, PortError,
};
use crate::drivers::edge_detect::EdgeDetector;

/// Lines `0..LINE_COUNT` exist (ESP32-S3 exposes GPIO0–GPIO48).
pub const LINE_COUNT: LineId = 49;

/// One recorded output level change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Toggle {
    pub line: LineId,
    pub level: bool,
    pub at: Duration,
}

#[derive(Debug, Clone, Copy)]
struct SimLine {
    output: bool,
    debounce_ms: u32,
}

struct EdgeSlot {
    line: LineId,
    detector: EdgeDetector,
    callback: EdgeCallback,
}

#[derive(Default)]
struct Inner {
    claimed: HashMap<LineId, SimLine>,
    levels: HashMap<LineId, bool>,
    history: Vec<Toggle>,
    edges: HashMap<EdgeSource, EdgeSlot>,
    // Fault injection.
    foreign: HashSet<LineId>,
    failing_writes: HashSet<LineId>,
    failing_debounce: bool,
    no_edge_source: HashSet<LineId>,
    failing_registration: bool,
}

pub struct SimGpio {
    clock: Arc<dyn ClockPort>,
    inner: Mutex<Inner>,
}

impl SimGpio {
    pub fn new(clock: Arc<dyn ClockPort>) -> Self {
        Self {
            clock,
            inner: Mutex::new(Inner::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ── Observation ──────────────────────────────────────────

    /// Current level of a line, claimed or not.  Unset lines read low.
    pub fn level(&self, id: LineId) -> bool {
        self.lock().levels.get(&id).copied().unwrap_or(false)
    }

    pub fn is_claimed(&self, id: LineId) -> bool {
        self.lock().claimed.contains_key(&id)
    }

    /// Debounce window last programmed on a claimed line; `0` if none.
    pub fn debounce_ms(&self, id: LineId) -> u32 {
        self.lock().claimed.get(&id).map_or(0, |l| l.debounce_ms)
    }

    /// Whether an edge callback is attached to `id`.
    pub fn has_edge_callback(&self, id: LineId) -> bool {
        self.lock().edges.values().any(|slot| slot.line == id)
    }

    /// Every output level change since start (or the last
    /// [`clear_history`](Self::clear_history)).
    pub fn history(&self) -> Vec<Toggle> {
        self.lock().history.clone()
    }

    pub fn clear_history(&self) {
        self.lock().history.clear();
    }

    // ── Fault injection ──────────────────────────────────────

    /// Make a line look owned by another driver.
    pub fn claim_externally(&self, id: LineId) {
        self.lock().foreign.insert(id);
    }

    pub fn fail_writes(&self, id: LineId, fail: bool) {
        let mut inner = self.lock();
        if fail {
            inner.failing_writes.insert(id);
        } else {
            inner.failing_writes.remove(&id);
        }
    }

    pub fn fail_debounce(&self, fail: bool) {
        self.lock().failing_debounce = fail;
    }

    pub fn deny_edge_source(&self, id: LineId) {
        self.lock().no_edge_source.insert(id);
    }

    pub fn fail_edge_registration(&self, fail: bool) {
        self.lock().failing_registration = fail;
    }

    // ── Input stimulus ───────────────────────────────────────

    /// Drive an input line from outside.  If the transition completes a
    /// qualifying edge, the registered callback runs on the caller's
    /// thread, after the internal lock is dropped.
    pub fn set_input(&self, id: LineId, level: bool) {
        let now = self.clock.now();
        let fire = {
            let mut inner = self.lock();
            inner.levels.insert(id, level);
            inner
                .edges
                .values_mut()
                .find(|slot| slot.line == id)
                .and_then(|slot| {
                    slot.detector
                        .sample(level, now)
                        .then(|| slot.callback.clone())
                })
        };
        if let Some(callback) = fire {
            trace!("sim: edge on line {}", id);
            callback();
        }
    }

    /// One press-and-release in the registered polarity (rising if none).
    pub fn press(&self, id: LineId) {
        let polarity = self
            .lock()
            .edges
            .values()
            .find(|slot| slot.line == id)
            .map_or(EdgePolarity::Rising, |slot| slot.detector.polarity());
        let active = polarity == EdgePolarity::Rising;
        self.set_input(id, active);
        self.set_input(id, !active);
    }
}

impl HardwarePort for SimGpio {
    fn request_line(&self, id: LineId, mode: LineMode) -> Result<(), PortError> {
        if id >= LINE_COUNT {
            return Err(PortError::UnknownLine(id));
        }
        let at = self.clock.now();
        let mut inner = self.lock();
        if inner.foreign.contains(&id) || inner.claimed.contains_key(&id) {
            return Err(PortError::Busy(id));
        }
        let output = matches!(mode, LineMode::Output { .. });
        inner.claimed.insert(
            id,
            SimLine {
                output,
                debounce_ms: 0,
            },
        );
        if let LineMode::Output { initial } = mode {
            drive(&mut inner, id, initial, at);
        }
        Ok(())
    }

    fn release_line(&self, id: LineId) {
        let mut inner = self.lock();
        inner.edges.retain(|_, slot| slot.line != id);
        inner.claimed.remove(&id);
    }

    fn set_line(&self, id: LineId, high: bool) -> Result<(), PortError> {
        let at = self.clock.now();
        let mut inner = self.lock();
        match inner.claimed.get(&id) {
            None => return Err(PortError::NotClaimed(id)),
            Some(line) if !line.output => return Err(PortError::WrongDirection(id)),
            Some(_) => {}
        }
        if inner.failing_writes.contains(&id) {
            return Err(PortError::Io(id));
        }
        drive(&mut inner, id, high, at);
        Ok(())
    }

    fn get_line(&self, id: LineId) -> Result<bool, PortError> {
        let inner = self.lock();
        if !inner.claimed.contains_key(&id) {
            return Err(PortError::NotClaimed(id));
        }
        Ok(inner.levels.get(&id).copied().unwrap_or(false))
    }

    fn set_debounce(&self, id: LineId, window_ms: u32) -> Result<(), PortError> {
        let mut inner = self.lock();
        if inner.failing_debounce {
            return Err(PortError::Io(id));
        }
        match inner.claimed.get_mut(&id) {
            None => return Err(PortError::NotClaimed(id)),
            Some(line) if line.output => return Err(PortError::WrongDirection(id)),
            Some(line) => line.debounce_ms = window_ms,
        }
        for slot in inner.edges.values_mut().filter(|slot| slot.line == id) {
            slot.detector.set_window(window_ms);
        }
        Ok(())
    }

    fn map_to_edge_source(&self, id: LineId) -> Result<EdgeSource, PortError> {
        let inner = self.lock();
        match inner.claimed.get(&id) {
            None => Err(PortError::NotClaimed(id)),
            Some(line) if line.output => Err(PortError::WrongDirection(id)),
            Some(_) if inner.no_edge_source.contains(&id) => Err(PortError::NoEdgeSource(id)),
            Some(_) => Ok(EdgeSource(id)),
        }
    }

    fn register_edge_callback(
        &self,
        source: EdgeSource,
        polarity: EdgePolarity,
        callback: EdgeCallback,
    ) -> Result<(), PortError> {
        let line = source.0;
        let mut inner = self.lock();
        if inner.failing_registration {
            return Err(PortError::NoEdgeSource(line));
        }
        let Some(claimed) = inner.claimed.get(&line).copied() else {
            return Err(PortError::NotClaimed(line));
        };
        if inner.edges.contains_key(&source) {
            return Err(PortError::Busy(line));
        }
        let level = inner.levels.get(&line).copied().unwrap_or(false);
        inner.edges.insert(
            source,
            EdgeSlot {
                line,
                detector: EdgeDetector::new(polarity, level, claimed.debounce_ms),
                callback,
            },
        );
        Ok(())
    }

    fn unregister_edge_callback(&self, source: EdgeSource) {
        self.lock().edges.remove(&source);
    }
}

/// Set an output level, recording it only if it changed.
fn drive(inner: &mut Inner, id: LineId, high: bool, at: Duration) {
    let previous = inner.levels.insert(id, high).unwrap_or(false);
    if previous != high {
        inner.history.push(Toggle {
            line: id,
            level: high,
            at,
        });
    }
}
