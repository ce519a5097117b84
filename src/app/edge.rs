//! Button edge handler.
//!
//! Invoked by the hardware port once per qualifying (post-debounce) edge.
//! Runs in interrupt-like context: everything here is an atomic store or
//! a thread unpark, nothing sleeps, locks, allocates or logs.
//!
//! ```text
//!  edge ──▶ capture T ──▶ interval = T − last ──▶ last = T ──▶ count += 1
//!                                                                 │
//!                                          raise trigger ◀────────┘
//!                                                │
//!                                   wake task (or count a drop)
//! ```

use std::sync::Arc;

use super::ports::{ClockPort, EdgeCallback};
use super::signal::ActuatorSignal;
use super::state::ControlState;

#[derive(Clone)]
pub struct EdgeHandler {
    state: Arc<ControlState>,
    signal: Arc<ActuatorSignal>,
    clock: Arc<dyn ClockPort>,
}

impl EdgeHandler {
    pub fn new(
        state: Arc<ControlState>,
        signal: Arc<ActuatorSignal>,
        clock: Arc<dyn ClockPort>,
    ) -> Self {
        Self {
            state,
            signal,
            clock,
        }
    }

    /// Handle one accepted edge.
    ///
    /// Statistics are updated before the task is signalled, and are
    /// updated even when the task is gone.
    pub fn on_edge(&self) {
        let now = self.clock.now();
        self.state.record_press(now);
        self.state.raise_trigger();
        if !self.signal.wake() {
            self.state.note_dropped_trigger();
        }
    }

    /// Wrap the handler as a port callback.
    pub fn into_callback(self) -> EdgeCallback {
        Arc::new(move || self.on_edge())
    }
}
