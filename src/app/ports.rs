//! Port traits — the hexagonal boundary between the controller core and
//! the platform.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ Controller (domain)
//! ```
//!
//! The core holds ports as `Arc<dyn …>` because three contexts touch
//! them at once: the edge callback, the actuation task, and whoever is
//! driving the configuration surface.  Every method therefore takes
//! `&self`; adapters provide their own interior synchronisation.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Platform line number (GPIO index).
pub type LineId = u32;

// ───────────────────────────────────────────────────────────────
// Line and edge value types
// ───────────────────────────────────────────────────────────────

/// Direction requested for a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineMode {
    /// Digital input (the button).
    Input,
    /// Digital output driven to `initial` as soon as it is claimed.
    Output { initial: bool },
}

/// Which transition of the button line counts as a press.
/// Fixed for the controller's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgePolarity {
    /// Low → high.
    #[default]
    Rising,
    /// High → low.
    Falling,
}

impl EdgePolarity {
    /// Whether a transition from `from` to `to` qualifies.
    pub fn matches(self, from: bool, to: bool) -> bool {
        match self {
            Self::Rising => !from && to,
            Self::Falling => from && !to,
        }
    }
}

/// Opaque handle for an edge-interrupt source, issued by
/// [`HardwarePort::map_to_edge_source`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EdgeSource(pub u32);

/// Callback invoked once per qualifying (post-debounce) edge.
///
/// Implementations call this from their interrupt or poller context; it
/// must never block.
pub type EdgeCallback = Arc<dyn Fn() + Send + Sync>;

// ───────────────────────────────────────────────────────────────
// Hardware I/O port (driven adapter: domain ↔ GPIO)
// ───────────────────────────────────────────────────────────────

/// Line request/release, level I/O, debounce and edge mapping.
pub trait HardwarePort: Send + Sync {
    /// Claim a line in the given mode.  Fails with [`PortError::Busy`] if
    /// it is already claimed.
    fn request_line(&self, id: LineId, mode: LineMode) -> Result<(), PortError>;

    /// Return a claimed line to the platform.  Releasing an unclaimed line
    /// is a no-op.
    fn release_line(&self, id: LineId);

    /// Drive an output line.
    fn set_line(&self, id: LineId, high: bool) -> Result<(), PortError>;

    /// Sample a line.  For outputs this is the last commanded level.
    fn get_line(&self, id: LineId) -> Result<bool, PortError>;

    /// Set the hardware debounce window; `0` disables filtering.
    fn set_debounce(&self, id: LineId, window_ms: u32) -> Result<(), PortError>;

    /// Map an input line to its edge-interrupt source.
    fn map_to_edge_source(&self, id: LineId) -> Result<EdgeSource, PortError>;

    /// Attach `callback` to `source` for transitions of `polarity`.
    fn register_edge_callback(
        &self,
        source: EdgeSource,
        polarity: EdgePolarity,
        callback: EdgeCallback,
    ) -> Result<(), PortError>;

    /// Detach the callback.  After this returns no further invocations
    /// start.
    fn unregister_edge_callback(&self, source: EdgeSource);
}

// ───────────────────────────────────────────────────────────────
// Clock port
// ───────────────────────────────────────────────────────────────

/// Wall-clock time source with sub-millisecond precision.
pub trait ClockPort: Send + Sync {
    /// Time since the Unix epoch.  Must be monotonic non-decreasing.
    fn now(&self) -> Duration;
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`HardwarePort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortError {
    /// The line is already claimed (by us or someone else).
    Busy(LineId),
    /// The platform has no such line.
    UnknownLine(LineId),
    /// The line has not been requested.
    NotClaimed(LineId),
    /// Operation needs the other direction (e.g. `set_line` on an input).
    WrongDirection(LineId),
    /// The line cannot raise edge interrupts, or its source is taken.
    NoEdgeSource(LineId),
    /// Generic electrical / driver failure.
    Io(LineId),
}

impl core::fmt::Display for PortError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Busy(id) => write!(f, "line {} busy", id),
            Self::UnknownLine(id) => write!(f, "no such line {}", id),
            Self::NotClaimed(id) => write!(f, "line {} not claimed", id),
            Self::WrongDirection(id) => write!(f, "wrong direction for line {}", id),
            Self::NoEdgeSource(id) => write!(f, "no edge source for line {}", id),
            Self::Io(id) => write!(f, "I/O error on line {}", id),
        }
    }
}
