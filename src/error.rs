//! Unified error types for the chase-light controller.
//!
//! A single `Error` enum that start-up, the configuration surface and
//! shutdown all funnel into.  All variants are `Copy` so they can be
//! handed across the task boundary without allocation.
//!
//! Steady-state failures (a single LED write, a rejected attribute write)
//! are contained where they happen; only start-up and shutdown surface an
//! `Error` to the caller.

use core::fmt;

use crate::app::ports::{LineId, PortError};

// ---------------------------------------------------------------------------
// Top-level controller error
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A line, edge source, or worker task could not be acquired.
    ResourceUnavailable(Resource),
    /// A configuration value was malformed or out of range.
    /// The `&'static str` names the field and why.
    InvalidConfiguration(&'static str),
    /// Driving or configuring a line failed.
    HardwareWriteFailure(LineId),
    /// The actuation task did not confirm exit within the bounded wait.
    /// Lines are left claimed in this case.
    ShutdownTimeout,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ResourceUnavailable(r) => write!(f, "resource unavailable: {r}"),
            Self::InvalidConfiguration(msg) => write!(f, "invalid configuration: {msg}"),
            Self::HardwareWriteFailure(line) => write!(f, "hardware write failed on line {line}"),
            Self::ShutdownTimeout => write!(f, "actuation task did not exit in time"),
        }
    }
}

impl std::error::Error for Error {}

// ---------------------------------------------------------------------------
// Resources acquired during start-up
// ---------------------------------------------------------------------------

/// What could not be acquired, with the port's reason where there is one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    /// `request_line` failed.
    Line(LineId, PortError),
    /// `map_to_edge_source` failed for the button line.
    EdgeSource(LineId, PortError),
    /// `register_edge_callback` failed.
    EdgeCallback(LineId, PortError),
    /// The worker thread could not be spawned.
    Task,
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Line(line, e) => write!(f, "line {line} ({e})"),
            Self::EdgeSource(line, e) => write!(f, "edge source for line {line} ({e})"),
            Self::EdgeCallback(line, e) => write!(f, "edge callback on line {line} ({e})"),
            Self::Task => write!(f, "actuation task spawn"),
        }
    }
}

impl From<Resource> for Error {
    fn from(r: Resource) -> Self {
        Self::ResourceUnavailable(r)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Crate-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
