//! Application core — controller logic behind port traits.
//!
//! Nothing here touches a register: line I/O and time come in through
//! [`ports`], so the whole core runs on the host against the simulated
//! adapter.

pub mod actuator;
pub mod attributes;
pub mod controller;
pub mod edge;
pub mod mode;
pub mod ports;
pub mod signal;
pub mod state;
