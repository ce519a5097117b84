//! LED output, edge detection and task spawning helpers.

pub mod edge_detect;
pub mod led_bank;
pub mod task_pin;
