//! Chase-light controller library.
//!
//! One push-button, three LEDs.  The button's debounced edges feed press
//! statistics and trigger a round-robin LED chase; a small attribute
//! surface tunes the behaviour at run time.  Hardware is reached only
//! through the port traits in [`app::ports`], so everything except the
//! firmware binary runs on the host against [`adapters::sim::SimGpio`].

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod config;
pub mod drivers;
pub mod error;
pub mod pins;

pub use app::attributes::{Attribute, ConfigSurface};
pub use app::controller::Controller;
pub use app::mode::Mode;
pub use config::ControllerConfig;
pub use error::{Error, Result};
