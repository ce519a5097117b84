//! Adapters — concrete implementations of the port traits.
//!
//! | Adapter    | Implements   | Connects to                          |
//! |------------|--------------|--------------------------------------|
//! | `clock`    | ClockPort    | system wall clock / manual test clock|
//! | `hal_gpio` | HardwarePort | `embedded-hal` pins, polled input    |
//! | `sim`      | HardwarePort | in-memory lines with fault injection |

pub mod clock;
pub mod hal_gpio;
pub mod sim;
