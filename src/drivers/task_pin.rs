//! Named worker-thread spawning.
//!
//! On ESP-IDF, `std::thread` is a pthread wrapper around a FreeRTOS
//! task; `esp_pthread_set_cfg()` sets the core affinity, priority and
//! stack for the *next* `pthread_create()` from the calling thread, so
//! the config→spawn pair must not be interleaved with other spawns.
//! Without the `espidf` feature core and priority are ignored.
//!
//! Spawn failure is returned, not panicked on: the caller turns it into
//! an initialisation error and unwinds.

use std::io;
use std::thread::{Builder, JoinHandle};

/// CPU core identifiers for the ESP32-S3 dual core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum Core {
    /// Core 0 (PRO_CPU) — protocol stacks.
    Pro = 0,
    /// Core 1 (APP_CPU) — application logic.
    App = 1,
}

/// FreeRTOS priority for the actuation task.
pub const ACTUATOR_PRIORITY: u8 = 5;

/// The button poller runs above the actuator so edges are sampled on
/// time during a burst.
pub const POLLER_PRIORITY: u8 = 6;

/// Stack size in bytes, or an error if `stack_kb` does not fit.
fn stack_bytes(stack_kb: usize) -> io::Result<usize> {
    stack_kb
        .checked_mul(1024)
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "stack size overflows"))
}

#[cfg(feature = "espidf")]
pub fn spawn_on_core<F>(
    core: Core,
    priority: u8,
    stack_kb: usize,
    name: &'static str,
    f: F,
) -> io::Result<JoinHandle<()>>
where
    F: FnOnce() + Send + 'static,
{
    let stack = stack_bytes(stack_kb)?;
    // SAFETY: plain FFI calls on a config struct we own; applies only to
    // the next pthread_create from this thread.
    unsafe {
        let mut cfg = esp_idf_sys::esp_create_default_pthread_config();
        cfg.pin_to_core = core as i32;
        cfg.prio = priority as i32;
        cfg.stack_size = stack as _;
        let ret = esp_idf_sys::esp_pthread_set_cfg(&cfg);
        if ret != esp_idf_sys::ESP_OK as i32 {
            return Err(io::Error::other(format!("esp_pthread_set_cfg failed: {ret}")));
        }
    }

    log::info!(
        "Spawning '{}' on {:?} (pri={}, stack={}KB)",
        name,
        core,
        priority,
        stack_kb
    );

    Builder::new()
        .name(name.into())
        .stack_size(stack)
        .spawn(f)
}

/// Host fallback — ignores core affinity and priority.
#[cfg(not(feature = "espidf"))]
pub fn spawn_on_core<F>(
    _core: Core,
    _priority: u8,
    stack_kb: usize,
    name: &'static str,
    f: F,
) -> io::Result<JoinHandle<()>>
where
    F: FnOnce() + Send + 'static,
{
    let stack = stack_bytes(stack_kb)?;
    log::debug!("Spawning '{}' (host, stack={}KB)", name, stack_kb);

    Builder::new()
        .name(name.into())
        .stack_size(stack)
        .spawn(f)
}
