//! Wake / stop signalling between the edge handler, the configuration
//! surface and the actuation task.
//!
//! Waking is a thread unpark: it never blocks and never allocates, so the
//! edge handler can call it from its callback context.  The task parks
//! with a timeout, so a lost wake costs at most one sleep increment.

use core::sync::atomic::{AtomicBool, Ordering};
use std::sync::OnceLock;
use std::thread::Thread;

#[derive(Default)]
pub struct ActuatorSignal {
    thread: OnceLock<Thread>,
    running: AtomicBool,
    stop: AtomicBool,
    reconfigured: AtomicBool,
}

impl ActuatorSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Nudge the task out of its current sleep.  Returns `false` if no
    /// task is running to receive it.
    pub fn wake(&self) -> bool {
        if !self.running.load(Ordering::Acquire) {
            return false;
        }
        if let Some(thread) = self.thread.get() {
            thread.unpark();
        }
        true
    }

    /// Tell an idle task that the mode changed so it re-reads state now
    /// instead of at the end of its sleep.
    pub fn notify_reconfigured(&self) {
        self.reconfigured.store(true, Ordering::Release);
        self.wake();
    }

    pub(crate) fn take_reconfigured(&self) -> bool {
        self.reconfigured.swap(false, Ordering::Acquire)
    }

    /// Ask the task to exit at its next check point, and wake it.
    pub fn request_stop(&self) {
        self.stop.store(true, Ordering::Release);
        if let Some(thread) = self.thread.get() {
            thread.unpark();
        }
    }

    pub fn stop_requested(&self) -> bool {
        self.stop.load(Ordering::Acquire)
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    pub(crate) fn set_running(&self, running: bool) {
        self.running.store(running, Ordering::Release);
    }

    /// Bind the task's thread.  Only the first call has effect.
    pub(crate) fn attach(&self, thread: Thread) {
        let _ = self.thread.set(thread);
    }
}
