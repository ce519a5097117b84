//! Actuation task — the only place that sleeps.
//!
//! A single long-lived worker, started once at controller start and
//! joined once at shutdown.  Each cycle it reads the mode and acts:
//!
//! | Mode    | Action                                             |
//! |---------|----------------------------------------------------|
//! | DEFAULT | all LEDs off, idle sleep                           |
//! | ON      | all LEDs on, idle sleep                            |
//! | BURST   | if due: `burstCount` × (LED1 → LED2 → LED3) chase  |
//!
//! The idle sleep is `blinkPeriodMs / 2` and ends early on a trigger or a
//! stop request.  Each burst step holds one LED for `blinkPeriodMs` and
//! ends early only on stop, so shutdown latency is bounded by one blink
//! period.  Mode and timing are sampled at cycle boundaries; a burst in
//! flight runs to completion with the values it started with.

use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use log::{debug, error, info, warn};

use crate::config::BurstTrigger;
use crate::drivers::led_bank::LedBank;
use crate::drivers::task_pin::{self, ACTUATOR_PRIORITY, Core};
use crate::error::{Error, Resource};

use super::mode::Mode;
use super::signal::ActuatorSignal;
use super::state::ControlState;

const TASK_NAME: &str = "led-actuator";

/// Outcome of an interruptible sleep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Sleep {
    Elapsed,
    Woken,
    Stopped,
}

pub struct ActuationTask {
    state: Arc<ControlState>,
    signal: Arc<ActuatorSignal>,
    leds: LedBank,
    trigger: BurstTrigger,
    retrigger: bool,
}

impl ActuationTask {
    pub fn new(
        state: Arc<ControlState>,
        signal: Arc<ActuatorSignal>,
        leds: LedBank,
        trigger: BurstTrigger,
        retrigger: bool,
    ) -> Self {
        Self {
            state,
            signal,
            leds,
            trigger,
            retrigger,
        }
    }

    /// Start the worker thread.  The signal is marked running before the
    /// spawn so edges arriving during start-up are not counted as drops.
    pub fn spawn(self, stack_kb: usize) -> Result<ActuatorHandle, Error> {
        let signal = self.signal.clone();
        let (exited_tx, exited_rx) = mpsc::channel();

        signal.set_running(true);
        let guard_signal = signal.clone();
        let spawned = task_pin::spawn_on_core(
            Core::App,
            ACTUATOR_PRIORITY,
            stack_kb,
            TASK_NAME,
            move || {
                let _exit = ExitGuard {
                    signal: guard_signal,
                    exited: exited_tx,
                };
                self.run();
            },
        );

        match spawned {
            Ok(join) => {
                signal.attach(join.thread().clone());
                Ok(ActuatorHandle {
                    signal,
                    join: Some(join),
                    exited: exited_rx,
                })
            }
            Err(e) => {
                signal.set_running(false);
                error!("Actuation task spawn failed: {}", e);
                Err(Resource::Task.into())
            }
        }
    }

    fn run(&self) {
        info!("Actuation task running");

        while !self.signal.stop_requested() {
            let mode = self.state.mode();
            let period_ms = self.state.blink_period_ms();

            match mode {
                Mode::Default => self.steady(false),
                Mode::On => self.steady(true),
                Mode::Burst => {
                    self.clear_before_chase();
                    if self.burst_due() && self.run_burst() == Sleep::Stopped {
                        break;
                    }
                }
            }

            self.discard_idle_trigger(mode);

            if self.sleep(idle_cycle(period_ms), true) == Sleep::Stopped {
                break;
            }
        }

        info!("Actuation task exiting");
    }

    fn steady(&self, on: bool) {
        let failed = self.leds.set_all(on);
        self.state.set_led_on(lit_after(on, failed));
    }

    /// Coming from ON, switch everything off so at most one LED is lit
    /// during the chase.
    fn clear_before_chase(&self) {
        if self.state.led_on() {
            let failed = self.leds.set_all(false);
            self.state.set_led_on(lit_after(false, failed));
        }
    }

    /// Presses outside BURST have nothing to start.  The mode is read
    /// again so a switch to BURST during this cycle keeps its press.
    fn discard_idle_trigger(&self, cycle_mode: Mode) {
        if cycle_mode != Mode::Burst && self.state.mode() != Mode::Burst {
            self.state.take_trigger();
        }
    }

    fn burst_due(&self) -> bool {
        let pending = self.state.take_trigger();
        match self.trigger {
            BurstTrigger::Press => pending,
            BurstTrigger::Continuous => true,
        }
    }

    /// One full burst.  Returns [`Sleep::Stopped`] if a stop request cut
    /// it short; the lit LED is switched off either way.
    fn run_burst(&self) -> Sleep {
        let reps = self.state.burst_count();
        let step = Duration::from_millis(u64::from(self.state.blink_period_ms()));
        debug!("Burst: {} x {:?} per LED", reps, step);

        self.state.set_burst_active(true);
        let mut outcome = Sleep::Elapsed;

        'reps: for _ in 0..reps {
            for led in 0..3 {
                // Write failures are logged inside LedBank; keep chasing.
                let lit = self.leds.set(led, true).is_ok();
                self.state.set_led_on(lit);
                let slept = self.sleep(step, false);
                let dark = self.leds.set(led, false).is_ok();
                self.state.set_led_on(lit && !dark);
                if slept == Sleep::Stopped {
                    outcome = Sleep::Stopped;
                    break 'reps;
                }
            }
        }

        self.state.set_burst_active(false);
        if !self.retrigger {
            // Presses that arrived mid-burst are dropped, not queued.
            self.state.take_trigger();
        }
        debug!("Burst finished ({:?})", outcome);
        outcome
    }

    /// Park until `duration` elapses or a stop is requested.  An idle
    /// sleep (`interruptible`) also ends on a pending trigger or a mode
    /// change.
    fn sleep(&self, duration: Duration, interruptible: bool) -> Sleep {
        let deadline = Instant::now() + duration;
        loop {
            if self.signal.stop_requested() {
                return Sleep::Stopped;
            }
            if interruptible
                && (self.state.trigger_pending() || self.signal.take_reconfigured())
            {
                return Sleep::Woken;
            }
            let now = Instant::now();
            if now >= deadline {
                return Sleep::Elapsed;
            }
            thread::park_timeout(deadline - now);
        }
    }
}

/// Whether any LED may still be lit after driving all of them to `on`
/// with `failed` writes failing.
fn lit_after(on: bool, failed: usize) -> bool {
    if on { failed < 3 } else { failed > 0 }
}

/// Half a blink period, never zero.
fn idle_cycle(period_ms: u32) -> Duration {
    Duration::from_millis(u64::from((period_ms / 2).max(1)))
}

/// Marks the task gone and confirms exit, including on panic.
struct ExitGuard {
    signal: Arc<ActuatorSignal>,
    exited: Sender<()>,
}

impl Drop for ExitGuard {
    fn drop(&mut self) {
        self.signal.set_running(false);
        let _ = self.exited.send(());
    }
}

// ───────────────────────────────────────────────────────────────
// Handle
// ───────────────────────────────────────────────────────────────

/// Owner's side of the running task.
pub struct ActuatorHandle {
    signal: Arc<ActuatorSignal>,
    join: Option<JoinHandle<()>>,
    exited: Receiver<()>,
}

impl ActuatorHandle {
    pub fn signal(&self) -> &Arc<ActuatorSignal> {
        &self.signal
    }

    pub fn is_running(&self) -> bool {
        self.signal.is_running()
    }

    /// Request a stop and wait up to `timeout` for the task to confirm.
    ///
    /// On timeout the handle keeps the thread so the caller may retry;
    /// the task must be assumed still able to drive the LED lines.
    pub fn stop(&mut self, timeout: Duration) -> Result<(), Error> {
        let Some(join) = self.join.take() else {
            return Ok(());
        };

        self.signal.request_stop();
        match self.exited.recv_timeout(timeout) {
            Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                if join.join().is_err() {
                    warn!("Actuation task had panicked");
                }
                info!("Actuation task stopped");
                Ok(())
            }
            Err(RecvTimeoutError::Timeout) => {
                error!("Actuation task did not exit within {:?}", timeout);
                self.join = Some(join);
                Err(Error::ShutdownTimeout)
            }
        }
    }
}
