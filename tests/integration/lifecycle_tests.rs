//! Start-up unwinding and bounded shutdown.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::time::{Duration, Instant};

use chaselight::adapters::clock::ManualClock;
use chaselight::adapters::sim::SimGpio;
use chaselight::app::ports::{
    EdgeCallback, EdgePolarity, EdgeSource, HardwarePort, LineId, LineMode, PortError,
};
use chaselight::error::Resource;
use chaselight::{Controller, ControllerConfig, Error, Mode};

use crate::support::{BUTTON, LEDS, Rig, config, wait_until};

fn bare() -> (Arc<SimGpio>, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(Duration::from_secs(10)));
    (Arc::new(SimGpio::new(clock.clone())), clock)
}

fn nothing_claimed(gpio: &SimGpio) -> bool {
    LEDS.iter().chain([BUTTON].iter()).all(|&id| !gpio.is_claimed(id))
}

#[test]
fn shutdown_mid_burst_returns_within_one_period() {
    let mut rig = Rig::start(ControllerConfig {
        mode: Mode::Burst,
        burst_count: 50,
        ..config(300)
    });
    rig.press();
    assert!(wait_until(Duration::from_secs(1), || rig.ctl.state().burst_active()));

    let started = Instant::now();
    rig.ctl.shutdown().unwrap();
    assert!(started.elapsed() < Duration::from_millis(300));

    assert!(!rig.ctl.is_running());
    assert!(nothing_claimed(&rig.gpio));
    assert!(rig.all_leds(false));
}

#[test]
fn presses_after_shutdown_are_ignored() {
    let mut rig = Rig::start(config(20));
    rig.press();
    rig.ctl.shutdown().unwrap();
    rig.press();
    assert_eq!(rig.ctl.state().press_count(), 1);
}

#[test]
fn controller_can_restart_on_released_lines() {
    let (gpio, clock) = bare();
    let mut first = Controller::start(config(20), gpio.clone(), clock.clone()).unwrap();
    assert!(matches!(
        Controller::start(config(20), gpio.clone(), clock.clone()),
        Err(Error::ResourceUnavailable(Resource::Line(11, PortError::Busy(11))))
    ));
    first.shutdown().unwrap();

    let second = Controller::start(config(20), gpio.clone(), clock).unwrap();
    assert!(second.is_running());
}

#[test]
fn busy_button_releases_leds() {
    let (gpio, clock) = bare();
    gpio.claim_externally(BUTTON);
    assert!(matches!(
        Controller::start(config(20), gpio.clone(), clock),
        Err(Error::ResourceUnavailable(Resource::Line(BUTTON, PortError::Busy(_))))
    ));
    assert!(nothing_claimed(&gpio));
}

#[test]
fn failed_callback_registration_leaves_nothing_behind() {
    let (gpio, clock) = bare();
    gpio.fail_edge_registration(true);
    assert!(matches!(
        Controller::start(config(20), gpio.clone(), clock),
        Err(Error::ResourceUnavailable(Resource::EdgeCallback(BUTTON, _)))
    ));
    assert!(nothing_claimed(&gpio));
    assert!(!gpio.has_edge_callback(BUTTON));
}

#[test]
fn invalid_lines_are_rejected_before_claiming() {
    let (gpio, clock) = bare();
    let cfg = ControllerConfig {
        button_line: LEDS[0],
        ..config(20)
    };
    assert!(matches!(
        Controller::start(cfg, gpio.clone(), clock),
        Err(Error::InvalidConfiguration(_))
    ));
    assert!(nothing_claimed(&gpio));
}

#[test]
fn led_write_failures_do_not_stop_the_chase() {
    let rig = Rig::start(ControllerConfig {
        mode: Mode::Burst,
        burst_count: 1,
        ..config(10)
    });
    rig.gpio.fail_writes(LEDS[1], true);
    rig.press();
    // LED2 never toggles; LED1 and LED3 still do.
    let history = rig.settled_history(4, Duration::from_millis(80));
    let lines: Vec<_> = history.iter().map(|t| t.line).collect();
    assert_eq!(lines, [LEDS[0], LEDS[0], LEDS[2], LEDS[2]]);
    assert!(rig.ctl.is_running());
}

/// Port whose output writes block while the gate is closed, standing in
/// for a driver call that hangs.
struct GatedPort {
    inner: Arc<SimGpio>,
    closed: Mutex<bool>,
    opened: Condvar,
    blocked: AtomicUsize,
}

impl GatedPort {
    fn new(inner: Arc<SimGpio>) -> Self {
        Self {
            inner,
            closed: Mutex::new(false),
            opened: Condvar::new(),
            blocked: AtomicUsize::new(0),
        }
    }

    fn close(&self) {
        *self.closed.lock().unwrap() = true;
    }

    fn open(&self) {
        *self.closed.lock().unwrap() = false;
        self.opened.notify_all();
    }
}

impl HardwarePort for GatedPort {
    fn request_line(&self, id: LineId, mode: LineMode) -> Result<(), PortError> {
        self.inner.request_line(id, mode)
    }

    fn release_line(&self, id: LineId) {
        self.inner.release_line(id);
    }

    fn set_line(&self, id: LineId, high: bool) -> Result<(), PortError> {
        let mut closed = self.closed.lock().unwrap();
        if *closed {
            self.blocked.fetch_add(1, Ordering::SeqCst);
            while *closed {
                closed = self.opened.wait(closed).unwrap();
            }
            self.blocked.fetch_sub(1, Ordering::SeqCst);
        }
        drop(closed);
        self.inner.set_line(id, high)
    }

    fn get_line(&self, id: LineId) -> Result<bool, PortError> {
        self.inner.get_line(id)
    }

    fn set_debounce(&self, id: LineId, window_ms: u32) -> Result<(), PortError> {
        self.inner.set_debounce(id, window_ms)
    }

    fn map_to_edge_source(&self, id: LineId) -> Result<EdgeSource, PortError> {
        self.inner.map_to_edge_source(id)
    }

    fn register_edge_callback(
        &self,
        source: EdgeSource,
        polarity: EdgePolarity,
        callback: EdgeCallback,
    ) -> Result<(), PortError> {
        self.inner.register_edge_callback(source, polarity, callback)
    }

    fn unregister_edge_callback(&self, source: EdgeSource) {
        self.inner.unregister_edge_callback(source);
    }
}

#[test]
fn hung_task_times_out_then_shutdown_retries() {
    let (gpio, clock) = bare();
    let port = Arc::new(GatedPort::new(gpio.clone()));
    let mut ctl = Controller::start(
        ControllerConfig {
            mode: Mode::On,
            shutdown_grace_ms: 100,
            ..config(20)
        },
        port.clone(),
        clock,
    )
    .unwrap();
    assert!(wait_until(Duration::from_secs(1), || {
        LEDS.iter().all(|&id| gpio.level(id))
    }));

    port.close();
    assert!(wait_until(Duration::from_secs(1), || {
        port.blocked.load(Ordering::SeqCst) > 0
    }));

    let started = Instant::now();
    assert_eq!(ctl.shutdown(), Err(Error::ShutdownTimeout));
    // Period plus grace is 120 ms.
    assert!(started.elapsed() < Duration::from_secs(1));
    assert!(ctl.is_running());
    assert!(LEDS.iter().chain([BUTTON].iter()).all(|&id| gpio.is_claimed(id)));
    assert!(!gpio.has_edge_callback(BUTTON));

    port.open();
    ctl.shutdown().unwrap();
    assert!(!ctl.is_running());
    assert!(nothing_claimed(&gpio));
    assert!(LEDS.iter().all(|&id| !gpio.level(id)));
}
