//! Shared rig for integration tests.

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use chaselight::adapters::clock::ManualClock;
use chaselight::adapters::sim::{SimGpio, Toggle};
use chaselight::app::ports::LineId;
use chaselight::{Controller, ControllerConfig};

pub const LEDS: [LineId; 3] = [11, 12, 13];
pub const BUTTON: LineId = 16;

pub struct Rig {
    pub gpio: Arc<SimGpio>,
    pub clock: Arc<ManualClock>,
    pub ctl: Controller,
}

#[allow(dead_code)]
impl Rig {
    pub fn start(config: ControllerConfig) -> Self {
        let clock = Arc::new(ManualClock::new(Duration::from_secs(3_600)));
        let gpio = Arc::new(SimGpio::new(clock.clone()));
        let ctl = Controller::start(config, gpio.clone(), clock.clone())
            .expect("controller should start");
        Self { gpio, clock, ctl }
    }

    /// One press, with the clock moved on first so presses never share a
    /// timestamp.
    pub fn press(&self) {
        self.clock.advance(Duration::from_millis(1));
        self.gpio.press(BUTTON);
    }

    pub fn show(&self, name: &str) -> String {
        self.ctl.surface().execute(name).expect("readable attribute")
    }

    pub fn set(&self, name: &str, value: &str) {
        self.ctl
            .surface()
            .execute(&format!("{name}={value}"))
            .expect("accepted write");
    }

    pub fn led_history(&self) -> Vec<Toggle> {
        self.gpio
            .history()
            .into_iter()
            .filter(|t| LEDS.contains(&t.line))
            .collect()
    }

    pub fn all_leds(&self, on: bool) -> bool {
        LEDS.iter().all(|&id| self.gpio.level(id) == on)
    }

    /// Wait for the LED history to reach `n` toggles, then for it to stay
    /// put for `settle`.  Returns the settled history.
    pub fn settled_history(&self, n: usize, settle: Duration) -> Vec<Toggle> {
        wait_until(Duration::from_secs(5), || self.led_history().len() >= n);
        thread::sleep(settle);
        self.led_history()
    }
}

/// Poll `cond` every 2 ms until it holds or `timeout` passes.
pub fn wait_until(timeout: Duration, mut cond: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if cond() {
            return true;
        }
        thread::sleep(Duration::from_millis(2));
    }
    cond()
}

pub fn config(period_ms: u32) -> ControllerConfig {
    ControllerConfig {
        led_lines: LEDS,
        button_line: BUTTON,
        blink_period_ms: period_ms,
        debounce_enabled: false,
        shutdown_grace_ms: 500,
        ..ControllerConfig::default()
    }
}

/// Replay a toggle history and check no two LEDs are ever lit together.
pub fn assert_at_most_one_lit(history: &[Toggle]) {
    let mut lit: Vec<LineId> = Vec::new();
    for t in history {
        if t.level {
            lit.push(t.line);
        } else {
            lit.retain(|&l| l != t.line);
        }
        assert!(lit.len() <= 1, "LEDs {:?} lit together", lit);
    }
}

/// Check the history is whole chases: LED1 on/off, LED2 on/off, LED3
/// on/off, repeated.
pub fn assert_round_robin(history: &[Toggle]) {
    assert_eq!(history.len() % 6, 0, "partial chase: {:?}", history);
    for (i, pair) in history.chunks(2).enumerate() {
        let led = LEDS[i % 3];
        assert_eq!((pair[0].line, pair[0].level), (led, true), "step {i}");
        assert_eq!((pair[1].line, pair[1].level), (led, false), "step {i}");
    }
}
