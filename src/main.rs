//! Chase-light firmware — main entry point.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │  button-poll thread ──▶ HalGpio::poll ──▶ EdgeHandler     │
//! │                                                           │
//! │  led-actuator thread (ActuationTask) ──▶ LED1..LED3       │
//! │                                                           │
//! │  main thread: serial console ──▶ ConfigSurface::execute   │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! Console lines are `name` (read) or `name=value` (write); see
//! `chaselight::app::attributes` for the attribute table.
#![deny(unused_must_use)]

use std::io::{self, BufRead};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::Result;
use esp_idf_hal::gpio::{AnyOutputPin, OutputPin as _, PinDriver, Pull};
use esp_idf_hal::peripherals::Peripherals;
use log::{info, warn};

use chaselight::adapters::clock::SystemClock;
use chaselight::adapters::hal_gpio::HalGpio;
use chaselight::app::controller::Controller;
use chaselight::app::ports::{ClockPort, EdgePolarity, HardwarePort};
use chaselight::config::ControllerConfig;
use chaselight::drivers::task_pin::{self, Core, POLLER_PRIORITY};
use chaselight::pins;

/// Optional build-time overrides, e.g.
/// `CHASELIGHT_CONFIG='{"blink_period_ms":250}' cargo build`.
const CONFIG_JSON: Option<&str> = option_env!("CHASELIGHT_CONFIG");

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("chaselight v{}", env!("CARGO_PKG_VERSION"));

    // ── 2. Config ─────────────────────────────────────────────
    let mut config = match CONFIG_JSON.map(ControllerConfig::from_json) {
        Some(Ok(cfg)) => cfg,
        Some(Err(e)) => {
            warn!("Build-time config rejected ({}), using defaults", e);
            ControllerConfig::default()
        }
        None => ControllerConfig::default(),
    };
    // Only the pins taken below exist on this board.
    if config.pin_to_board() {
        warn!(
            "Config line ids ignored; using LEDs {:?}, button {}",
            config.led_lines, config.button_line
        );
    }

    // ── 3. Pins ───────────────────────────────────────────────
    // gpio11/12/13 and gpio16 are the `pins` LED and button lines.
    let peripherals = Peripherals::take()?;
    let led = |pin: AnyOutputPin| PinDriver::output(pin);
    let leds = [
        (pins::LED1_GPIO, led(peripherals.pins.gpio11.downgrade_output())?),
        (pins::LED2_GPIO, led(peripherals.pins.gpio12.downgrade_output())?),
        (pins::LED3_GPIO, led(peripherals.pins.gpio13.downgrade_output())?),
    ];
    let mut button = PinDriver::input(peripherals.pins.gpio16)?;
    button.set_pull(match config.edge {
        EdgePolarity::Rising => Pull::Down,
        EdgePolarity::Falling => Pull::Up,
    })?;

    let clock: Arc<dyn ClockPort> = Arc::new(SystemClock::new());
    let gpio = Arc::new(HalGpio::new(
        clock.clone(),
        leds,
        (pins::BUTTON_GPIO, button),
    ));

    // ── 4. Controller ─────────────────────────────────────────
    let hw: Arc<dyn HardwarePort> = gpio.clone();
    let mut controller = Controller::start(config, hw, clock)?;
    let surface = controller.surface().clone();

    // ── 5. Button poller ──────────────────────────────────────
    task_pin::spawn_on_core(Core::App, POLLER_PRIORITY, 4, "button-poll", move || {
        loop {
            gpio.poll();
            thread::sleep(Duration::from_millis(pins::BUTTON_POLL_MS));
        }
    })?;

    // ── 6. Console ────────────────────────────────────────────
    info!("Console ready: <attribute> or <attribute>=<value>, 'quit' to stop");
    let stdin = io::stdin();
    let mut line = String::new();
    loop {
        line.clear();
        match stdin.lock().read_line(&mut line) {
            Ok(0) => thread::sleep(Duration::from_millis(50)),
            Ok(_) => {
                let cmd = line.trim();
                if cmd.is_empty() {
                    continue;
                }
                if cmd == "quit" {
                    break;
                }
                match surface.execute(cmd) {
                    Ok(out) => println!("{out}"),
                    Err(e) => println!("error: {e}"),
                }
            }
            // UART stdin reports WouldBlock when no byte is waiting.
            Err(_) => thread::sleep(Duration::from_millis(50)),
        }
    }

    controller.shutdown()?;
    info!("Stopped; button poller left idle");
    loop {
        thread::sleep(Duration::from_secs(60));
    }
}
