//! Actuation behaviour per mode, observed through the toggle history.

use std::thread;
use std::time::Duration;

use chaselight::ControllerConfig;
use chaselight::Mode;
use chaselight::config::BurstTrigger;

use crate::support::{Rig, assert_at_most_one_lit, assert_round_robin, config, wait_until};

fn burst(period_ms: u32, count: u32) -> ControllerConfig {
    ControllerConfig {
        mode: Mode::Burst,
        burst_count: count,
        ..config(period_ms)
    }
}

#[test]
fn three_chases_give_eighteen_toggles_in_order() {
    let rig = Rig::start(burst(20, 3));
    rig.press();
    let history = rig.settled_history(18, Duration::from_millis(120));
    assert_eq!(history.len(), 18);
    assert_round_robin(&history);
    assert_at_most_one_lit(&history);
    assert!(rig.all_leds(false));
    assert!(!rig.ctl.state().burst_active());
}

#[test]
fn zero_count_burst_toggles_nothing() {
    let rig = Rig::start(burst(20, 0));
    rig.press();
    thread::sleep(Duration::from_millis(120));
    assert!(rig.led_history().is_empty());
    assert_eq!(rig.show("pressCount"), "1");
}

#[test]
fn no_press_no_burst() {
    let rig = Rig::start(burst(20, 1));
    thread::sleep(Duration::from_millis(100));
    assert!(rig.led_history().is_empty());
}

#[test]
fn on_and_default_drive_all_lines() {
    let rig = Rig::start(ControllerConfig {
        mode: Mode::On,
        ..config(40)
    });
    assert!(wait_until(Duration::from_secs(1), || rig.all_leds(true)));
    assert_eq!(rig.show("ledState"), "1");

    rig.set("mode", "default");
    assert!(wait_until(Duration::from_secs(1), || rig.all_leds(false)));
    assert_eq!(rig.show("ledState"), "0");
}

#[test]
fn entering_burst_from_on_clears_leds_first() {
    let rig = Rig::start(ControllerConfig {
        mode: Mode::On,
        burst_count: 1,
        ..config(20)
    });
    assert!(wait_until(Duration::from_secs(1), || rig.all_leds(true)));
    rig.set("mode", "burst");
    assert!(wait_until(Duration::from_secs(1), || rig.all_leds(false)));

    rig.gpio.clear_history();
    rig.press();
    let history = rig.settled_history(6, Duration::from_millis(80));
    assert_round_robin(&history);
    assert_at_most_one_lit(&history);
}

#[test]
fn press_outside_burst_is_not_remembered() {
    let rig = Rig::start(config(20));
    rig.press();
    thread::sleep(Duration::from_millis(60));
    rig.set("mode", "burst");
    thread::sleep(Duration::from_millis(120));
    assert!(rig.led_history().is_empty());
}

#[test]
fn presses_during_a_burst_queue_one_more() {
    let rig = Rig::start(burst(30, 1));
    rig.press();
    assert!(wait_until(Duration::from_secs(1), || rig.ctl.state().burst_active()));
    for _ in 0..4 {
        rig.press();
    }
    let history = rig.settled_history(12, Duration::from_millis(200));
    assert_eq!(history.len(), 12);
    assert_round_robin(&history);
    assert_eq!(rig.show("pressCount"), "5");
}

#[test]
fn presses_during_a_burst_are_dropped_without_retrigger() {
    let rig = Rig::start(ControllerConfig {
        burst_retrigger: false,
        ..burst(30, 1)
    });
    rig.press();
    assert!(wait_until(Duration::from_secs(1), || rig.ctl.state().burst_active()));
    rig.press();
    let history = rig.settled_history(6, Duration::from_millis(200));
    assert_eq!(history.len(), 6);
    assert_eq!(rig.show("pressCount"), "2");
}

#[test]
fn continuous_trigger_chases_without_presses() {
    let rig = Rig::start(ControllerConfig {
        burst_trigger: BurstTrigger::Continuous,
        ..burst(10, 1)
    });
    assert!(wait_until(Duration::from_secs(2), || rig.led_history().len() >= 12));
    assert_at_most_one_lit(&rig.led_history());
}

#[test]
fn period_change_applies_to_next_burst() {
    let rig = Rig::start(burst(20, 1));
    rig.set("blinkPeriodMs", "5");
    rig.set("burstCount", "2");
    rig.press();
    let history = rig.settled_history(12, Duration::from_millis(60));
    assert_eq!(history.len(), 12);
    assert_round_robin(&history);
}

#[test]
fn mode_and_period_writes_wait_for_the_burst_in_flight() {
    let rig = Rig::start(burst(30, 1));
    rig.press();
    assert!(wait_until(Duration::from_secs(1), || rig.ctl.state().burst_active()));

    rig.set("mode", "on");
    rig.set("blinkPeriodMs", "5");
    assert!(wait_until(Duration::from_secs(1), || rig.all_leds(true)));

    let history = rig.led_history();
    assert_eq!(history.len(), 9, "{history:?}");
    // The chase that was running completes at its starting period.
    assert_round_robin(&history[..6]);
    // Only then does ON take over.
    assert!(history[6..].iter().all(|t| t.level));
    assert!(!rig.ctl.state().burst_active());
    assert_eq!(rig.show("blinkPeriodMs"), "5");
}

