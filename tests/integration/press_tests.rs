//! Button edges → press statistics, with and without debounce.

use std::time::Duration;

use chaselight::ControllerConfig;

use crate::support::{BUTTON, Rig, config};

#[test]
fn every_edge_counts_with_debounce_off() {
    let rig = Rig::start(config(20));
    for _ in 0..7 {
        rig.press();
    }
    assert_eq!(rig.show("pressCount"), "7");
}

#[test]
fn bounce_inside_window_counts_once() {
    let rig = Rig::start(ControllerConfig {
        debounce_enabled: true,
        debounce_window_ms: 200,
        ..config(20)
    });
    rig.gpio.press(BUTTON);
    rig.gpio.press(BUTTON);
    rig.gpio.press(BUTTON);
    assert_eq!(rig.show("pressCount"), "1");

    rig.clock.advance(Duration::from_millis(200));
    rig.gpio.press(BUTTON);
    assert_eq!(rig.show("pressCount"), "2");
}

#[test]
fn disabling_debounce_admits_edge_inside_old_window() {
    let rig = Rig::start(ControllerConfig {
        debounce_enabled: true,
        debounce_window_ms: 200,
        ..config(20)
    });
    rig.press();
    rig.clock.advance(Duration::from_millis(50));
    rig.gpio.press(BUTTON);
    assert_eq!(rig.show("pressCount"), "1");

    rig.set("debounceEnabled", "0");
    assert_eq!(rig.gpio.debounce_ms(BUTTON), 0);
    rig.clock.advance(Duration::from_millis(10));
    rig.gpio.press(BUTTON);
    assert_eq!(rig.show("pressCount"), "2");

    rig.set("debounceEnabled", "1");
    assert_eq!(rig.gpio.debounce_ms(BUTTON), 200);
}

#[test]
fn timestamps_and_interval() {
    let rig = Rig::start(config(20));
    // Before any press the last-press time is the start time (01:00:00).
    assert_eq!(rig.show("lastPressTime"), "01:00:00.000000000");
    assert_eq!(rig.show("interPressInterval"), "0.000000000");

    rig.clock.advance(Duration::from_millis(1_500));
    rig.gpio.press(BUTTON);
    assert_eq!(rig.show("lastPressTime"), "01:00:01.500000000");

    rig.clock.advance(Duration::from_millis(1_250));
    rig.gpio.press(BUTTON);
    assert_eq!(rig.show("lastPressTime"), "01:00:02.750000000");
    assert_eq!(rig.show("interPressInterval"), "1.250000000");
}

#[test]
fn press_count_can_be_reset() {
    let rig = Rig::start(config(20));
    rig.press();
    rig.press();
    rig.set("pressCount", "0");
    assert_eq!(rig.show("pressCount"), "0");
    rig.press();
    assert_eq!(rig.show("pressCount"), "1");
}

#[test]
fn presses_while_running_are_never_dropped() {
    let rig = Rig::start(config(20));
    for _ in 0..20 {
        rig.press();
    }
    assert_eq!(rig.show("droppedTriggers"), "0");
}
