//! Configuration surface against a running controller.

use chaselight::{Attribute, Error};

use crate::support::{BUTTON, Rig, config};

#[test]
fn every_attribute_is_readable() {
    let rig = Rig::start(config(20));
    for attr in Attribute::ALL {
        assert!(!rig.ctl.surface().show(attr).is_empty(), "{attr}");
    }
    assert_eq!(rig.show("mode"), "default");
    assert_eq!(rig.show("blinkPeriodMs"), "20");
    assert_eq!(rig.show("burstCount"), "1");
    assert_eq!(rig.show("debounceEnabled"), "0");
    assert_eq!(rig.show("debounceWindowMs"), "200");
}

#[test]
fn rejected_writes_keep_previous_value() {
    let rig = Rig::start(config(20));
    let surface = rig.ctl.surface();

    assert!(surface.store(Attribute::BlinkPeriodMs, "0").is_err());
    assert!(surface.store(Attribute::BlinkPeriodMs, "fast").is_err());
    assert_eq!(rig.show("blinkPeriodMs"), "20");

    assert!(surface.store(Attribute::Mode, "strobe").is_err());
    assert_eq!(rig.show("mode"), "default");

    assert!(surface.store(Attribute::BurstCount, "-1").is_err());
    assert_eq!(rig.show("burstCount"), "1");
}

#[test]
fn read_only_attributes_refuse_writes() {
    let rig = Rig::start(config(20));
    for name in ["lastPressTime", "interPressInterval", "ledState", "droppedTriggers"] {
        let err = rig.ctl.surface().execute(&format!("{name}=1")).unwrap_err();
        assert_eq!(err, Error::InvalidConfiguration("attribute is read-only"));
    }
}

#[test]
fn accepted_write_reports_bytes_consumed() {
    let rig = Rig::start(config(20));
    let n = rig.ctl.surface().store(Attribute::Mode, "burst\n").unwrap();
    assert_eq!(n, 6);
    assert_eq!(rig.show("mode"), "burst");
    // Legacy numeric aliases.
    rig.set("mode", "1");
    assert_eq!(rig.show("mode"), "on");
    rig.set("mode", "0");
    assert_eq!(rig.show("mode"), "default");
}

#[test]
fn window_change_reprograms_port_only_while_enabled() {
    let rig = Rig::start(config(20));
    rig.set("debounceWindowMs", "50");
    assert_eq!(rig.gpio.debounce_ms(BUTTON), 0);

    rig.set("debounceEnabled", "1");
    assert_eq!(rig.gpio.debounce_ms(BUTTON), 50);
    rig.set("debounceWindowMs", "75");
    assert_eq!(rig.gpio.debounce_ms(BUTTON), 75);
}

#[test]
fn port_failure_on_debounce_leaves_flag_unchanged() {
    let rig = Rig::start(config(20));
    rig.gpio.fail_debounce(true);
    let err = rig.ctl.surface().execute("debounceEnabled=1").unwrap_err();
    assert_eq!(err, Error::HardwareWriteFailure(BUTTON));
    assert_eq!(rig.show("debounceEnabled"), "0");
}
