//! Idle probe tests

use std::time::Duration;

use crate::idle::{IdleProbe, IdleSource, ManualIdleClock};

/// A source whose extension is missing
struct NoExtension;

impl IdleSource for NoExtension {
    fn idle_millis(&self) -> Option<u64> {
        None
    }
}

#[test]
fn test_idle_time_grows_while_idle() {
    let clock = ManualIdleClock::new();
    let probe = IdleProbe::with_source(clock.clone());

    clock.advance(Duration::from_secs(30));
    clock.input();
    let right_after_input = probe.idle_seconds();

    clock.advance(Duration::from_secs(5));
    let after_delay = probe.idle_seconds();

    assert_eq!(right_after_input, 0);
    assert!(after_delay > right_after_input);
    assert_eq!(after_delay, 5);
}

#[test]
fn test_rounds_down_to_whole_seconds() {
    let clock = ManualIdleClock::new();
    let probe = IdleProbe::with_source(clock.clone());

    clock.advance(Duration::from_millis(2999));
    assert_eq!(probe.idle_seconds(), 2);
}

#[test]
fn test_missing_extension_reads_zero() {
    let probe = IdleProbe::with_source(NoExtension);
    assert!(probe.is_available());
    assert_eq!(probe.idle_seconds(), 0);
}

#[test]
fn test_closed_probe_reads_zero() {
    let clock = ManualIdleClock::new();
    let mut probe = IdleProbe::with_source(clock.clone());
    clock.advance(Duration::from_secs(60));
    assert_eq!(probe.idle_seconds(), 60);

    probe.close();
    probe.close();

    assert!(!probe.is_available());
    assert_eq!(probe.idle_seconds(), 0);
}

#[test]
fn test_unavailable_probe() {
    let probe: IdleProbe<ManualIdleClock> = IdleProbe::unavailable();
    assert_eq!(probe.idle_seconds(), 0);
}
