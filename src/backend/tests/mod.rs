//! Grab adapter tests (lock variants and the simulated display)

use std::time::Duration;

use crate::backend::{
    lock_variants, simulated::SimulatedDisplay, BackendError, EventSource, GrabBackend, KeyPress,
    NativeEvent,
};
use crate::core::{Accelerator, ModMask, NativeCombo};

fn native(display: &SimulatedDisplay, accel: &str) -> NativeCombo {
    let keymap = display.keymap().unwrap();
    keymap.resolve(&Accelerator::parse(accel).unwrap()).unwrap()
}

#[test]
fn test_lock_variants_cover_every_subset() {
    let ignored = ModMask::LOCK | ModMask::MOD2 | ModMask::MOD5;
    let variants = lock_variants(ModMask::CONTROL, ignored);

    assert_eq!(variants.len(), 8);
    assert!(variants.contains(&ModMask::CONTROL));
    assert!(variants.contains(&(ModMask::CONTROL | ModMask::MOD2)));
    assert!(variants.contains(&(ModMask::CONTROL | ignored)));
    assert!(variants.iter().all(|m| m.contains(ModMask::CONTROL)));
}

#[test]
fn test_lock_variants_without_ignored_bits() {
    let variants = lock_variants(ModMask::SHIFT, ModMask::empty());
    assert_eq!(variants, vec![ModMask::SHIFT]);
}

#[test]
fn test_grab_registers_all_variants() {
    let (display, _events) = SimulatedDisplay::new();
    let keymap = display.keymap().unwrap();
    let combo = native(&display, "<Control><Alt>t");

    display.grab(&combo, keymap.ignored_mask()).unwrap();

    assert!(display.is_grabbed("<Control><Alt>t"));
    assert_eq!(display.grab_count(), 8);
}

#[test]
fn test_ungrab_is_idempotent() {
    let (display, _events) = SimulatedDisplay::new();
    let keymap = display.keymap().unwrap();
    let combo = native(&display, "<Super>Return");

    // Never grabbed: must be a silent no-op
    display.ungrab(&combo, keymap.ignored_mask());

    display.grab(&combo, keymap.ignored_mask()).unwrap();
    display.ungrab(&combo, keymap.ignored_mask());
    display.ungrab(&combo, keymap.ignored_mask());

    assert!(!display.is_grabbed("<Super>Return"));
    assert_eq!(display.grab_count(), 0);
}

#[test]
fn test_refused_key_leaves_nothing_grabbed() {
    let (display, _events) = SimulatedDisplay::new();
    let keymap = display.keymap().unwrap();
    display.refuse_key("F5");

    let combo = native(&display, "<Control>F5");
    let err = display.grab(&combo, keymap.ignored_mask()).unwrap_err();

    assert!(matches!(err, BackendError::AlreadyGrabbed));
    assert_eq!(display.grab_count(), 0);
}

#[test]
fn test_press_only_routes_grabbed_combinations() {
    let (display, mut events) = SimulatedDisplay::new();
    let keymap = display.keymap().unwrap();

    assert!(!display.press("<Control>t"));

    display
        .grab(&native(&display, "<Control>t"), keymap.ignored_mask())
        .unwrap();
    assert!(display.press("<Control>t"));

    match events.next_event().unwrap() {
        Some(NativeEvent::KeyPress(KeyPress { keycode, state, .. })) => {
            assert_eq!(keycode, 28);
            assert_eq!(state, ModMask::CONTROL);
        }
        other => panic!("expected key press, got {:?}", other),
    }
}

#[test]
fn test_press_with_numlock_hits_lock_variant() {
    let (display, mut events) = SimulatedDisplay::new();
    let keymap = display.keymap().unwrap();
    display
        .grab(&native(&display, "<Alt>F2"), keymap.ignored_mask())
        .unwrap();

    assert!(display.press_with_state("<Alt>F2", ModMask::MOD2));

    let Some(NativeEvent::KeyPress(press)) = events.next_event().unwrap() else {
        panic!("expected key press");
    };
    assert_eq!(press.state, ModMask::MOD1 | ModMask::MOD2);
}

#[test]
fn test_event_times_increase() {
    let (display, mut events) = SimulatedDisplay::new();
    display.press_raw(28, ModMask::empty());
    display.press_raw(28, ModMask::empty());

    let Some(NativeEvent::KeyPress(first)) = events.next_event().unwrap() else {
        panic!("expected key press");
    };
    let Some(NativeEvent::KeyPress(second)) = events.next_event().unwrap() else {
        panic!("expected key press");
    };
    assert!(second.time > first.time);
}

#[test]
fn test_wake_and_disconnect() {
    let (display, mut events) = SimulatedDisplay::new();

    display.wake();
    assert_eq!(events.next_event().unwrap(), Some(NativeEvent::Wakeup));

    display.disconnect();
    assert_eq!(events.next_event().unwrap(), None);
}

#[test]
fn test_wait_idle_tracks_consumed_presses() {
    let (display, mut events) = SimulatedDisplay::new();
    assert!(display.wait_idle(Duration::from_millis(10)));

    display.press_raw(28, ModMask::empty());
    assert!(!display.wait_idle(Duration::from_millis(20)));

    // Receiving the press starts it; asking for the next event finishes it
    events.next_event().unwrap();
    display.wake();
    events.next_event().unwrap();
    assert!(display.wait_idle(Duration::from_millis(100)));
}
