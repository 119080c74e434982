//! Service tests
//!
//! Contains test suites for:
//! - bind / unbind / dispatch behaviour end to end on the simulated display
//! - Service lifecycle (start, shutdown, drop)
//! - The single-hotkey `Keybinder`


use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

use crate::backend::simulated::SimulatedDisplay;
use crate::core::{Handler, Value};
use crate::service::HotkeyService;

const SETTLE: Duration = Duration::from_secs(5);

type Calls = Arc<Mutex<Vec<Vec<Value>>>>;

fn recording_handler() -> (Handler, Calls) {
    let calls: Calls = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&calls);
    let handler = Handler::new(move |args| {
        sink.lock().push(args.to_vec());
        Ok(())
    });
    (handler, calls)
}

/// Service over a fresh simulated display, not yet started.
fn service() -> (HotkeyService, SimulatedDisplay) {
    let (display, events) = SimulatedDisplay::new();
    let service = HotkeyService::new(display.clone(), events).unwrap();
    (service, display)
}

/// Service over a fresh simulated display with the loop running.
fn started() -> (HotkeyService, SimulatedDisplay) {
    let (service, display) = service();
    service.start().unwrap();
    (service, display)
}

/// Presses `accel` and waits for the loop to finish with it.
fn press(display: &SimulatedDisplay, accel: &str) -> bool {
    let routed = display.press(accel);
    assert!(display.wait_idle(SETTLE), "dispatch did not settle");
    routed
}
