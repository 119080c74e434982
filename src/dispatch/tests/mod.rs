//! Dispatch loop and invocation gate tests
//!
//! Contains test suites for:
//! - Single-event routing through `Dispatcher::handle`
//! - The gate's failure isolation and race guard
//! - The threaded loop driven by the simulated display


use parking_lot::Mutex;
use std::sync::Arc;

use crate::backend::simulated::us_keymap;
use crate::core::{
    Accelerator, Binding, BindingId, BindingRegistry, Handler, HandlerError, KeyCombination,
    Value,
};
use crate::dispatch::{Dispatcher, InvocationGate, LoopStatus};

/// Calls recorded by a test handler
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

fn failing_handler() -> Handler {
    Handler::new(|_| Err(HandlerError::failed("boom")))
}

/// Registers `accel` directly in the registry (no grab) and returns its key.
fn register(
    registry: &BindingRegistry,
    id: u64,
    accel: &str,
    handler: Handler,
    extra: Vec<Value>,
) -> KeyCombination {
    let keymap = us_keymap();
    let native = keymap.resolve(&Accelerator::parse(accel).unwrap()).unwrap();
    let combination = keymap.canonical(native.mask, native.keycode).unwrap();
    registry
        .insert(Binding::new(
            BindingId(id),
            combination.clone(),
            native,
            handler,
            extra,
        ))
        .unwrap();
    combination
}

/// Dispatcher plus handles on the state it shares
struct Fixture {
    dispatcher: Dispatcher,
    registry: Arc<BindingRegistry>,
    gate: Arc<InvocationGate>,
    status: Arc<LoopStatus>,
}

fn fixture() -> Fixture {
    let registry = Arc::new(BindingRegistry::new());
    let gate = Arc::new(InvocationGate::new());
    let status = Arc::new(LoopStatus::new());
    let dispatcher = Dispatcher::new(
        Arc::new(us_keymap()),
        Arc::clone(&registry),
        Arc::clone(&gate),
        Arc::clone(&status),
    );
    Fixture {
        dispatcher,
        registry,
        gate,
        status,
    }
}
