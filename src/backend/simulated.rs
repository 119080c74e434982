//! In-memory display
//!
//! Behaves like a single X server with a US keyboard: it keeps a grab
//! table, refuses grabs that "another client" owns, and only routes key
//! presses to us when a matching grab exists. Used by the test suites and
//! by `hotkey-binder run --simulate`.
//!
//! `press` respects grabs (like a real server); `press_raw` always delivers,
//! which models an event that was already queued when its grab went away.

use parking_lot::{Condvar, Mutex};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::backend::{lock_variants, BackendError, EventSource, GrabBackend, KeyPress, NativeEvent};
use crate::core::keysym::{
    XK_ALT_L, XK_ALT_R, XK_CAPS_LOCK, XK_CONTROL_L, XK_CONTROL_R, XK_META_L, XK_NUM_LOCK,
    XK_SCROLL_LOCK, XK_SHIFT_L, XK_SHIFT_R, XK_SUPER_L, XK_SUPER_R,
};
use crate::core::{parser::parse_accelerator, Keycode, Keymap, Keysym, ModMask};

/// Keycodes and keysyms of a stock evdev US layout (level 0, level 1)
const US_LAYOUT: &[(Keycode, &[Keysym])] = &[
    (9, &[0xff1b]),
    (10, &[0x31, 0x21]),
    (11, &[0x32, 0x40]),
    (12, &[0x33, 0x23]),
    (13, &[0x34, 0x24]),
    (14, &[0x35, 0x25]),
    (15, &[0x36, 0x5e]),
    (16, &[0x37, 0x26]),
    (17, &[0x38, 0x2a]),
    (18, &[0x39, 0x28]),
    (19, &[0x30, 0x29]),
    (20, &[0x2d, 0x5f]),
    (21, &[0x3d, 0x2b]),
    (22, &[0xff08]),
    (23, &[0xff09]),
    (24, &[0x71, 0x51]),
    (25, &[0x77, 0x57]),
    (26, &[0x65, 0x45]),
    (27, &[0x72, 0x52]),
    (28, &[0x74, 0x54]),
    (29, &[0x79, 0x59]),
    (30, &[0x75, 0x55]),
    (31, &[0x69, 0x49]),
    (32, &[0x6f, 0x4f]),
    (33, &[0x70, 0x50]),
    (34, &[0x5b, 0x7b]),
    (35, &[0x5d, 0x7d]),
    (36, &[0xff0d]),
    (37, &[XK_CONTROL_L]),
    (38, &[0x61, 0x41]),
    (39, &[0x73, 0x53]),
    (40, &[0x64, 0x44]),
    (41, &[0x66, 0x46]),
    (42, &[0x67, 0x47]),
    (43, &[0x68, 0x48]),
    (44, &[0x6a, 0x4a]),
    (45, &[0x6b, 0x4b]),
    (46, &[0x6c, 0x4c]),
    (47, &[0x3b, 0x3a]),
    (48, &[0x27, 0x22]),
    (49, &[0x60, 0x7e]),
    (50, &[XK_SHIFT_L]),
    (51, &[0x5c, 0x7c]),
    (52, &[0x7a, 0x5a]),
    (53, &[0x78, 0x58]),
    (54, &[0x63, 0x43]),
    (55, &[0x76, 0x56]),
    (56, &[0x62, 0x42]),
    (57, &[0x6e, 0x4e]),
    (58, &[0x6d, 0x4d]),
    (59, &[0x2c, 0x3c]),
    (60, &[0x2e, 0x3e]),
    (61, &[0x2f, 0x3f]),
    (62, &[XK_SHIFT_R]),
    (64, &[XK_ALT_L, XK_META_L]),
    (65, &[0x20]),
    (66, &[XK_CAPS_LOCK]),
    (67, &[0xffbe]),
    (68, &[0xffbf]),
    (69, &[0xffc0]),
    (70, &[0xffc1]),
    (71, &[0xffc2]),
    (72, &[0xffc3]),
    (73, &[0xffc4]),
    (74, &[0xffc5]),
    (75, &[0xffc6]),
    (76, &[0xffc7]),
    (77, &[XK_NUM_LOCK]),
    (78, &[XK_SCROLL_LOCK]),
    (95, &[0xffc8]),
    (96, &[0xffc9]),
    (105, &[XK_CONTROL_R]),
    (107, &[0xff61]),
    (108, &[XK_ALT_R]),
    (110, &[0xff50]),
    (111, &[0xff52]),
    (112, &[0xff55]),
    (113, &[0xff51]),
    (114, &[0xff53]),
    (115, &[0xff57]),
    (116, &[0xff54]),
    (117, &[0xff56]),
    (118, &[0xff63]),
    (119, &[0xffff]),
    (127, &[0xff13]),
    (133, &[XK_SUPER_L]),
    (134, &[XK_SUPER_R]),
];

/// The keymap every simulated display reports.
pub fn us_keymap() -> Keymap {
    let levels: HashMap<Keycode, Vec<Keysym>> = US_LAYOUT
        .iter()
        .map(|(keycode, syms)| (*keycode, syms.to_vec()))
        .collect();

    let modifier_map: [Vec<Keycode>; 8] = [
        vec![50, 62],   // Shift
        vec![66],       // Lock
        vec![37, 105],  // Control
        vec![64, 108],  // Mod1: Alt
        vec![77],       // Mod2: NumLock
        vec![],         // Mod3
        vec![133, 134], // Mod4: Super
        vec![78],       // Mod5: ScrollLock
    ];

    Keymap::new(levels, modifier_map)
}

#[derive(Default)]
struct Progress {
    delivered: u64,
    finished: u64,
}

struct Shared {
    keymap: Keymap,
    grabs: Mutex<HashSet<(ModMask, Keycode)>>,
    refused: Mutex<HashSet<Keycode>>,
    sender: Mutex<Option<Sender<NativeEvent>>>,
    progress: Mutex<Progress>,
    drained: Condvar,
    clock: AtomicU32,
}

/// Grab half of the simulated display; cheap to clone
#[derive(Clone)]
pub struct SimulatedDisplay {
    shared: Arc<Shared>,
}

/// Event half of the simulated display
pub struct SimulatedEvents {
    receiver: Receiver<NativeEvent>,
    shared: Arc<Shared>,
    in_flight: bool,
}

impl SimulatedDisplay {
    /// Creates a display and its event source.
    pub fn new() -> (Self, SimulatedEvents) {
        let (sender, receiver) = channel();
        let shared = Arc::new(Shared {
            keymap: us_keymap(),
            grabs: Mutex::new(HashSet::new()),
            refused: Mutex::new(HashSet::new()),
            sender: Mutex::new(Some(sender)),
            progress: Mutex::new(Progress::default()),
            drained: Condvar::new(),
            clock: AtomicU32::new(1000),
        });

        (
            Self {
                shared: Arc::clone(&shared),
            },
            SimulatedEvents {
                receiver,
                shared,
                in_flight: false,
            },
        )
    }

    /// Makes every later grab of `key_name` fail as if another client owned it.
    pub fn refuse_key(&self, key_name: &str) {
        if let Some(keycode) = self.keycode_of(key_name) {
            self.shared.refused.lock().insert(keycode);
        }
    }

    /// True if `accelerator` is currently grabbed (base variant).
    pub fn is_grabbed(&self, accelerator: &str) -> bool {
        self.native(accelerator)
            .map(|(mask, keycode)| self.shared.grabs.lock().contains(&(mask, keycode)))
            .unwrap_or(false)
    }

    /// Number of grab entries, lock variants included.
    pub fn grab_count(&self) -> usize {
        self.shared.grabs.lock().len()
    }

    /// Presses `accelerator` with extra `state` bits (e.g. NumLock on).
    ///
    /// Returns false when no grab matches, i.e. the press went to some
    /// other application.
    pub fn press_with_state(&self, accelerator: &str, state: ModMask) -> bool {
        let Some((mask, keycode)) = self.native(accelerator) else {
            return false;
        };
        let state = mask | state;
        let routed = self.shared.grabs.lock().contains(&(state, keycode));
        if routed {
            self.press_raw(keycode, state);
        }
        routed
    }

    /// Presses `accelerator`, delivered only if grabbed.
    pub fn press(&self, accelerator: &str) -> bool {
        self.press_with_state(accelerator, ModMask::empty())
    }

    /// Delivers a raw key press regardless of grabs.
    pub fn press_raw(&self, keycode: Keycode, state: ModMask) {
        let time = self.shared.clock.fetch_add(10, Ordering::SeqCst);
        let event = NativeEvent::KeyPress(KeyPress { keycode, state, time });

        let sender = self.shared.sender.lock();
        if let Some(sender) = sender.as_ref() {
            let mut progress = self.shared.progress.lock();
            if sender.send(event).is_ok() {
                progress.delivered += 1;
            }
        }
    }

    /// Blocks until the dispatch thread has finished every delivered press.
    ///
    /// Returns false on timeout.
    pub fn wait_idle(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut progress = self.shared.progress.lock();
        while progress.finished < progress.delivered {
            if self.shared.drained.wait_until(&mut progress, deadline).timed_out() {
                return progress.finished >= progress.delivered;
            }
        }
        true
    }

    /// Closes the event source, as if the display went away.
    pub fn disconnect(&self) {
        self.shared.sender.lock().take();
    }

    fn keycode_of(&self, key_name: &str) -> Option<Keycode> {
        crate::core::keysym::keysym_from_name(key_name).and_then(|k| self.shared.keymap.keycode_for(k))
    }

    fn native(&self, accelerator: &str) -> Option<(ModMask, Keycode)> {
        let accel = parse_accelerator(accelerator).ok()?;
        let combo = self.shared.keymap.resolve(&accel).ok()?;
        Some((combo.mask, combo.keycode))
    }
}

impl GrabBackend for SimulatedDisplay {
    fn keymap(&self) -> Result<Keymap, BackendError> {
        Ok(self.shared.keymap.clone())
    }

    fn grab(&self, combo: &crate::core::NativeCombo, ignored: ModMask) -> Result<(), BackendError> {
        if self.shared.refused.lock().contains(&combo.keycode) {
            return Err(BackendError::AlreadyGrabbed);
        }

        let mut grabs = self.shared.grabs.lock();
        for mask in lock_variants(combo.mask, ignored) {
            grabs.insert((mask, combo.keycode));
        }
        Ok(())
    }

    fn ungrab(&self, combo: &crate::core::NativeCombo, ignored: ModMask) {
        let mut grabs = self.shared.grabs.lock();
        for mask in lock_variants(combo.mask, ignored) {
            grabs.remove(&(mask, combo.keycode));
        }
    }

    fn wake(&self) {
        if let Some(sender) = self.shared.sender.lock().as_ref() {
            let _ = sender.send(NativeEvent::Wakeup);
        }
    }

    fn name(&self) -> &'static str {
        "simulated"
    }
}

impl SimulatedEvents {
    fn finish_previous(&mut self) {
        if self.in_flight {
            self.in_flight = false;
            self.shared.progress.lock().finished += 1;
            self.shared.drained.notify_all();
        }
    }
}

impl EventSource for SimulatedEvents {
    fn next_event(&mut self) -> Result<Option<NativeEvent>, BackendError> {
        // Being asked for the next event means the previous one is done.
        self.finish_previous();

        match self.receiver.recv() {
            Ok(event) => {
                self.in_flight = matches!(event, NativeEvent::KeyPress(_));
                Ok(Some(event))
            }
            Err(_) => Ok(None),
        }
    }
}

impl Drop for SimulatedEvents {
    fn drop(&mut self) {
        self.finish_previous();
    }
}
