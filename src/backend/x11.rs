// Copyright 2025 Eric Jingryd (tidynest@proton.me)
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! X11 backend (`XGrabKey` on the root window)
//!
//! Uses one `RustConnection` shared by both halves: grabs are issued from
//! the caller thread while the dispatch thread sits in `wait_for_event`.
//! x11rb connections are internally synchronised, so this needs no extra
//! locking here.
//!
//! Waking the dispatch thread is done by sending a `ClientMessage` to a
//! private InputOnly window; the event source turns it into
//! [`NativeEvent::Wakeup`].

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, warn};
use x11rb::connection::Connection;
use x11rb::errors::ReplyError;
use x11rb::protocol::xproto::{
    self, AtomEnum, ClientMessageEvent, ConnectionExt as _, CreateWindowAux, EventMask, GrabMode,
    Window, WindowClass,
};
use x11rb::protocol::{ErrorKind, Event};
use x11rb::rust_connection::RustConnection;

use crate::backend::{lock_variants, BackendError, EventSource, GrabBackend, KeyPress, NativeEvent};
use crate::core::{Keycode, Keymap, ModMask, NativeCombo};

/// Grab half of the X11 backend
pub struct X11Backend {
    conn: Arc<RustConnection>,
    root: Window,
    wake_window: Window,
}

/// Event half of the X11 backend, owned by the dispatch thread
pub struct X11Events {
    conn: Arc<RustConnection>,
    wake_window: Window,
}

/// Opens the display (`None` → `$DISPLAY`) and returns both halves.
pub fn connect(display: Option<&str>) -> Result<(X11Backend, X11Events), BackendError> {
    let (conn, screen_num) = x11rb::connect(display)?;
    let root = conn
        .setup()
        .roots
        .get(screen_num)
        .map(|screen| screen.root)
        .ok_or(BackendError::NoScreen(screen_num))?;

    let wake_window = conn.generate_id()?;
    conn.create_window(
        x11rb::COPY_DEPTH_FROM_PARENT,
        wake_window,
        root,
        0,
        0,
        1,
        1,
        0,
        WindowClass::INPUT_ONLY,
        x11rb::COPY_FROM_PARENT,
        &CreateWindowAux::new(),
    )?
    .check()?;

    debug!(screen = screen_num, root, wake_window, "Connected to X display");

    let conn = Arc::new(conn);
    Ok((
        X11Backend {
            conn: Arc::clone(&conn),
            root,
            wake_window,
        },
        X11Events { conn, wake_window },
    ))
}

impl X11Backend {
    fn grab_one(&self, mask: ModMask, keycode: Keycode) -> Result<(), BackendError> {
        self.conn
            .grab_key(
                false,
                self.root,
                xproto::ModMask::from(mask.bits()),
                keycode,
                GrabMode::ASYNC,
                GrabMode::ASYNC,
            )?
            .check()
            .map_err(|err| match err {
                ReplyError::X11Error(ref x) if x.error_kind == ErrorKind::Access => {
                    BackendError::AlreadyGrabbed
                }
                other => BackendError::Reply(other),
            })
    }

    fn ungrab_one(&self, mask: ModMask, keycode: Keycode) {
        let result = self
            .conn
            .ungrab_key(keycode, self.root, xproto::ModMask::from(mask.bits()));
        if let Err(err) = result {
            debug!(%err, keycode, "Ungrab request not sent");
        }
    }
}

impl GrabBackend for X11Backend {
    fn keymap(&self) -> Result<Keymap, BackendError> {
        let setup = self.conn.setup();
        let min = setup.min_keycode;
        let count = setup.max_keycode.saturating_sub(min).saturating_add(1);

        let mapping = self.conn.get_keyboard_mapping(min, count)?.reply()?;
        let per_keycode = usize::from(mapping.keysyms_per_keycode);

        let mut levels = HashMap::new();
        if per_keycode > 0 {
            for (offset, syms) in mapping.keysyms.chunks(per_keycode).enumerate() {
                let keycode = u8::try_from(offset).ok().and_then(|o| min.checked_add(o));
                if let Some(keycode) = keycode {
                    levels.insert(keycode, syms.to_vec());
                }
            }
        }

        let modifiers = self.conn.get_modifier_mapping()?.reply()?;
        let per_row = modifiers.keycodes.len() / 8;
        let mut rows: [Vec<Keycode>; 8] = Default::default();
        if per_row > 0 {
            for (row, keycodes) in modifiers.keycodes.chunks(per_row).take(8).enumerate() {
                rows[row] = keycodes.iter().copied().filter(|k| *k != 0).collect();
            }
        }

        Ok(Keymap::new(levels, rows))
    }

    fn grab(&self, combo: &NativeCombo, ignored: ModMask) -> Result<(), BackendError> {
        let mut grabbed = Vec::new();

        for mask in lock_variants(combo.mask, ignored) {
            match self.grab_one(mask, combo.keycode) {
                Ok(()) => grabbed.push(mask),
                Err(err) => {
                    // Fail closed: release the variants that did succeed.
                    for mask in grabbed {
                        self.ungrab_one(mask, combo.keycode);
                    }
                    if let Err(flush_err) = self.conn.flush() {
                        warn!(%flush_err, "Failed to flush rollback ungrabs");
                    }
                    return Err(err);
                }
            }
        }

        Ok(())
    }

    fn ungrab(&self, combo: &NativeCombo, ignored: ModMask) {
        for mask in lock_variants(combo.mask, ignored) {
            self.ungrab_one(mask, combo.keycode);
        }
        if let Err(err) = self.conn.flush() {
            debug!(%err, "Flush after ungrab failed");
        }
    }

    fn wake(&self) {
        let event = ClientMessageEvent::new(32, self.wake_window, AtomEnum::NONE, [0u32; 5]);
        let sent = self
            .conn
            .send_event(false, self.wake_window, EventMask::NO_EVENT, event)
            .map(|_| ())
            .and_then(|()| self.conn.flush());

        if let Err(err) = sent {
            warn!(%err, "Failed to wake dispatch thread");
        }
    }

    fn name(&self) -> &'static str {
        "x11"
    }
}

impl EventSource for X11Events {
    fn next_event(&mut self) -> Result<Option<NativeEvent>, BackendError> {
        loop {
            match self.conn.wait_for_event()? {
                Event::KeyPress(ev) => {
                    return Ok(Some(NativeEvent::KeyPress(KeyPress {
                        keycode: ev.detail,
                        state: ModMask::from_state(u16::from(ev.state)),
                        time: ev.time,
                    })));
                }
                Event::ClientMessage(ev) if ev.window == self.wake_window => {
                    return Ok(Some(NativeEvent::Wakeup));
                }
                Event::Error(err) => {
                    debug!(?err, "Ignoring asynchronous X error");
                }
                _ => {}
            }
        }
    }
}
