//! MIT-SCREEN-SAVER idle source

use tracing::debug;
use x11rb::connection::{Connection, RequestConnection};
use x11rb::protocol::screensaver::{self, ConnectionExt as _};
use x11rb::protocol::xproto::Window;
use x11rb::rust_connection::RustConnection;

use crate::backend::BackendError;
use crate::idle::IdleSource;

/// Idle time as reported by the X screen saver extension
pub struct ScreenSaverIdle {
    conn: RustConnection,
    root: Window,
    extension: bool,
}

impl ScreenSaverIdle {
    /// Connects and checks for the extension once.
    pub fn connect(display: Option<&str>) -> Result<Self, BackendError> {
        let (conn, screen_num) = x11rb::connect(display)?;
        let root = conn
            .setup()
            .roots
            .get(screen_num)
            .map(|screen| screen.root)
            .ok_or(BackendError::NoScreen(screen_num))?;

        let extension = conn
            .extension_information(screensaver::X11_EXTENSION_NAME)?
            .is_some();
        if !extension {
            debug!("MIT-SCREEN-SAVER extension not present");
        }

        Ok(Self {
            conn,
            root,
            extension,
        })
    }

    pub fn has_extension(&self) -> bool {
        self.extension
    }
}

impl IdleSource for ScreenSaverIdle {
    fn idle_millis(&self) -> Option<u64> {
        if !self.extension {
            return None;
        }

        match self
            .conn
            .screensaver_query_info(self.root)
            .map_err(BackendError::from)
            .and_then(|cookie| cookie.reply().map_err(BackendError::from))
        {
            Ok(info) => Some(u64::from(info.ms_since_user_input)),
            Err(err) => {
                debug!(error = %err, "Idle query failed");
                None
            }
        }
    }
}
