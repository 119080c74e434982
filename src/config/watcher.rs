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

//! File system watcher for live bindings-file reload
//!
//! Uses OS-level file watching (Linux inotify) via the notify crate.
//! The parent directory is watched rather than the file itself, so
//! editors that save by writing a new file and renaming it over the old
//! one are still seen.

use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{channel, Receiver, RecvTimeoutError};
use std::time::Duration;
use tracing::debug;

use crate::config::ConfigError;

/// Watches one bindings file for modifications
pub struct FileWatcher {
    _watcher: RecommendedWatcher,
    rx: Receiver<notify::Result<Event>>,
    file_name: Option<std::ffi::OsString>,
}

impl FileWatcher {
    pub fn new(path: &Path) -> Result<Self, ConfigError> {
        let (tx, rx) = channel();

        let mut watcher = RecommendedWatcher::new(
            move |res| {
                let _ = tx.send(res);
            },
            Config::default(),
        )?;

        let directory = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        watcher.watch(&directory, RecursiveMode::NonRecursive)?;

        Ok(FileWatcher {
            _watcher: watcher,
            rx,
            file_name: path.file_name().map(|name| name.to_os_string()),
        })
    }

    /// Checks for file modification events (non-blocking)
    pub fn check_for_changes(&self) -> bool {
        let mut changed = false;
        while let Ok(event) = self.rx.try_recv() {
            changed |= self.is_relevant(event);
        }
        changed
    }

    /// Blocks up to `timeout` for a modification, then drains the burst
    /// of events a single save usually produces.
    pub fn wait_for_change(&self, timeout: Duration) -> bool {
        match self.rx.recv_timeout(timeout) {
            Ok(event) => {
                let changed = self.is_relevant(event);
                self.check_for_changes() || changed
            }
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => false,
        }
    }

    fn is_relevant(&self, event: notify::Result<Event>) -> bool {
        let event = match event {
            Ok(event) => event,
            Err(err) => {
                debug!(error = %err, "Watch error");
                return false;
            }
        };

        let touches_file = event
            .paths
            .iter()
            .any(|p| p.file_name() == self.file_name.as_deref());

        touches_file && matches!(event.kind, EventKind::Modify(_) | EventKind::Create(_))
    }
}
