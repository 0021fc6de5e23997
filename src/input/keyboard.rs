// Copyright (C) 2026 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//
use std::{
    collections::HashMap,
    io::{self, Write},
    time::Duration,
};

use crossterm::{
    event::{
        self, Event as TerminalEvent, KeyCode, KeyEvent, KeyEventKind, KeyboardEnhancementFlags,
        PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
    },
    execute, terminal,
};
use tracing::{debug, info, warn};

use super::{Control, Event, InputError};
use crate::config;
use crate::playsync::CancelHandle;

/// How long a single poll waits before checking for cancellation again.
const POLL_TIMEOUT: Duration = Duration::from_millis(100);

/// Keeps the terminal in raw mode until dropped, so single key presses arrive without
/// waiting for enter and aren't echoed. Key release reporting is turned on where the
/// terminal supports it.
pub struct RawMode {
    reports_releases: bool,
}

impl RawMode {
    pub fn enable() -> io::Result<RawMode> {
        terminal::enable_raw_mode()?;

        let reports_releases = match terminal::supports_keyboard_enhancement() {
            Ok(true) => match execute!(
                io::stdout(),
                PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
            ) {
                Ok(()) => true,
                Err(e) => {
                    warn!(err = %e, "Unable to turn on key release reporting");
                    false
                }
            },
            Ok(false) => false,
            Err(e) => {
                debug!(err = %e, "Unable to query keyboard enhancements");
                false
            }
        };
        if !reports_releases {
            info!("Terminal doesn't report key releases, every key press is released immediately.");
        }

        Ok(RawMode { reports_releases })
    }

    /// Whether the terminal reports key releases.
    pub fn reports_releases(&self) -> bool {
        self.reports_releases
    }
}

impl Drop for RawMode {
    fn drop(&mut self) {
        if self.reports_releases {
            if let Err(e) = execute!(io::stdout(), PopKeyboardEnhancementFlags) {
                warn!(err = %e, "Unable to turn off key release reporting");
            }
        }
        if let Err(e) = terminal::disable_raw_mode() {
            warn!(err = %e, "Unable to restore terminal");
        }
    }
}

/// Log output for stderr. While the terminal is in raw mode a bare newline doesn't
/// return the cursor, so line endings are written as "\r\n".
pub struct LogWriter {
    stderr: io::Stderr,
}

impl LogWriter {
    pub fn stderr() -> LogWriter {
        LogWriter {
            stderr: io::stderr(),
        }
    }
}

impl Write for LogWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if !terminal::is_raw_mode_enabled().unwrap_or(false) {
            return self.stderr.write(buf);
        }
        write_crlf(&mut self.stderr.lock(), buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.stderr.flush()
    }
}

fn write_crlf<W: Write>(out: &mut W, buf: &[u8]) -> io::Result<()> {
    for (i, line) in buf.split(|&b| b == b'\n').enumerate() {
        if i > 0 {
            out.write_all(b"\r\n")?;
        }
        out.write_all(line)?;
    }
    Ok(())
}

/// Reads key presses and releases from the terminal. Terminals that can't report
/// releases get a release right after every press, so two keys never count as held
/// at once.
pub struct Keyboard {
    controls: HashMap<char, Control>,
    reports_releases: bool,
    pending_release: Option<Event>,
}

impl Keyboard {
    /// Creates a keyboard source for the given number of slots. Keys assigned to slots
    /// beyond that are dropped.
    pub fn new(config: &config::Keyboard, slots: usize, reports_releases: bool) -> Keyboard {
        let mut controls: HashMap<char, Control> = config
            .slot_keys()
            .into_iter()
            .take(slots)
            .enumerate()
            .map(|(slot, key)| (key, Control::Slot(slot)))
            .collect();
        controls.insert(config.bank_key(), Control::Bank);

        Keyboard {
            controls,
            reports_releases,
            pending_release: None,
        }
    }

    fn to_event(&self, code: KeyCode, active: bool) -> Event {
        let control = match code {
            KeyCode::Char(c) => self.controls.get(&c).copied(),
            _ => None,
        };
        Event { control, active }
    }

    /// Turns a key event into an input event. Auto-repeats are dropped.
    fn translate(&mut self, key: KeyEvent) -> Option<Event> {
        let active = match key.kind {
            KeyEventKind::Press => true,
            KeyEventKind::Release => false,
            KeyEventKind::Repeat => return None,
        };
        let event = self.to_event(key.code, active);
        if active && !self.reports_releases {
            self.pending_release = Some(Event {
                active: false,
                ..event
            });
        }
        Some(event)
    }
}

impl super::Source for Keyboard {
    fn name(&self) -> &'static str {
        "keyboard"
    }

    fn next_event(&mut self, cancel: &CancelHandle) -> Result<Option<Event>, InputError> {
        if let Some(release) = self.pending_release.take() {
            return Ok(Some(release));
        }
        loop {
            if cancel.is_cancelled() {
                return Ok(None);
            }
            if !event::poll(POLL_TIMEOUT)? {
                continue;
            }

            if let TerminalEvent::Key(key) = event::read()? {
                debug!(key = ?key.code, kind = ?key.kind, "Key event.");
                if let Some(event) = self.translate(key) {
                    return Ok(Some(event));
                }
            }
        }
    }
}
