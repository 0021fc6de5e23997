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

//! The foot switch, seen by the kernel as a joystick. Each press and release arrives as
//! an 8 byte `js_event` on the device node.

use std::{
    collections::HashMap,
    fs::{File, OpenOptions},
    io::{self, Read},
    os::unix::{fs::OpenOptionsExt, io::AsRawFd},
    path::PathBuf,
    time::Duration,
};

use tracing::{debug, info, warn};

use super::{Control, Event, InputError};
use crate::config::{self, ConfigError};
use crate::playsync::CancelHandle;

const JS_EVENT_SIZE: usize = 8;

/// Event type for a button. Synthetic startup events have 0x80 set and are skipped.
const JS_EVENT_BUTTON: u8 = 0x01;

/// How long a single poll waits before checking for cancellation again.
const POLL_TIMEOUT_MS: libc::c_int = 100;

/// A raw joystick event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct JsEvent {
    value: i16,
    kind: u8,
    number: u8,
}

impl JsEvent {
    fn parse(raw: &[u8; JS_EVENT_SIZE]) -> JsEvent {
        // The first four bytes are a timestamp we don't need.
        JsEvent {
            value: i16::from_le_bytes([raw[4], raw[5]]),
            kind: raw[6],
            number: raw[7],
        }
    }
}

/// Doubles the delay between attempts up to a cap.
struct Backoff {
    initial: Duration,
    max: Duration,
    next: Duration,
}

impl Backoff {
    fn new(initial: Duration, max: Duration) -> Backoff {
        Backoff {
            initial,
            max: max.max(initial),
            next: initial,
        }
    }

    fn next_delay(&mut self) -> Duration {
        let delay = self.next;
        self.next = (self.next * 2).min(self.max);
        delay
    }

    fn reset(&mut self) {
        self.next = self.initial;
    }
}

/// Reads button presses from a joystick device, reopening it whenever it goes away.
pub struct Switch {
    device: PathBuf,
    controls: HashMap<u8, Control>,
    backoff: Backoff,
    file: Option<File>,
}

impl Switch {
    /// Creates a switch source for the given number of slots. Buttons assigned to slots
    /// beyond that are dropped.
    pub fn new(config: &config::Switch, slots: usize) -> Result<Switch, ConfigError> {
        let mut controls: HashMap<u8, Control> = config
            .slot_buttons()
            .into_iter()
            .take(slots)
            .enumerate()
            .map(|(slot, button)| (button, Control::Slot(slot)))
            .collect();
        controls.insert(config.bank_button(), Control::Bank);

        Ok(Switch {
            device: config.device(),
            controls,
            backoff: Backoff::new(config.retry_interval()?, config.max_retry_interval()?),
            file: None,
        })
    }

    /// Opens the device if it isn't open, waiting between attempts. Returns false if the
    /// session was cancelled while waiting.
    fn ensure_open(&mut self, cancel: &CancelHandle) -> bool {
        while self.file.is_none() {
            match OpenOptions::new()
                .read(true)
                .custom_flags(libc::O_NONBLOCK)
                .open(&self.device)
            {
                Ok(file) => {
                    info!(device = %self.device.display(), "Switch connected.");
                    self.backoff.reset();
                    self.file = Some(file);
                }
                Err(e) => {
                    let delay = self.backoff.next_delay();
                    debug!(
                        device = %self.device.display(),
                        err = %e,
                        retry_in = ?delay,
                        "Switch not available"
                    );
                    if cancel.wait_timeout(delay) {
                        return false;
                    }
                }
            }
        }
        true
    }

    fn to_event(&self, js: JsEvent) -> Option<Event> {
        if js.kind != JS_EVENT_BUTTON {
            return None;
        }
        Some(Event {
            control: self.controls.get(&js.number).copied(),
            active: js.value == 1,
        })
    }
}

/// Waits for the file to become readable. Returns false on timeout.
fn poll_readable(file: &File, timeout_ms: libc::c_int) -> io::Result<bool> {
    let mut fds = libc::pollfd {
        fd: file.as_raw_fd(),
        events: libc::POLLIN,
        revents: 0,
    };
    // SAFETY: fds is a single valid pollfd that outlives the call.
    let ready = unsafe { libc::poll(&mut fds, 1, timeout_ms) };
    if ready < 0 {
        let err = io::Error::last_os_error();
        if err.kind() == io::ErrorKind::Interrupted {
            return Ok(false);
        }
        return Err(err);
    }
    Ok(ready > 0)
}

impl super::Source for Switch {
    fn name(&self) -> &'static str {
        "switch"
    }

    fn next_event(&mut self, cancel: &CancelHandle) -> Result<Option<Event>, InputError> {
        loop {
            if cancel.is_cancelled() || !self.ensure_open(cancel) {
                return Ok(None);
            }
            let Some(file) = self.file.as_mut() else {
                continue;
            };

            let read = match poll_readable(file, POLL_TIMEOUT_MS) {
                Ok(false) => continue,
                Ok(true) => {
                    let mut raw = [0u8; JS_EVENT_SIZE];
                    file.read_exact(&mut raw).map(|_| JsEvent::parse(&raw))
                }
                Err(e) => Err(e),
            };

            match read {
                Ok(js) => {
                    if let Some(event) = self.to_event(js) {
                        return Ok(Some(event));
                    }
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => {}
                Err(e) => {
                    warn!(
                        device = %self.device.display(),
                        err = %e,
                        "Switch disconnected, waiting for it to come back"
                    );
                    self.file = None;
                    if cancel.wait_timeout(self.backoff.next_delay()) {
                        return Ok(None);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod test {
    use std::{error::Error, fs, path::Path, thread, time::Duration};

    use tempfile::tempdir;

    use super::{Backoff, JsEvent, Switch, JS_EVENT_BUTTON};
    use crate::config::{self, Player};
    use crate::input::{Control, Event, Source};
    use crate::playsync::CancelHandle;

    fn js_event(value: i16, kind: u8, number: u8) -> Vec<u8> {
        let mut raw = 1234u32.to_le_bytes().to_vec();
        raw.extend_from_slice(&value.to_le_bytes());
        raw.push(kind);
        raw.push(number);
        raw
    }

    fn switch_config(device: &str, retry: &str) -> Result<config::Switch, Box<dyn Error>> {
        let player = Player::from_yaml(&format!(
            "
            switch:
              device: {}
              slot_buttons: [9, 7, 4]
              bank_button: 6
              retry_interval: {}
              max_retry_interval: 40ms
            ",
            device, retry
        ))?;
        Ok(player.switch().clone())
    }

    #[test]
    fn test_parse() {
        let raw = js_event(1, JS_EVENT_BUTTON, 7);
        let raw: [u8; 8] = raw.try_into().unwrap_or_default();
        assert_eq!(
            JsEvent {
                value: 1,
                kind: JS_EVENT_BUTTON,
                number: 7
            },
            JsEvent::parse(&raw)
        );
    }

    #[test]
    fn test_backoff_doubles_to_cap() {
        let mut backoff = Backoff::new(Duration::from_secs(1), Duration::from_secs(5));
        assert_eq!(Duration::from_secs(1), backoff.next_delay());
        assert_eq!(Duration::from_secs(2), backoff.next_delay());
        assert_eq!(Duration::from_secs(4), backoff.next_delay());
        assert_eq!(Duration::from_secs(5), backoff.next_delay());
        assert_eq!(Duration::from_secs(5), backoff.next_delay());
        backoff.reset();
        assert_eq!(Duration::from_secs(1), backoff.next_delay());
    }

    #[test]
    fn test_button_mapping() -> Result<(), Box<dyn Error>> {
        // Only two slots, so button 4 isn't mapped.
        let switch = Switch::new(&switch_config("/nonexistent", "5s")?, 2)?;

        let event = |value, kind, number| switch.to_event(JsEvent { value, kind, number });
        assert_eq!(
            Some(Event::pressed(Control::Slot(0))),
            event(1, JS_EVENT_BUTTON, 9)
        );
        assert_eq!(
            Some(Event::released(Control::Slot(1))),
            event(0, JS_EVENT_BUTTON, 7)
        );
        assert_eq!(
            Some(Event::pressed(Control::Bank)),
            event(1, JS_EVENT_BUTTON, 6)
        );
        assert_eq!(
            Some(Event {
                control: None,
                active: true
            }),
            event(1, JS_EVENT_BUTTON, 4)
        );
        // Axis motion and the synthetic startup state are ignored.
        assert_eq!(None, event(1, 0x02, 9));
        assert_eq!(None, event(1, 0x81, 9));
        Ok(())
    }

    #[test]
    fn test_reads_events_from_device() -> Result<(), Box<dyn Error>> {
        let dir = tempdir()?;
        let device = dir.path().join("js0");
        let mut raw = js_event(1, 0x81, 6);
        raw.extend(js_event(300, 0x02, 0));
        raw.extend(js_event(1, JS_EVENT_BUTTON, 7));
        fs::write(&device, raw)?;

        let mut switch = Switch::new(&switch_config(&device.to_string_lossy(), "5s")?, 3)?;
        let cancel = CancelHandle::new();
        assert_eq!(
            Some(Event::pressed(Control::Slot(1))),
            switch.next_event(&cancel)?
        );
        Ok(())
    }

    #[test]
    fn test_missing_device_waits_for_cancel() -> Result<(), Box<dyn Error>> {
        let dir = tempdir()?;
        let device = dir.path().join("js0");
        let mut switch = Switch::new(&switch_config(&device.to_string_lossy(), "5s")?, 3)?;

        let cancel = CancelHandle::new();
        let canceller = cancel.clone();
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(50));
            canceller.cancel();
        });

        assert_eq!(None, switch.next_event(&cancel)?);
        handle.join().map_err(|_| "cancel thread panicked")?;
        Ok(())
    }

    /// Writes the device node in one step, the way it appears when plugged in.
    fn plug_in(device: &Path, raw: &[u8]) -> Result<(), Box<dyn Error>> {
        let staged = device.with_extension("staged");
        fs::write(&staged, raw)?;
        fs::rename(&staged, device)?;
        Ok(())
    }

    #[test]
    fn test_device_appearing_later_is_opened() -> Result<(), Box<dyn Error>> {
        let dir = tempdir()?;
        let device = dir.path().join("js0");
        let mut switch = Switch::new(&switch_config(&device.to_string_lossy(), "10ms")?, 3)?;

        let plugged = {
            let device = device.clone();
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(50));
                plug_in(&device, &js_event(1, JS_EVENT_BUTTON, 6)).is_ok()
            })
        };

        let cancel = CancelHandle::new();
        assert_eq!(
            Some(Event::pressed(Control::Bank)),
            switch.next_event(&cancel)?
        );
        assert!(plugged.join().map_err(|_| "plug in thread panicked")?);
        // Connecting starts the backoff over.
        assert_eq!(Duration::from_millis(10), switch.backoff.next_delay());
        Ok(())
    }

    #[test]
    fn test_read_failure_reopens_device() -> Result<(), Box<dyn Error>> {
        let dir = tempdir()?;
        let device = dir.path().join("js0");
        // Opens fine, but every read comes up short until the real events land.
        fs::write(&device, [0u8; 3])?;
        let mut switch = Switch::new(&switch_config(&device.to_string_lossy(), "10ms")?, 3)?;

        let plugged = {
            let device = device.clone();
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(50));
                plug_in(&device, &js_event(0, JS_EVENT_BUTTON, 9)).is_ok()
            })
        };

        let cancel = CancelHandle::new();
        assert_eq!(
            Some(Event::released(Control::Slot(0))),
            switch.next_event(&cancel)?
        );
        assert!(plugged.join().map_err(|_| "plug in thread panicked")?);
        Ok(())
    }
}
