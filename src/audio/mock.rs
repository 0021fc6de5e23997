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
use std::{collections::VecDeque, fmt, sync::Arc, time::Duration};

use parking_lot::Mutex;

use super::{SinkError, OUTPUT_CHANNELS};

/// A failure to inject into an upcoming write.
#[cfg_attr(not(test), allow(dead_code))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /// The write reports an underrun and accepts nothing.
    Underrun,
    /// The write fails with a device error.
    Device,
    /// The write only accepts this many frames.
    Short(usize),
}

#[derive(Default)]
struct State {
    writes: Vec<Vec<i16>>,
    attempts: usize,
    prepares: usize,
    faults: VecDeque<Fault>,
}

/// A mock device. Doesn't actually play anything, but keeps every buffer it accepts so
/// tests can look at what would have been played. Clones share the same recording.
#[derive(Clone)]
pub struct Sink {
    name: String,
    pace: Option<Duration>,
    record: bool,
    state: Arc<Mutex<State>>,
}

impl Sink {
    /// Gets a mock device that returns from writes immediately and records them.
    pub fn get(name: &str) -> Sink {
        Sink {
            name: name.to_string(),
            pace: None,
            record: true,
            state: Arc::new(Mutex::new(State::default())),
        }
    }

    /// Gets a mock device that blocks for one quantum on every write, like a real device
    /// whose buffer is full. Nothing is recorded, so it can run indefinitely.
    pub fn paced(name: &str, quantum: Duration) -> Sink {
        Sink {
            pace: Some(quantum),
            record: false,
            ..Sink::get(name)
        }
    }

    /// Queues a failure for an upcoming write. Faults apply in the order they were queued.
    #[cfg(test)]
    pub fn inject(&self, fault: Fault) {
        self.state.lock().faults.push_back(fault);
    }

    /// Buffers accepted so far, one per successful write.
    #[cfg(test)]
    pub fn writes(&self) -> Vec<Vec<i16>> {
        self.state.lock().writes.clone()
    }

    /// Number of write calls, successful or not.
    #[cfg(test)]
    pub fn attempts(&self) -> usize {
        self.state.lock().attempts
    }

    /// Number of times the device was prepared.
    #[cfg(test)]
    pub fn prepares(&self) -> usize {
        self.state.lock().prepares
    }
}

impl super::Sink for Sink {
    fn write(&mut self, buffer: &[i16]) -> Result<usize, SinkError> {
        if let Some(pace) = self.pace {
            spin_sleep::sleep(pace);
        }

        let frames = buffer.len() / OUTPUT_CHANNELS;
        let mut state = self.state.lock();
        state.attempts += 1;
        match state.faults.pop_front() {
            Some(Fault::Underrun) => Err(SinkError::Underrun),
            Some(Fault::Device) => Err(SinkError::Device(format!("{} failed", self.name))),
            Some(Fault::Short(accepted)) => {
                let accepted = accepted.min(frames);
                if self.record {
                    state
                        .writes
                        .push(buffer[..accepted * OUTPUT_CHANNELS].to_vec());
                }
                Ok(accepted)
            }
            None => {
                if self.record {
                    state.writes.push(buffer.to_vec());
                }
                Ok(frames)
            }
        }
    }

    fn prepare(&mut self) -> Result<(), SinkError> {
        self.state.lock().prepares += 1;
        Ok(())
    }
}

impl fmt::Display for Sink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (Mock)", self.name)
    }
}
