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

//! Playback state for a single slot.
//!
//! A voice streams its clip straight from disk: the file is opened when the slot starts
//! and closed when it stops or runs out, so nothing is held open for idle slots.

use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};

use tracing::{debug, warn};

use crate::banks::{Clip, HEADER_SIZE};

/// An open clip and how much of its payload is left to read.
struct Cursor {
    file: File,
    remaining: u64,
}

/// The result of toggling a voice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Toggled {
    Started,
    Stopped,
    /// Nothing to play: the slot is empty, the clip has no payload, or it couldn't be opened.
    Ignored,
}

/// The playback state of one (bank, slot) pair. A slot has at most one voice, so a
/// slot can never play twice at once.
pub struct Voice {
    bank: usize,
    slot: usize,
    clip: Option<Clip>,
    cursor: Option<Cursor>,
}

impl Voice {
    pub fn new(bank: usize, slot: usize, clip: Option<Clip>) -> Voice {
        Voice {
            bank,
            slot,
            clip,
            cursor: None,
        }
    }

    pub fn is_playing(&self) -> bool {
        self.cursor.is_some()
    }

    /// Channel count of the clip, or 0 for an empty slot.
    pub fn channels(&self) -> u16 {
        self.clip
            .as_ref()
            .map(|clip| clip.header().channels())
            .unwrap_or(0)
    }

    /// Stops a playing voice, or starts an idle one from the top of its clip.
    pub fn toggle(&mut self) -> Toggled {
        if self.cursor.take().is_some() {
            debug!(bank = self.bank, slot = self.slot, "Stopped.");
            return Toggled::Stopped;
        }

        match self.start() {
            Ok(true) => {
                debug!(bank = self.bank, slot = self.slot, "Started.");
                Toggled::Started
            }
            Ok(false) => Toggled::Ignored,
            Err(e) => {
                warn!(
                    bank = self.bank,
                    slot = self.slot,
                    err = %e,
                    "Unable to open clip"
                );
                Toggled::Ignored
            }
        }
    }

    fn start(&mut self) -> Result<bool, io::Error> {
        let Some(clip) = &self.clip else {
            return Ok(false);
        };
        let payload = u64::from(clip.header().payload_size());
        if payload == 0 {
            return Ok(false);
        }

        let mut file = File::open(clip.path())?;
        file.seek(SeekFrom::Start(HEADER_SIZE as u64))?;
        self.cursor = Some(Cursor {
            file,
            remaining: payload,
        });
        Ok(true)
    }

    /// Reads up to `frames` frames of raw clip data into the front of `buffer`, returning
    /// the number of bytes read. Never reads past the clip's payload. The voice stops
    /// itself when it gets less than it asked for or reaches the end of the payload.
    pub fn read(&mut self, frames: usize, buffer: &mut [u8]) -> usize {
        let frame_size = self
            .clip
            .as_ref()
            .map(|clip| clip.header().frame_size())
            .unwrap_or(0);
        let Some(cursor) = self.cursor.as_mut() else {
            return 0;
        };

        let requested = (frames * frame_size).min(buffer.len());
        let wanted = (requested as u64).min(cursor.remaining) as usize;
        let read = match read_full(&mut cursor.file, &mut buffer[..wanted]) {
            Ok(read) => read,
            Err((read, e)) => {
                warn!(
                    bank = self.bank,
                    slot = self.slot,
                    err = %e,
                    "Error reading clip, stopping"
                );
                self.cursor = None;
                return read;
            }
        };

        cursor.remaining -= read as u64;
        if read < requested || cursor.remaining == 0 {
            debug!(bank = self.bank, slot = self.slot, "Clip finished.");
            self.cursor = None;
        }
        read
    }
}

/// Fills the buffer unless the reader runs dry first. On error, returns the bytes read
/// before it happened along with the error.
fn read_full<R: Read>(reader: &mut R, buffer: &mut [u8]) -> Result<usize, (usize, io::Error)> {
    let mut filled = 0;
    while filled < buffer.len() {
        match reader.read(&mut buffer[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err((filled, e)),
        }
    }
    Ok(filled)
}
