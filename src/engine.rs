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

//! The render loop. Each quantum it applies pending toggles, mixes every playing voice
//! into one stereo buffer and hands the buffer to the output with a blocking write.
//! The device's blocking is the only clock.

use std::sync::Arc;

use tracing::{debug, error, info, span, warn, Level};

use crate::audio::mixer::MixBuffer;
use crate::audio::{Sink, SinkError, OUTPUT_CHANNELS};
use crate::banks::{BankTable, BYTES_PER_SAMPLE};
use crate::playsync::CancelHandle;
use crate::trigger::TriggerState;

mod voice;

use voice::{Toggled, Voice};

/// Owns every voice and the mix buffer. Only the render thread touches it.
pub struct Engine {
    voices: Vec<Vec<Voice>>,
    triggers: Arc<TriggerState>,
    mix: MixBuffer,
    read_buffer: Vec<u8>,
}

impl Engine {
    /// Creates an engine with one idle voice per (bank, slot) pair, rendering
    /// `period_frames` stereo frames per quantum.
    pub fn new(table: BankTable, triggers: Arc<TriggerState>, period_frames: usize) -> Engine {
        let voices = table
            .into_banks()
            .into_iter()
            .map(|bank| {
                let index = bank.index();
                bank.into_slots()
                    .into_iter()
                    .enumerate()
                    .map(|(slot, clip)| Voice::new(index, slot, clip))
                    .collect()
            })
            .collect();

        Engine {
            voices,
            triggers,
            mix: MixBuffer::new(period_frames),
            // Large enough for a full quantum of the widest clip.
            read_buffer: vec![0; period_frames * OUTPUT_CHANNELS * BYTES_PER_SAMPLE],
        }
    }

    /// Picks up pending toggles and applies them to the current bank. A toggle for an
    /// empty slot is consumed and does nothing.
    fn apply_triggers(&mut self) {
        let bank = self.triggers.current_bank();
        for slot in 0..self.triggers.slots() {
            if !self.triggers.take(slot) {
                continue;
            }
            let Some(voice) = self.voices.get_mut(bank).and_then(|b| b.get_mut(slot)) else {
                continue;
            };
            match voice.toggle() {
                Toggled::Started => info!(bank, slot, "Slot started."),
                Toggled::Stopped => info!(bank, slot, "Slot stopped."),
                Toggled::Ignored => debug!(bank, slot, "Nothing to play."),
            }
        }
    }

    /// Renders one quantum: silence, plus every playing voice in every bank.
    fn render(&mut self) {
        let frames = self.mix.frames();
        self.mix.clear();
        for voice in self.voices.iter_mut().flatten() {
            if !voice.is_playing() {
                continue;
            }
            let channels = voice.channels();
            let read = voice.read(frames, &mut self.read_buffer);
            self.mix.mix(&self.read_buffer[..read], channels);
        }
    }

    /// Writes the rendered quantum. After an underrun the device is prepared and the same
    /// buffer is written once more. Any other failure loses this quantum and nothing else.
    fn write_output(&self, sink: &mut dyn Sink) {
        let buffer = self.mix.as_slice();
        let frames = self.mix.frames();
        let result = match sink.write(buffer) {
            Err(SinkError::Underrun) => {
                warn!(device = %sink, "Underrun, recovering");
                match sink.prepare() {
                    Ok(()) => sink.write(buffer),
                    Err(e) => Err(e),
                }
            }
            result => result,
        };

        match result {
            Ok(written) if written < frames => {
                warn!(device = %sink, written, frames, "Short write");
            }
            Ok(_) => {}
            Err(e) => error!(device = %sink, err = %e, "Error writing to audio device"),
        }
    }

    /// Runs a single quantum.
    pub fn tick(&mut self, sink: &mut dyn Sink) {
        self.apply_triggers();
        self.render();
        self.write_output(sink);
    }

    /// Renders until cancelled. Cancellation is noticed within one quantum.
    pub fn run(&mut self, sink: &mut dyn Sink, cancel: &CancelHandle) {
        let span = span!(Level::INFO, "render", device = %sink);
        let _enter = span.enter();

        info!(frames = self.mix.frames(), "Render loop started.");
        while !cancel.is_cancelled() {
            self.tick(sink);
        }
        info!("Render loop stopped.");
    }

    #[cfg(test)]
    pub fn is_playing(&self, bank: usize, slot: usize) -> bool {
        self.voices
            .get(bank)
            .and_then(|b| b.get(slot))
            .is_some_and(Voice::is_playing)
    }
}
