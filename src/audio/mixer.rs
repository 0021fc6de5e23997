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
// Fixed-level mixing of raw clip data into the output buffer.
use crate::banks::BYTES_PER_SAMPLE;

use super::OUTPUT_CHANNELS;

/// Adds a source sample to a mixed sample. The source is halved, so every voice sits
/// at a fixed level below full scale, and the sum clamps instead of wrapping.
#[inline]
pub fn mix_sample(mixed: i16, source: i16) -> i16 {
    mixed.saturating_add(source / 2)
}

/// The interleaved stereo buffer for one render quantum. It is allocated once and
/// reused for every quantum.
pub struct MixBuffer {
    samples: Vec<i16>,
}

impl MixBuffer {
    /// Creates a silent buffer holding the given number of stereo frames.
    pub fn new(frames: usize) -> MixBuffer {
        MixBuffer {
            samples: vec![0; frames * OUTPUT_CHANNELS],
        }
    }

    /// Number of stereo frames in the buffer.
    pub fn frames(&self) -> usize {
        self.samples.len() / OUTPUT_CHANNELS
    }

    /// Silences the buffer.
    pub fn clear(&mut self) {
        self.samples.fill(0);
    }

    /// Mixes raw little-endian 16-bit clip data into the buffer from the first frame on.
    /// Mono data lands on both channels. A trailing partial frame is ignored, as is
    /// anything beyond the end of the buffer.
    pub fn mix(&mut self, data: &[u8], channels: u16) {
        let decoded = data
            .chunks_exact(BYTES_PER_SAMPLE)
            .map(|raw| i16::from_le_bytes([raw[0], raw[1]]));

        match channels {
            1 => {
                for (frame, sample) in self.samples.chunks_exact_mut(OUTPUT_CHANNELS).zip(decoded)
                {
                    for mixed in frame.iter_mut() {
                        *mixed = mix_sample(*mixed, sample);
                    }
                }
            }
            _ => {
                let whole = data.len() / (BYTES_PER_SAMPLE * OUTPUT_CHANNELS) * OUTPUT_CHANNELS;
                for (mixed, sample) in self.samples.iter_mut().zip(decoded).take(whole) {
                    *mixed = mix_sample(*mixed, sample);
                }
            }
        }
    }

    pub fn as_slice(&self) -> &[i16] {
        &self.samples
    }
}
