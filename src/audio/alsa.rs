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
use std::{fmt, time::Duration};

use alsa::pcm::{Access, Format, HwParams, PCM};
use alsa::{Direction, ValueOr};
use tracing::info;

use super::{SinkError, OUTPUT_CHANNELS};

/// A blocking ALSA playback device. Many cards can't do mono, so the stream is always
/// stereo and mono clips are spread over both channels by the mixer.
pub struct Sink {
    name: String,
    pcm: PCM,
    sample_rate: u32,
}

impl Sink {
    /// Opens and configures the named PCM for S16LE interleaved stereo output.
    pub fn open(name: &str, sample_rate: u32, latency: Duration) -> Result<Sink, SinkError> {
        let pcm = PCM::new(name, Direction::Playback, false)?;
        let sample_rate = {
            let hw_params = HwParams::any(&pcm)?;
            hw_params.set_channels(OUTPUT_CHANNELS as u32)?;
            hw_params.set_rate_resample(true)?;
            hw_params.set_rate(sample_rate, ValueOr::Nearest)?;
            hw_params.set_format(Format::S16LE)?;
            hw_params.set_access(Access::RWInterleaved)?;
            let buffer_time = u32::try_from(latency.as_micros()).unwrap_or(u32::MAX);
            hw_params.set_buffer_time_near(buffer_time, ValueOr::Nearest)?;
            pcm.hw_params(&hw_params)?;
            hw_params.get_rate()?
        };

        info!(
            device = name,
            sample_rate,
            latency = ?latency,
            "Opened ALSA playback device."
        );

        Ok(Sink {
            name: name.to_string(),
            pcm,
            sample_rate,
        })
    }

    fn classify(err: alsa::Error) -> SinkError {
        if err.errno() == libc::EPIPE {
            SinkError::Underrun
        } else {
            SinkError::Alsa(err)
        }
    }
}

impl super::Sink for Sink {
    fn write(&mut self, buffer: &[i16]) -> Result<usize, SinkError> {
        let io = self.pcm.io_i16()?;
        io.writei(buffer).map_err(Self::classify)
    }

    fn prepare(&mut self) -> Result<(), SinkError> {
        Ok(self.pcm.prepare()?)
    }
}

impl fmt::Display for Sink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (Rate={}) (ALSA)", self.name, self.sample_rate)
    }
}
