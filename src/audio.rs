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
use std::fmt;

use crate::config;

pub mod alsa;
pub mod cpal;
pub mod mixer;
pub mod mock;
pub mod thread_priority;

/// Output is always interleaved stereo.
pub const OUTPUT_CHANNELS: usize = 2;

#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("buffer underrun")]
    Underrun,

    #[error("ALSA error: {0}")]
    Alsa(#[from] ::alsa::Error),

    #[error("audio device error: {0}")]
    Device(String),
}

/// An audio output that accepts interleaved stereo 16-bit frames with blocking writes.
pub trait Sink: fmt::Display + Send {
    /// Writes the buffer and returns the number of frames the device accepted.
    fn write(&mut self, buffer: &[i16]) -> Result<usize, SinkError>;

    /// Gets the device ready to accept writes again after an underrun.
    fn prepare(&mut self) -> Result<(), SinkError>;
}

/// Opens the output described by the configuration. Device names starting with "mock"
/// get a device that consumes audio in real time without playing it.
pub fn get_sink(config: &config::Audio) -> Result<Box<dyn Sink>, SinkError> {
    let device = config.device();
    if device.starts_with("mock") {
        return Ok(Box::new(mock::Sink::paced(device, config.quantum())));
    }

    let latency = config
        .latency()
        .map_err(|e| SinkError::Device(e.to_string()))?;
    Ok(Box::new(alsa::Sink::open(
        device,
        config.sample_rate(),
        latency,
    )?))
}

#[cfg(test)]
mod test {
    use crate::config;

    #[test]
    fn test_get_mock_sink() {
        let sink = super::get_sink(&config::Audio::new("mock-output"));
        assert!(sink.is_ok());
        assert_eq!("mock-output (Mock)", sink.unwrap().to_string());
    }
}
