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
use std::time::Duration;

use duration_string::DurationString;
use serde::Deserialize;

use super::error::ConfigError;

const DEFAULT_DEVICE: &str = "plughw:1";
const DEFAULT_SAMPLE_RATE: u32 = 44100;
const DEFAULT_PERIOD_FRAMES: usize = 1024;
const DEFAULT_LATENCY: Duration = Duration::from_millis(80);

/// A YAML representation of the audio output configuration.
#[derive(Deserialize, Clone, Default, Debug)]
pub struct Audio {
    /// The ALSA device to write to. Names starting with "mock" select a device that
    /// discards audio at the real-time rate.
    device: Option<String>,

    /// The sample rate of the clips and of the output stream (default: 44100).
    sample_rate: Option<u32>,

    /// Frames rendered and written per render quantum (default: 1024).
    period_frames: Option<usize>,

    /// The total device buffer latency, e.g. "80ms".
    latency: Option<String>,
}

impl Audio {
    /// New will create a new Audio configuration for the given device.
    #[cfg(test)]
    pub fn new(device: &str) -> Audio {
        Audio {
            device: Some(device.to_string()),
            ..Default::default()
        }
    }

    /// Returns the device from the configuration.
    pub fn device(&self) -> &str {
        self.device.as_deref().unwrap_or(DEFAULT_DEVICE)
    }

    /// Returns the sample rate (default: 44100).
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate.unwrap_or(DEFAULT_SAMPLE_RATE)
    }

    /// Returns the number of frames in one render quantum.
    pub fn period_frames(&self) -> usize {
        self.period_frames.unwrap_or(DEFAULT_PERIOD_FRAMES)
    }

    /// Returns the wall-clock length of one render quantum.
    pub fn quantum(&self) -> Duration {
        Duration::from_nanos(
            self.period_frames() as u64 * 1_000_000_000 / u64::from(self.sample_rate()),
        )
    }

    /// Returns the device buffer latency.
    pub fn latency(&self) -> Result<Duration, ConfigError> {
        match &self.latency {
            Some(latency) => Ok(DurationString::from_string(latency.clone())
                .map_err(|source| ConfigError::Duration {
                    field: "audio.latency",
                    source,
                })?
                .into()),
            None => Ok(DEFAULT_LATENCY),
        }
    }

    pub(super) fn validate(&self) -> Result<(), ConfigError> {
        if self.sample_rate() == 0 {
            return Err(ConfigError::Invalid(
                "audio.sample_rate must be positive".to_string(),
            ));
        }
        if self.period_frames() == 0 {
            return Err(ConfigError::Invalid(
                "audio.period_frames must be positive".to_string(),
            ));
        }
        self.latency()?;
        Ok(())
    }
}
