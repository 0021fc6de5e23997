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

//! The fixed clip header.
//!
//! Clips are canonical 16-bit PCM WAV files: 22 bytes we don't interpret, the channel
//! count, 16 more uninterpreted bytes, then the payload size. The payload follows the
//! header directly.

use std::io::{self, Read};

/// Size of the header in bytes. The payload starts right after it.
pub const HEADER_SIZE: usize = 44;

/// Every sample is a signed 16-bit little-endian integer.
pub const BYTES_PER_SAMPLE: usize = 2;

const CHANNELS_OFFSET: usize = 22;
const PAYLOAD_SIZE_OFFSET: usize = 40;

#[derive(Debug, thiserror::Error)]
pub enum HeaderError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("unsupported channel count {0}, expected 1 or 2")]
    Channels(u16),
}

/// Parsed clip metadata. The channel count is always 1 or 2 and the payload size is
/// always a whole number of frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaveHeader {
    channels: u16,
    payload_size: u32,
}

impl WaveHeader {
    /// Creates a header, rounding the payload size down to a whole number of frames.
    pub fn new(channels: u16, payload_size: u32) -> Result<WaveHeader, HeaderError> {
        if !(1..=2).contains(&channels) {
            return Err(HeaderError::Channels(channels));
        }

        let frame_size = u32::from(channels) * BYTES_PER_SAMPLE as u32;
        Ok(WaveHeader {
            channels,
            payload_size: payload_size - payload_size % frame_size,
        })
    }

    /// Parses the raw header bytes.
    pub fn parse(bytes: &[u8; HEADER_SIZE]) -> Result<WaveHeader, HeaderError> {
        let channels = u16::from_le_bytes([bytes[CHANNELS_OFFSET], bytes[CHANNELS_OFFSET + 1]]);
        let payload_size = u32::from_le_bytes([
            bytes[PAYLOAD_SIZE_OFFSET],
            bytes[PAYLOAD_SIZE_OFFSET + 1],
            bytes[PAYLOAD_SIZE_OFFSET + 2],
            bytes[PAYLOAD_SIZE_OFFSET + 3],
        ]);
        WaveHeader::new(channels, payload_size)
    }

    /// Reads and parses the header from the start of a clip. A clip shorter than the
    /// header is reported as an IO error.
    pub fn read_from<R: Read>(reader: &mut R) -> Result<WaveHeader, HeaderError> {
        let mut bytes = [0u8; HEADER_SIZE];
        reader.read_exact(&mut bytes)?;
        WaveHeader::parse(&bytes)
    }

    /// Limits the payload to the bytes that are actually present after the header.
    pub fn clamp_to(self, available: u64) -> WaveHeader {
        if u64::from(self.payload_size) <= available {
            return self;
        }

        let frame_size = self.frame_size() as u64;
        let available = available - available % frame_size;
        WaveHeader {
            channels: self.channels,
            payload_size: available as u32,
        }
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    pub fn payload_size(&self) -> u32 {
        self.payload_size
    }

    /// Bytes in one frame (one sample for every channel).
    pub fn frame_size(&self) -> usize {
        usize::from(self.channels) * BYTES_PER_SAMPLE
    }

    /// Number of frames in the payload.
    pub fn frames(&self) -> usize {
        self.payload_size as usize / self.frame_size()
    }
}

#[cfg(test)]
mod test {
    use std::io::Cursor;

    use super::*;

    fn raw_header(channels: u16, payload_size: u32) -> [u8; HEADER_SIZE] {
        let mut bytes = [0u8; HEADER_SIZE];
        bytes[0..4].copy_from_slice(b"RIFF");
        bytes[8..12].copy_from_slice(b"WAVE");
        bytes[CHANNELS_OFFSET..CHANNELS_OFFSET + 2].copy_from_slice(&channels.to_le_bytes());
        bytes[PAYLOAD_SIZE_OFFSET..PAYLOAD_SIZE_OFFSET + 4]
            .copy_from_slice(&payload_size.to_le_bytes());
        bytes
    }

    #[test]
    fn test_parse() {
        let header = WaveHeader::parse(&raw_header(2, 4096)).unwrap();
        assert_eq!(2, header.channels());
        assert_eq!(4096, header.payload_size());
        assert_eq!(4, header.frame_size());
        assert_eq!(1024, header.frames());
    }

    #[test]
    fn test_parse_rejects_channel_counts() {
        assert!(matches!(
            WaveHeader::parse(&raw_header(0, 16)),
            Err(HeaderError::Channels(0))
        ));
        assert!(matches!(
            WaveHeader::parse(&raw_header(6, 16)),
            Err(HeaderError::Channels(6))
        ));
    }

    #[test]
    fn test_partial_frame_is_dropped() {
        let header = WaveHeader::parse(&raw_header(2, 4097)).unwrap();
        assert_eq!(4096, header.payload_size());

        let header = WaveHeader::parse(&raw_header(1, 7)).unwrap();
        assert_eq!(6, header.payload_size());
    }

    #[test]
    fn test_read_truncated() {
        let bytes = raw_header(1, 100);
        let mut reader = Cursor::new(&bytes[..30]);
        assert!(matches!(
            WaveHeader::read_from(&mut reader),
            Err(HeaderError::Io(_))
        ));
    }

    #[test]
    fn test_clamp_to() {
        let header = WaveHeader::new(2, 1000).unwrap();
        assert_eq!(1000, header.clamp_to(5000).payload_size());
        assert_eq!(400, header.clamp_to(402).payload_size());
        assert_eq!(0, header.clamp_to(0).payload_size());
    }
}
