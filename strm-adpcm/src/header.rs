//! DSP ADPCM header parsing
//!
//! Parses the fixed 0x60-byte mono header. All multi-byte fields are
//! big-endian regardless of the container being built.

use crate::{CHANNEL_STATE_COUNT, COEFFICIENT_COUNT, HEADER_SIZE};

/// Length of the region that must agree across every channel of a
/// multi-channel build (nibble count through loop points).
pub const STREAM_INFO_SIZE: usize = 0x1c;

/// Errors from parsing a DSP ADPCM header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DspError {
    /// Input ends before the 0x60-byte header
    TooShort,
    /// Format code is not 0 (DSP ADPCM)
    UnsupportedCodec(u16),
}

impl core::fmt::Display for DspError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            DspError::TooShort => write!(f, "input too short for DSP header (need 0x60 bytes)"),
            DspError::UnsupportedCodec(code) => {
                write!(f, "source is not DSP ADPCM (format code {:#06x})", code)
            }
        }
    }
}

impl std::error::Error for DspError {}

/// Parsed mono DSP ADPCM header
///
/// Immutable after creation. The raw first 0x1c bytes are retained so a
/// multi-channel build can require them to be byte-identical across
/// channels.
#[derive(Debug, Clone)]
pub struct DspHeader {
    nibble_count: u32,
    sample_rate: u32,
    loop_flag: bool,
    loop_start_nibble: u32,
    loop_end_nibble: u32,
    coefficients: [i16; COEFFICIENT_COUNT],
    channel_state: [i16; CHANNEL_STATE_COUNT],
    stream_info: [u8; STREAM_INFO_SIZE],
}

impl DspHeader {
    /// Parse a header from the first 0x60 bytes of a stream.
    ///
    /// # Errors
    /// Returns `DspError::TooShort` if `bytes` is smaller than the header,
    /// `DspError::UnsupportedCodec` if the format code at 0x0E is non-zero.
    pub fn from_bytes(bytes: &[u8]) -> Result<DspHeader, DspError> {
        if bytes.len() < HEADER_SIZE {
            return Err(DspError::TooShort);
        }

        let format_code = read_u16(bytes, 0x0e);
        if format_code != 0 {
            return Err(DspError::UnsupportedCodec(format_code));
        }

        let mut coefficients = [0i16; COEFFICIENT_COUNT];
        for (i, c) in coefficients.iter_mut().enumerate() {
            *c = read_u16(bytes, 0x1c + i * 2) as i16;
        }

        // 0x3c is the gain field; the 7 state words follow it
        let mut channel_state = [0i16; CHANNEL_STATE_COUNT];
        for (i, s) in channel_state.iter_mut().enumerate() {
            *s = read_u16(bytes, 0x3e + i * 2) as i16;
        }

        let mut stream_info = [0u8; STREAM_INFO_SIZE];
        stream_info.copy_from_slice(&bytes[..STREAM_INFO_SIZE]);

        Ok(DspHeader {
            nibble_count: read_u32(bytes, 0x04),
            sample_rate: read_u32(bytes, 0x08),
            loop_flag: read_u16(bytes, 0x0c) != 0,
            loop_start_nibble: read_u32(bytes, 0x10),
            loop_end_nibble: read_u32(bytes, 0x14),
            coefficients,
            channel_state,
            stream_info,
        })
    }

    /// Stream length in nibbles, as stored (before any loop-end truncation)
    pub fn nibble_count(&self) -> u32 {
        self.nibble_count
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn loop_flag(&self) -> bool {
        self.loop_flag
    }

    pub fn loop_start_nibble(&self) -> u32 {
        self.loop_start_nibble
    }

    /// Last nibble played, inclusive
    pub fn loop_end_nibble(&self) -> u32 {
        self.loop_end_nibble
    }

    pub fn coefficients(&self) -> &[i16; COEFFICIENT_COUNT] {
        &self.coefficients
    }

    /// Predictor/scale, sample history and loop state words
    pub fn channel_state(&self) -> &[i16; CHANNEL_STATE_COUNT] {
        &self.channel_state
    }

    /// Raw first 0x1c header bytes, for the cross-channel agreement check
    pub fn stream_info(&self) -> &[u8; STREAM_INFO_SIZE] {
        &self.stream_info
    }
}

fn read_u16(bytes: &[u8], offset: usize) -> u16 {
    u16::from_be_bytes([bytes[offset], bytes[offset + 1]])
}

fn read_u32(bytes: &[u8], offset: usize) -> u32 {
    u32::from_be_bytes([
        bytes[offset],
        bytes[offset + 1],
        bytes[offset + 2],
        bytes[offset + 3],
    ])
}
