//! DSP ADPCM stream primitives
//!
//! **This is a pure crate** - it handles only the arithmetic and header
//! parsing for mono DSP ADPCM streams (`.dsp` files). Container emission
//! (BRSTM/BCSTM/BFSTM/IDSP/G1L) is handled by the caller (`strm-formats`).
//!
//! # Nibbles and frames
//!
//! DSP ADPCM measures stream length in 4-bit *nibbles*, not samples. Each
//! 16-nibble frame carries a 2-nibble predictor/scale header followed by 14
//! compressed sample nibbles:
//!
//! ```text
//! Frame (8 bytes = 16 nibbles, repeats):
//!   nibble 0-1:  predictor/scale header
//!   nibble 2-15: 14 compressed samples, one nibble each
//! ```
//!
//! A partial final frame still pays the 2-nibble header, which is why the
//! sample/nibble conversions are not a plain ratio.
//!
//! # Header layout
//!
//! The fixed 0x60-byte mono header, all fields big-endian:
//!
//! ```text
//! 0x00: raw sample count u32 (unused here)
//! 0x04: nibble count u32
//! 0x08: sample rate u32
//! 0x0C: loop flag u16
//! 0x0E: format code u16 (0 = DSP ADPCM)
//! 0x10: loop start nibble u32
//! 0x14: loop end nibble u32 (last nibble played, inclusive)
//! 0x18: initial nibble offset u32 (unused here)
//! 0x1C: decode coefficients [i16; 16]
//! 0x3C: gain u16
//! 0x3E: channel state [i16; 7] (predictor/scale, history, loop state)
//! 0x4C: padding to 0x60
//! 0x60: compressed sample data
//! ```
//!
//! # Usage
//!
//! ```
//! use strm_adpcm::{nibbles_to_samples, samples_to_nibbles};
//!
//! // 28 nibbles = one full frame (14 samples) plus a 12-nibble partial
//! // frame (10 samples)
//! assert_eq!(nibbles_to_samples(28), 24);
//! assert_eq!(samples_to_nibbles(24), 28);
//! ```

mod header;
mod nibbles;

pub use header::{DspError, DspHeader};
pub use nibbles::{nibbles_to_samples, samples_to_nibbles};

// =============================================================================
// Constants
// =============================================================================

/// Decoded samples per ADPCM frame
pub const SAMPLES_PER_FRAME: u32 = 14;

/// Nibbles per ADPCM frame (2 header + 14 samples)
pub const NIBBLES_PER_FRAME: u32 = 16;

/// Bytes per ADPCM frame
pub const BYTES_PER_FRAME: u32 = 8;

/// Header nibbles at the start of every frame
pub const FRAME_HEADER_NIBBLES: u32 = 2;

/// Size of the fixed mono header
pub const HEADER_SIZE: usize = 0x60;

/// Offset of the compressed sample data within a stream
pub const SAMPLE_DATA_OFFSET: u64 = 0x60;

/// Decode coefficients per channel
pub const COEFFICIENT_COUNT: usize = 16;

/// Channel state words following the gain field
pub const CHANNEL_STATE_COUNT: usize = 7;
