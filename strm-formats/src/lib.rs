//! Stream container encoders for DSP ADPCM channels
//!
//! Takes 1-12 validated mono DSP ADPCM streams and emits one of five
//! container formats used by game audio engines:
//!
//! - **BRSTM** - streamed container, big-endian fields
//! - **BCSTM** - compact streamed container, little-endian fields
//! - **BFSTM** - compact streamed container, big-endian fields (shares the
//!   BCSTM writer)
//! - **IDSP**  - 16-byte-group interleave, at most 2 channels
//! - **G1L**   - 1-byte interleave
//!
//! One build is one logical thread of control: validate headers, plan the
//! block layout, then drive the patch-back [`writer::ChunkWriter`] to emit
//! the container. All errors are fatal and propagate immediately; a partial
//! output file is left on disk, matching the legacy tool. The only
//! non-fatal diagnostic is the loop-alignment warning from the layout
//! planner.
//!
//! The SEEK/ADPC seek-acceleration chunk is correctly sized but its entries
//! are never populated - filling them would require decoding the ADPCM
//! stream. Seeking within a decoded stream may therefore not reconstruct
//! correct predictor state. This is a known limitation carried over from
//! the legacy tool.

pub mod encode;
pub mod layout;
pub mod request;
pub mod writer;

pub use encode::encode;
pub use layout::{BlockLayout, StreamParams, BLOCK_SIZE};
pub use request::{BuildOptions, BuildRequest, Channel, OutputFormat, MAX_CHANNELS};
pub use writer::{ChunkWriter, Endian, Reservation};

use strm_adpcm::DspError;

/// Errors that abort a container build
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    /// Input is not the expected DSP ADPCM format (or its header is
    /// truncated)
    #[error(transparent)]
    Codec(#[from] DspError),

    /// Two input channels disagree on codec-critical header fields
    /// (sample rate, loop points, format code)
    #[error("channel {channel} header does not agree with channel 0")]
    FormatMismatch { channel: usize },

    /// Channel count outside 1..=12 at the request boundary
    #[error("channel count {0} out of range (1-{MAX_CHANNELS})")]
    ChannelCount(usize),

    /// Open/read/write/seek failure on any stream
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
