//! Block/sample layout arithmetic
//!
//! Derives the per-channel stream parameters and the block geometry every
//! encoder consumes. Computed once per build, read-only afterwards.

use strm_adpcm::{nibbles_to_samples, samples_to_nibbles, DspHeader};

use crate::request::BuildOptions;

/// Compressed bytes per channel per block in the streamed formats
pub const BLOCK_SIZE: u32 = 0x2000;

/// Bytes per seek-table entry per channel
pub const SEEK_ENTRY_BYTES: u32 = 4;

/// Alternate seek-table granularity in samples
const ALTERNATE_SEEK_GRANULARITY: u32 = 0x400;

/// Effective per-request stream parameters
///
/// Derived once from the (agreed) channel 0 header. A looping stream is
/// truncated to its loop end before any layout computation, so every
/// emitted length field reflects the truncated stream.
#[derive(Debug, Clone, Copy)]
pub struct StreamParams {
    pub nibble_count: u32,
    pub sample_count: u32,
    pub loop_flag: bool,
    pub loop_start_sample: u32,
    pub sample_rate: u32,
}

impl StreamParams {
    pub fn derive(header: &DspHeader) -> StreamParams {
        // Loop end is the last nibble played, not one past it
        let mut nibble_count = header.nibble_count();
        if header.loop_flag() && header.loop_end_nibble() + 1 < nibble_count {
            nibble_count = header.loop_end_nibble() + 1;
        }

        StreamParams {
            nibble_count,
            sample_count: nibbles_to_samples(nibble_count),
            loop_flag: header.loop_flag(),
            loop_start_sample: nibbles_to_samples(header.loop_start_nibble()),
            sample_rate: header.sample_rate(),
        }
    }
}

/// Planned block geometry for one build
///
/// When the sample count is an exact multiple of the samples per block, the
/// last-block fields are all zero and every block is written full-size.
#[derive(Debug, Clone, Copy)]
pub struct BlockLayout {
    pub block_size: u32,
    pub samples_per_block: u32,
    pub block_count: u32,
    pub last_block_samples: u32,
    pub last_block_used_bytes: u32,
    pub last_block_padded_size: u32,
    pub seek_entry_bytes: u32,
    pub seek_granularity_samples: u32,
    pub seek_entry_count: u32,
}

impl BlockLayout {
    pub fn plan(params: &StreamParams, options: &BuildOptions) -> BlockLayout {
        let samples_per_block = nibbles_to_samples(BLOCK_SIZE * 2);

        if params.loop_start_sample % samples_per_block != 0 {
            tracing::warn!(
                "loop start sample {} is not on a block boundary (blocks are {} samples); \
                 the stream may not loop properly on seek - pad the track start with {} \
                 samples of silence",
                params.loop_start_sample,
                samples_per_block,
                samples_per_block - (params.loop_start_sample % samples_per_block)
            );
        }

        let block_count = params.sample_count.div_ceil(samples_per_block);
        let last_block_samples = params.sample_count % samples_per_block;
        let last_block_used_bytes = (samples_to_nibbles(last_block_samples) + 1) / 2;
        let last_block_padded_size = last_block_used_bytes.div_ceil(0x20) * 0x20;

        let seek_granularity_samples = if options.alternate_seek_granularity {
            ALTERNATE_SEEK_GRANULARITY
        } else {
            samples_per_block
        };

        let seek_entry_count = if options.alternate_seek_granularity {
            (BLOCK_SIZE * block_count.saturating_sub(1) + last_block_padded_size)
                / ALTERNATE_SEEK_GRANULARITY
                + 1
        } else {
            params.sample_count / seek_granularity_samples + 1
        };

        BlockLayout {
            block_size: BLOCK_SIZE,
            samples_per_block,
            block_count,
            last_block_samples,
            last_block_used_bytes,
            last_block_padded_size,
            seek_entry_bytes: SEEK_ENTRY_BYTES,
            seek_granularity_samples,
            seek_entry_count,
        }
    }

    /// Compressed bytes actually present per channel (no final-block
    /// padding)
    pub fn channel_data_bytes(&self) -> u64 {
        if self.last_block_padded_size == 0 {
            u64::from(self.block_count) * u64::from(self.block_size)
        } else {
            u64::from(self.block_count - 1) * u64::from(self.block_size)
                + u64::from(self.last_block_used_bytes)
        }
    }

    /// Compressed bytes per channel as stored in a block-interleaved data
    /// region (final block padded to 0x20)
    pub fn channel_data_padded_bytes(&self) -> u64 {
        if self.last_block_padded_size == 0 {
            u64::from(self.block_count) * u64::from(self.block_size)
        } else {
            u64::from(self.block_count - 1) * u64::from(self.block_size)
                + u64::from(self.last_block_padded_size)
        }
    }
}
