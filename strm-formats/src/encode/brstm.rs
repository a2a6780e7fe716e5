//! Streamed big-endian container (BRSTM)
//!
//! ```text
//! 0x00: "RSTM", byte-order marker 0xFEFF, version 0x0100
//! 0x08: total file size
//! 0x0C: header size 0x40, chunk count 2
//! 0x10: HEAD offset/size, ADPC offset/size, DATA offset/size,
//!       zero-padded to 0x40
//! 0x40: HEAD chunk - three 0x01000000-marked parts (stream info, track
//!       table, channel table), offsets relative to HEAD+8
//! ....: ADPC chunk - seek entries sized but zero (never populated)
//! ....: DATA chunk - per-block channel interleave, samples at chunk+0x20
//! ```
//!
//! The extended track description (type 1: volume 0x7f, pan 0x40) is
//! emitted only when the build requests it; the default is the compact
//! type-0 description.

use std::io::{Read, Seek, Write};

use crate::encode::{write_block_interleaved, write_coefficients_gapped, DSP_ADPCM_CODEC};
use crate::layout::{BlockLayout, StreamParams};
use crate::request::BuildRequest;
use crate::writer::{ChunkWriter, Endian};
use crate::BuildError;

/// Reference marker preceding every part/descriptor offset
const PART_MARKER: u32 = 0x0100_0000;

/// Marker variant for the extended (volume/pan) track description
const PART_MARKER_EXTENDED: u32 = 0x0101_0000;

pub(super) fn encode<R: Read + Seek, W: Write + Seek>(
    request: &mut BuildRequest<R>,
    out: W,
) -> Result<u64, BuildError> {
    let params = StreamParams::derive(&request.channels[0].header);
    let layout = BlockLayout::plan(&params, &request.options);
    let channels = request.channel_count() as u32;
    let pairs = channels / 2;
    let extended = request.options.extended_track_info;

    let mut w = ChunkWriter::new(out, Endian::Big);

    // File header
    w.write_bytes(b"RSTM")?;
    w.write_u16(0xfeff)?;
    w.write_u16(0x0100)?;
    let file_size = w.reserve_u32()?;
    w.write_u16(0x0040)?;
    w.write_u16(2)?;
    let head_offset = w.reserve_u32()?;
    let head_size = w.reserve_u32()?;
    let adpc_offset = w.reserve_u32()?;
    let adpc_size = w.reserve_u32()?;
    let data_offset = w.reserve_u32()?;
    let data_size = w.reserve_u32()?;
    w.pad_to(0x40)?;

    // HEAD chunk: part offsets are computable up front, so only the chunk
    // size and the absolute sample-data offset need patching
    let head_start = w.position();
    w.patch_u32(head_offset, head_start as u32)?;
    w.write_bytes(b"HEAD")?;
    let head_header_size = w.reserve_u32()?;

    let part1_rel: u32 = 0x18;
    let part1_len: u32 = 0x34;
    let track_desc_len: u32 = if extended { 12 } else { 4 };
    let track_table_len = 4 + pairs * 8;
    let part2_rel = part1_rel + part1_len;
    let part2_len = track_table_len + pairs * track_desc_len;
    let part3_rel = part2_rel + part2_len;
    let channel_table_len = 4 + channels * 8;
    let channel_desc_len: u32 = 0x38;

    w.write_u32(PART_MARKER)?;
    w.write_u32(part1_rel)?;
    w.write_u32(PART_MARKER)?;
    w.write_u32(part2_rel)?;
    w.write_u32(PART_MARKER)?;
    w.write_u32(part3_rel)?;

    // Part 1: stream info
    w.write_u8(DSP_ADPCM_CODEC)?;
    w.write_u8(params.loop_flag as u8)?;
    w.write_u8(channels as u8)?;
    w.write_u8(0)?;
    w.write_u16(params.sample_rate as u16)?;
    w.write_u16(0)?;
    w.write_u32(params.loop_start_sample)?;
    w.write_u32(params.sample_count)?;
    let sample_data_offset = w.reserve_u32()?; // absolute, known at DATA
    w.write_u32(layout.block_count)?;
    w.write_u32(layout.block_size)?;
    w.write_u32(layout.samples_per_block)?;
    w.write_u32(layout.last_block_used_bytes)?;
    w.write_u32(layout.last_block_samples)?;
    w.write_u32(layout.last_block_padded_size)?;
    w.write_u32(layout.seek_granularity_samples)?;
    w.write_u32(layout.seek_entry_bytes)?;

    // Part 2: track table, one track per channel pair
    w.write_u8(pairs as u8)?;
    w.write_u8(u8::from(extended))?;
    w.write_u16(0)?;
    for i in 0..pairs {
        w.write_u32(if extended {
            PART_MARKER_EXTENDED
        } else {
            PART_MARKER
        })?;
        w.write_u32(part2_rel + track_table_len + i * track_desc_len)?;
    }
    for i in 0..pairs {
        if extended {
            w.write_u8(0x7f)?;
            w.write_u8(0x40)?;
            w.write_u16(0)?;
            w.write_u32(0)?;
        }
        w.write_u8(2)?;
        w.write_u8((2 * i) as u8)?;
        w.write_u8((2 * i + 1) as u8)?;
        w.write_u8(0)?;
    }

    // Part 3: channel table
    w.write_u8(channels as u8)?;
    w.write_u8(0)?;
    w.write_u16(0)?;
    for i in 0..channels {
        w.write_u32(PART_MARKER)?;
        w.write_u32(part3_rel + channel_table_len + i * channel_desc_len)?;
    }
    for (i, channel) in request.channels.iter().enumerate() {
        let desc_rel = part3_rel + channel_table_len + i as u32 * channel_desc_len;
        w.write_u32(PART_MARKER)?;
        w.write_u32(desc_rel + 8)?; // coefficients follow the reference
        write_coefficients_gapped(&mut w, &channel.header)?;
    }

    w.pad_to(0x20)?;
    let head_len = (w.position() - head_start) as u32;
    w.patch_u32(head_size, head_len)?;
    w.patch_u32(head_header_size, head_len)?;

    // ADPC chunk - sized, never populated
    let adpc_start = w.position();
    w.patch_u32(adpc_offset, adpc_start as u32)?;
    w.write_bytes(b"ADPC")?;
    let adpc_header_size = w.reserve_u32()?;
    w.write_zeros(
        u64::from(layout.seek_entry_count) * u64::from(layout.seek_entry_bytes)
            * u64::from(channels),
    )?;
    w.pad_to(0x20)?;
    let adpc_len = (w.position() - adpc_start) as u32;
    w.patch_u32(adpc_size, adpc_len)?;
    w.patch_u32(adpc_header_size, adpc_len)?;

    // DATA chunk - samples begin at chunk+0x20
    let data_start = w.position();
    w.patch_u32(data_offset, data_start as u32)?;
    w.write_bytes(b"DATA")?;
    let data_header_size = w.reserve_u32()?;
    w.write_u32(0x18)?;
    w.write_zeros(0x14)?;
    w.patch_u32(sample_data_offset, data_start as u32 + 0x20)?;
    write_block_interleaved(&mut w, &mut request.channels, &layout)?;
    w.pad_to(0x20)?;
    let data_len = (w.position() - data_start) as u32;
    w.patch_u32(data_size, data_len)?;
    w.patch_u32(data_header_size, data_len)?;

    let total = w.position() as u32;
    w.patch_u32(file_size, total)?;
    Ok(w.finish()?)
}
