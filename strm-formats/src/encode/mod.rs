//! Container encoders
//!
//! All five encoders follow one template: derive the stream parameters and
//! block layout, write a fixed-signature file header with reserved
//! total-size and chunk-table fields, write a metadata chunk (codec
//! parameters, loop points, block geometry, per-channel coefficients),
//! write the sized-but-empty seek chunk, write the interleaved sample-data
//! chunk, then patch every reserved field. They differ in byte order,
//! signature, chunk-table shape and data interleave granularity.
//!
//! Each format is a fixed binary template parameterized by channel count
//! and the planned layout, not a generic serializer - the offsets written
//! here must match the legacy layouts bit for bit.

mod brstm;
mod cstm;
mod g1l;
mod idsp;

use std::io::{self, Read, Seek, Write};

use strm_adpcm::SAMPLE_DATA_OFFSET;

use crate::layout::{BlockLayout, StreamParams};
use crate::request::{BuildRequest, Channel, OutputFormat};
use crate::writer::ChunkWriter;
use crate::BuildError;

/// Codec identifier for DSP ADPCM in every container's stream info
const DSP_ADPCM_CODEC: u8 = 2;

/// Chunk identifiers shared by the table-based containers
const CHUNK_ID_HEAD: u16 = 0x4000;
const CHUNK_ID_SEEK: u16 = 0x4001;
const CHUNK_ID_DATA: u16 = 0x4002;

/// Sub-chunk reference identifiers
const REF_ID_STREAM_INFO: u16 = 0x4100;
const REF_ID_TRACK: u16 = 0x4101;
const REF_ID_CHANNEL: u16 = 0x4102;
const REF_ID_COEFFICIENTS: u16 = 0x0300;

/// Encode one build request to the output stream, returning the bytes
/// written.
///
/// The format dispatch is a closed match over the five encoders; the
/// request's channels have already passed the boundary validation in
/// [`BuildRequest::new`].
pub fn encode<R: Read + Seek, W: Write + Seek>(
    request: &mut BuildRequest<R>,
    out: W,
) -> Result<u64, BuildError> {
    match request.format {
        OutputFormat::Brstm => brstm::encode(request, out),
        OutputFormat::Bcstm | OutputFormat::Bfstm => cstm::encode(request, out),
        OutputFormat::Idsp => idsp::encode(request, out),
        OutputFormat::G1l => g1l::encode(request, out),
    }
}

/// Stream-info block shared by the compact, IDSP and G1L metadata chunks
/// (BRSTM orders its fields differently).
fn write_stream_info<W: Write + Seek>(
    w: &mut ChunkWriter<W>,
    params: &StreamParams,
    layout: &BlockLayout,
    channel_count: u32,
) -> io::Result<()> {
    w.write_u8(DSP_ADPCM_CODEC)?;
    w.write_u8(params.loop_flag as u8)?;
    w.write_u8(channel_count as u8)?;
    w.write_u8(0)?;
    w.write_u32(params.sample_rate)?;
    w.write_u32(params.loop_start_sample)?;
    w.write_u32(params.sample_count)?;
    w.write_u32(layout.block_count)?;
    w.write_u32(layout.block_size)?;
    w.write_u32(layout.samples_per_block)?;
    w.write_u32(layout.last_block_used_bytes)?;
    w.write_u32(layout.last_block_samples)?;
    w.write_u32(layout.last_block_padded_size)?;
    w.write_u32(layout.seek_entry_bytes)?;
    w.write_u32(layout.seek_granularity_samples)?;
    Ok(())
}

/// Per-channel coefficient block with the zero gain slot between the
/// coefficients and the channel state (the streamed-format shape; the
/// compact format packs them with no gap).
fn write_coefficients_gapped<W: Write + Seek>(
    w: &mut ChunkWriter<W>,
    header: &strm_adpcm::DspHeader,
) -> io::Result<()> {
    for &c in header.coefficients() {
        w.write_i16(c)?;
    }
    w.write_u16(0)?;
    for &s in header.channel_state() {
        w.write_i16(s)?;
    }
    Ok(())
}

/// Per-block channel interleave for the streamed formats: each block index
/// emits one full block per channel in channel order; a partial final
/// block is copied short and zero-padded to its padded size.
fn write_block_interleaved<R: Read + Seek, W: Write + Seek>(
    w: &mut ChunkWriter<W>,
    channels: &mut [Channel<R>],
    layout: &BlockLayout,
) -> Result<(), BuildError> {
    let full_blocks = if layout.last_block_padded_size == 0 {
        layout.block_count
    } else {
        layout.block_count - 1
    };

    let mut src_offset = SAMPLE_DATA_OFFSET;
    for _ in 0..full_blocks {
        for channel in channels.iter_mut() {
            w.copy_from(&mut channel.stream, src_offset, layout.block_size.into())?;
        }
        src_offset += u64::from(layout.block_size);
    }

    if layout.last_block_padded_size != 0 {
        for channel in channels.iter_mut() {
            w.copy_from(
                &mut channel.stream,
                src_offset,
                layout.last_block_used_bytes.into(),
            )?;
            w.write_zeros(u64::from(
                layout.last_block_padded_size - layout.last_block_used_bytes,
            ))?;
        }
    }

    Ok(())
}

/// Read one channel's entire compressed data region into memory, padded
/// with zeros to `padded_len` (the byte- and group-interleaved formats
/// need random access across the whole region).
fn read_channel_data<R: Read + Seek>(
    channel: &mut Channel<R>,
    data_len: u64,
    padded_len: u64,
) -> Result<Vec<u8>, BuildError> {
    let mut buf = vec![0u8; padded_len as usize];
    channel.stream.seek(io::SeekFrom::Start(SAMPLE_DATA_OFFSET))?;
    channel.stream.read_exact(&mut buf[..data_len as usize])?;
    Ok(buf)
}

/// Shared scaffold for the two platform containers (IDSP/G1L): big-endian
/// throughout, same chunk table and metadata shape, differing only in
/// signature, version word and the pre-interleaved data body.
fn write_platform_container<W: Write + Seek>(
    out: W,
    signature: &[u8; 4],
    version: u16,
    params: &StreamParams,
    layout: &BlockLayout,
    headers: &[&strm_adpcm::DspHeader],
    body: &[u8],
) -> Result<u64, BuildError> {
    let channels = headers.len() as u32;
    let mut w = ChunkWriter::new(out, crate::writer::Endian::Big);

    w.write_bytes(signature)?;
    w.write_u16(0xfeff)?;
    w.write_u16(0x0040)?;
    w.write_u16(version)?;
    w.write_u16(0)?;
    let file_size = w.reserve_u32()?;
    w.write_u16(3)?;
    w.write_u16(0)?;
    w.write_u16(CHUNK_ID_HEAD)?;
    w.write_u16(0)?;
    let head_offset = w.reserve_u32()?;
    let head_size = w.reserve_u32()?;
    w.write_u16(CHUNK_ID_SEEK)?;
    w.write_u16(0)?;
    let seek_offset = w.reserve_u32()?;
    let seek_size = w.reserve_u32()?;
    w.write_u16(CHUNK_ID_DATA)?;
    w.write_u16(0)?;
    let data_offset = w.reserve_u32()?;
    let data_size = w.reserve_u32()?;
    w.pad_to(0x40)?;

    // HEAD: one stream-info reference, then the per-channel coefficients
    let head_start = w.position();
    w.patch_u32(head_offset, head_start as u32)?;
    w.write_bytes(b"HEAD")?;
    let head_header_size = w.reserve_u32()?;
    w.write_u16(REF_ID_STREAM_INFO)?;
    w.write_u16(0)?;
    w.write_u32(0x08)?; // relative to the reference base at HEAD+8
    write_stream_info(&mut w, params, layout, channels)?;
    for header in headers {
        write_coefficients_gapped(&mut w, header)?;
    }
    w.pad_to(0x20)?;
    let head_len = (w.position() - head_start) as u32;
    w.patch_u32(head_size, head_len)?;
    w.patch_u32(head_header_size, head_len)?;

    // SEEK: sized, never populated
    let seek_start = w.position();
    w.patch_u32(seek_offset, seek_start as u32)?;
    w.write_bytes(b"SEEK")?;
    let seek_header_size = w.reserve_u32()?;
    w.write_zeros(
        u64::from(layout.seek_entry_count) * u64::from(layout.seek_entry_bytes)
            * u64::from(channels),
    )?;
    w.pad_to(0x20)?;
    let seek_len = (w.position() - seek_start) as u32;
    w.patch_u32(seek_size, seek_len)?;
    w.patch_u32(seek_header_size, seek_len)?;

    // DATA: interleaved body begins at chunk+0x10
    let data_start = w.position();
    w.patch_u32(data_offset, data_start as u32)?;
    w.write_bytes(b"DATA")?;
    let data_header_size = w.reserve_u32()?;
    w.write_zeros(8)?;
    w.write_bytes(body)?;
    w.pad_to(0x20)?;
    let data_len = (w.position() - data_start) as u32;
    w.patch_u32(data_size, data_len)?;
    w.patch_u32(data_header_size, data_len)?;

    let total = w.position() as u32;
    w.patch_u32(file_size, total)?;
    Ok(w.finish()?)
}

#[cfg(test)]
pub(crate) mod fixtures {
    use std::io::Cursor;

    use strm_adpcm::HEADER_SIZE;

    /// Synthesize a valid mono DSP stream: 0x60-byte header plus a
    /// deterministic data pattern long enough for `nibble_count` nibbles.
    pub fn dsp_stream(
        nibble_count: u32,
        sample_rate: u32,
        loop_points: Option<(u32, u32)>,
        seed: u8,
    ) -> Cursor<Vec<u8>> {
        let data_len = nibble_count.div_ceil(2) as usize;
        let mut bytes = vec![0u8; HEADER_SIZE + data_len];
        bytes[0x04..0x08].copy_from_slice(&nibble_count.to_be_bytes());
        bytes[0x08..0x0c].copy_from_slice(&sample_rate.to_be_bytes());
        if let Some((start, end)) = loop_points {
            bytes[0x0c..0x0e].copy_from_slice(&1u16.to_be_bytes());
            bytes[0x10..0x14].copy_from_slice(&start.to_be_bytes());
            bytes[0x14..0x18].copy_from_slice(&end.to_be_bytes());
        }
        for i in 0..16 {
            let c = (seed as i16).wrapping_mul(i as i16 + 1);
            bytes[0x1c + i * 2..0x1e + i * 2].copy_from_slice(&c.to_be_bytes());
        }
        for (i, b) in bytes[HEADER_SIZE..].iter_mut().enumerate() {
            *b = seed.wrapping_add(i as u8);
        }
        Cursor::new(bytes)
    }

    pub fn read_u32_be(bytes: &[u8], offset: usize) -> u32 {
        u32::from_be_bytes(bytes[offset..offset + 4].try_into().unwrap())
    }

    pub fn read_u32_le(bytes: &[u8], offset: usize) -> u32 {
        u32::from_le_bytes(bytes[offset..offset + 4].try_into().unwrap())
    }

    pub fn read_u16_be(bytes: &[u8], offset: usize) -> u16 {
        u16::from_be_bytes(bytes[offset..offset + 2].try_into().unwrap())
    }

    pub fn read_u16_le(bytes: &[u8], offset: usize) -> u16 {
        u16::from_le_bytes(bytes[offset..offset + 2].try_into().unwrap())
    }
}
