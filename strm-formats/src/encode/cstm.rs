//! Compact streamed container (BCSTM/BFSTM)
//!
//! One writer serves both header byte orders: BCSTM uses little-endian
//! fields, BFSTM big-endian. The layout is otherwise identical:
//!
//! ```text
//! 0x00: signature "CSTM"/"FSTM"
//! 0x04: byte-order marker 0xFEFF
//! 0x06: header size 0x40
//! 0x08: version words (BFSTM: 3,0; BCSTM: 0, then big-endian 2)
//! 0x0C: total file size
//! 0x10: chunk count 3
//! 0x14: chunk table (0x4000 INFO / 0x4001 SEEK / 0x4002 DATA,
//!       each with offset + size), zero-padded to 0x40
//! 0x40: INFO chunk - stream info, track pairs, per-channel coefficients
//! ....: SEEK chunk - entries sized but zero (never populated)
//! ....: DATA chunk - per-block channel interleave, samples at chunk+0x20
//! ```
//!
//! Two legacy quirks are deliberate: the BCSTM header carries one
//! big-endian version word inside the otherwise little-endian header, and
//! the track-pair count is always little-endian in both variants. The
//! track-pair count itself floors (a mono build gets zero pair entries).

use std::io::{Read, Seek, Write};

use crate::encode::{
    write_block_interleaved, write_stream_info, CHUNK_ID_DATA, CHUNK_ID_HEAD, CHUNK_ID_SEEK,
    REF_ID_CHANNEL, REF_ID_COEFFICIENTS, REF_ID_STREAM_INFO, REF_ID_TRACK,
};
use crate::layout::{BlockLayout, StreamParams};
use crate::request::{BuildRequest, OutputFormat};
use crate::writer::{ChunkWriter, Endian};
use crate::BuildError;

pub(super) fn encode<R: Read + Seek, W: Write + Seek>(
    request: &mut BuildRequest<R>,
    out: W,
) -> Result<u64, BuildError> {
    let params = StreamParams::derive(&request.channels[0].header);
    let layout = BlockLayout::plan(&params, &request.options);
    let channels = request.channel_count() as u32;
    let pairs = channels / 2;

    let endian = match request.format {
        OutputFormat::Bcstm => Endian::Little,
        _ => Endian::Big,
    };
    let mut w = ChunkWriter::new(out, endian);

    // File header
    w.write_bytes(match request.format {
        OutputFormat::Bcstm => b"CSTM",
        _ => b"FSTM",
    })?;
    w.write_u16(0xfeff)?;
    w.write_u16(0x0040)?;
    match request.format {
        OutputFormat::Bfstm => {
            w.write_u16(3)?;
            w.write_u16(0)?;
        }
        _ => {
            w.write_u16(0)?;
            w.write_u16_be(2)?;
        }
    }
    let file_size = w.reserve_u32()?;
    w.write_u16(3)?;
    w.write_u16(0)?;

    w.write_u16(CHUNK_ID_HEAD)?;
    w.write_u16(0)?;
    let info_offset = w.reserve_u32()?;
    let info_size = w.reserve_u32()?;
    w.write_u16(CHUNK_ID_SEEK)?;
    w.write_u16(0)?;
    let seek_offset = w.reserve_u32()?;
    let seek_size = w.reserve_u32()?;
    w.write_u16(CHUNK_ID_DATA)?;
    w.write_u16(0)?;
    let data_offset = w.reserve_u32()?;
    let data_size = w.reserve_u32()?;
    w.pad_to(0x20)?;

    // INFO chunk
    let info_start = w.position();
    w.patch_u32(info_offset, info_start as u32)?;
    w.write_bytes(b"INFO")?;
    let info_header_size = w.reserve_u32()?;

    // Sub-chunk references, offsets relative to INFO+8
    w.write_u16(REF_ID_STREAM_INFO)?;
    w.write_u16(0)?;
    w.write_u32(0x18)?;
    w.write_u16(0x0101)?;
    w.write_u16(0)?;
    w.write_u32(0x50)?;
    w.write_u16(0x0101)?;
    w.write_u16(0)?;
    w.write_u32(0x54 + pairs * 8)?;

    write_stream_info(&mut w, &params, &layout, channels)?;

    // Track-pair table; the count is little-endian in both variants
    w.write_u16(0x1f00)?;
    w.write_u16(0)?;
    w.write_u32(0x18)?;
    w.write_u32_le(pairs)?;
    for i in 0..pairs {
        w.write_u16(REF_ID_TRACK)?;
        w.write_u16(0)?;
        w.write_u32(channels * 12 + 8 + i * 0x14)?;
    }
    w.write_u32(channels)?;
    for i in 0..channels {
        w.write_u16(REF_ID_CHANNEL)?;
        w.write_u16(0)?;
        w.write_u32(4 + channels * 8 + pairs * 0x14 + i * 8)?;
    }

    // Volume/pan/channel-pairing entries, one per pair
    for i in 0..pairs {
        w.write_u8(127)?;
        w.write_u8(64)?;
        w.write_u16(0)?;
        w.write_u32(0x100)?;
        w.write_u32(0x0c)?;
        w.write_u32(2)?;
        w.write_u8((2 * i) as u8)?;
        w.write_u8((2 * i + 1) as u8)?;
        w.write_u16(0)?;
    }

    for i in 0..channels {
        w.write_u16(REF_ID_COEFFICIENTS)?;
        w.write_u16(0)?;
        w.write_u32(channels * 8 + i * 0x26)?;
    }

    // Coefficients and channel state, packed with no gap
    for channel in &request.channels {
        for &c in channel.header.coefficients() {
            w.write_i16(c)?;
        }
        for &s in channel.header.channel_state() {
            w.write_i16(s)?;
        }
    }

    w.pad_to(0x20)?;
    let info_len = (w.position() - info_start) as u32;
    w.patch_u32(info_size, info_len)?;
    w.patch_u32(info_header_size, info_len)?;

    // SEEK chunk - sized, never populated
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

    // DATA chunk - samples begin at chunk+0x20
    let data_start = w.position();
    w.patch_u32(data_offset, data_start as u32)?;
    w.write_bytes(b"DATA")?;
    let data_header_size = w.reserve_u32()?;
    w.write_zeros(0x18)?;
    write_block_interleaved(&mut w, &mut request.channels, &layout)?;
    w.pad_to(0x20)?;
    let data_len = (w.position() - data_start) as u32;
    w.patch_u32(data_size, data_len)?;
    w.patch_u32(data_header_size, data_len)?;

    let total = w.position() as u32;
    w.patch_u32(file_size, total)?;
    Ok(w.finish()?)
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use crate::encode::fixtures::{dsp_stream, read_u16_be, read_u16_le, read_u32_be, read_u32_le};
    use crate::request::{BuildOptions, BuildRequest, Channel, OutputFormat};

    fn build(format: OutputFormat, channel_count: usize) -> Vec<u8> {
        let channels = (0..channel_count)
            .map(|i| Channel::read_from(dsp_stream(28, 32000, None, 3 + i as u8)).unwrap())
            .collect();
        let mut request = BuildRequest::new(format, channels, BuildOptions::default()).unwrap();
        let mut out = Cursor::new(Vec::new());
        crate::encode::encode(&mut request, &mut out).unwrap();
        out.into_inner()
    }

    #[test]
    fn test_bcstm_header() {
        let bytes = build(OutputFormat::Bcstm, 2);
        assert_eq!(&bytes[0..4], b"CSTM");
        assert_eq!(read_u16_le(&bytes, 4), 0xfeff);
        assert_eq!(read_u16_le(&bytes, 6), 0x40);
        // Version: zero word then the lone big-endian 2
        assert_eq!(read_u16_le(&bytes, 8), 0);
        assert_eq!(read_u16_be(&bytes, 10), 2);
        // Recorded file size equals the actual length
        assert_eq!(read_u32_le(&bytes, 0x0c), bytes.len() as u32);
        assert_eq!(read_u16_le(&bytes, 0x10), 3);
    }

    #[test]
    fn test_bfstm_header() {
        let bytes = build(OutputFormat::Bfstm, 2);
        assert_eq!(&bytes[0..4], b"FSTM");
        assert_eq!(read_u16_be(&bytes, 4), 0xfeff);
        assert_eq!(read_u16_be(&bytes, 8), 3);
        assert_eq!(read_u32_be(&bytes, 0x0c), bytes.len() as u32);
    }

    #[test]
    fn test_chunk_table_consistency() {
        let bytes = build(OutputFormat::Bfstm, 2);

        let info_offset = read_u32_be(&bytes, 0x18);
        let info_size = read_u32_be(&bytes, 0x1c);
        let seek_offset = read_u32_be(&bytes, 0x24);
        let seek_size = read_u32_be(&bytes, 0x28);
        let data_offset = read_u32_be(&bytes, 0x30);
        let data_size = read_u32_be(&bytes, 0x34);

        assert_eq!(info_offset, 0x40);
        assert_eq!(&bytes[info_offset as usize..][..4], b"INFO");
        assert_eq!(&bytes[seek_offset as usize..][..4], b"SEEK");
        assert_eq!(&bytes[data_offset as usize..][..4], b"DATA");

        // Chunks are adjacent and sizes match the chunk headers
        assert_eq!(info_offset + info_size, seek_offset);
        assert_eq!(seek_offset + seek_size, data_offset);
        assert_eq!(data_offset + data_size, bytes.len() as u32);
        assert_eq!(read_u32_be(&bytes, info_offset as usize + 4), info_size);
        assert_eq!(read_u32_be(&bytes, seek_offset as usize + 4), seek_size);
        assert_eq!(read_u32_be(&bytes, data_offset as usize + 4), data_size);
    }

    #[test]
    fn test_stream_info_fields() {
        let bytes = build(OutputFormat::Bfstm, 2);

        // Stream info at INFO+8+0x18 = 0x60
        assert_eq!(bytes[0x60], 2); // DSP ADPCM
        assert_eq!(bytes[0x61], 0); // no loop
        assert_eq!(bytes[0x62], 2); // channels
        assert_eq!(read_u32_be(&bytes, 0x64), 32000);
        assert_eq!(read_u32_be(&bytes, 0x68), 0); // loop start
        assert_eq!(read_u32_be(&bytes, 0x6c), 24); // 28 nibbles -> 24 samples
        assert_eq!(read_u32_be(&bytes, 0x70), 1); // block count
        assert_eq!(read_u32_be(&bytes, 0x74), 0x2000);
        assert_eq!(read_u32_be(&bytes, 0x78), 14336);
        assert_eq!(read_u32_be(&bytes, 0x7c), 14); // last block used bytes
        assert_eq!(read_u32_be(&bytes, 0x80), 24); // last block samples
        assert_eq!(read_u32_be(&bytes, 0x84), 32); // last block padded
        assert_eq!(read_u32_be(&bytes, 0x88), 4); // seek entry bytes
        assert_eq!(read_u32_be(&bytes, 0x8c), 14336); // seek granularity
    }

    #[test]
    fn test_data_is_block_interleaved() {
        let bytes = build(OutputFormat::Bfstm, 2);
        let data_offset = read_u32_be(&bytes, 0x30) as usize;
        let samples = &bytes[data_offset + 0x20..];

        // Channel 0 (seed 3) then channel 1 (seed 4), each 14 used bytes
        // padded to 32
        assert_eq!(samples[0], 3);
        assert_eq!(samples[13], 3 + 13);
        assert!(samples[14..32].iter().all(|&b| b == 0));
        assert_eq!(samples[32], 4);
        assert_eq!(samples[32 + 13], 4 + 13);
        assert!(samples[46..64].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_mono_has_no_pair_entries() {
        // Legacy floor: one channel -> zero track pairs
        let bytes = build(OutputFormat::Bfstm, 1);
        let pair_count = read_u32_le(&bytes, 0x98);
        assert_eq!(pair_count, 0);
    }

    #[test]
    fn test_pair_count_always_little_endian() {
        let bytes = build(OutputFormat::Bfstm, 4);
        // Track table at 0x90: marker, zero, 0x18, then the LE pair count
        assert_eq!(read_u16_be(&bytes, 0x90), 0x1f00);
        assert_eq!(read_u32_le(&bytes, 0x98), 2);
    }

    #[test]
    fn test_determinism() {
        let a = build(OutputFormat::Bcstm, 3);
        let b = build(OutputFormat::Bcstm, 3);
        assert_eq!(a, b);
    }
}
