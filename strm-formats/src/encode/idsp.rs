//! Platform container with 16-byte-group interleave (IDSP)
//!
//! Big-endian throughout. The data region interleaves the channels in
//! 16-byte groups (four 32-bit words per channel per group), with each
//! channel's stream zero-padded to a 16-byte multiple first.
//!
//! The format carries at most two channels; extra channels in the request
//! are silently dropped. This matches the legacy builder, which truncated
//! the channel list here without reporting it.

use std::io::{Read, Seek, Write};

use crate::encode::{read_channel_data, write_platform_container};
use crate::layout::{BlockLayout, StreamParams};
use crate::request::BuildRequest;
use crate::BuildError;

const GROUP_SIZE: usize = 16;

pub(super) fn encode<R: Read + Seek, W: Write + Seek>(
    request: &mut BuildRequest<R>,
    out: W,
) -> Result<u64, BuildError> {
    let params = StreamParams::derive(&request.channels[0].header);
    let layout = BlockLayout::plan(&params, &request.options);

    let effective = request.channels.len().min(2);
    let channels = &mut request.channels[..effective];

    let data_len = layout.channel_data_bytes();
    let padded_len = data_len.div_ceil(GROUP_SIZE as u64) * GROUP_SIZE as u64;
    let mut buffers = Vec::with_capacity(effective);
    for channel in channels.iter_mut() {
        buffers.push(read_channel_data(channel, data_len, padded_len)?);
    }

    let mut body = Vec::with_capacity(padded_len as usize * effective);
    for group in 0..padded_len as usize / GROUP_SIZE {
        for buffer in &buffers {
            body.extend_from_slice(&buffer[group * GROUP_SIZE..(group + 1) * GROUP_SIZE]);
        }
    }

    let headers: Vec<_> = channels.iter().map(|c| &c.header).collect();
    write_platform_container(out, b"IDSP", 1, &params, &layout, &headers, &body)
}
