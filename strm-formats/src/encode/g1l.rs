//! Platform container with 1-byte interleave (G1L)
//!
//! Same big-endian scaffold as the IDSP container with signature `G1L `
//! and version 0. The data region interleaves the channels byte by byte
//! over the exact per-channel stream length, no per-channel padding.

use std::io::{Read, Seek, Write};

use crate::encode::{read_channel_data, write_platform_container};
use crate::layout::{BlockLayout, StreamParams};
use crate::request::BuildRequest;
use crate::BuildError;

pub(super) fn encode<R: Read + Seek, W: Write + Seek>(
    request: &mut BuildRequest<R>,
    out: W,
) -> Result<u64, BuildError> {
    let params = StreamParams::derive(&request.channels[0].header);
    let layout = BlockLayout::plan(&params, &request.options);

    let data_len = layout.channel_data_bytes();
    let mut buffers = Vec::with_capacity(request.channels.len());
    for channel in request.channels.iter_mut() {
        buffers.push(read_channel_data(channel, data_len, data_len)?);
    }

    let mut body = Vec::with_capacity(data_len as usize * buffers.len());
    for i in 0..data_len as usize {
        for buffer in &buffers {
            body.push(buffer[i]);
        }
    }

    let headers: Vec<_> = request.channels.iter().map(|c| &c.header).collect();
    write_platform_container(out, b"G1L ", 0, &params, &layout, &headers, &body)
}
