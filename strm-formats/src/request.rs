//! Build requests
//!
//! A request bundles the output format, the ordered input channels with
//! their parsed headers, and the build options. Construction enforces the
//! request-boundary invariants: 1..=12 channels, and byte-identical stream
//! info (the first 0x1c header bytes) across every channel. Coefficients
//! and channel state live outside that region and may differ per channel.

use std::io::{Read, Seek, SeekFrom};

use strm_adpcm::{DspHeader, HEADER_SIZE};

use crate::BuildError;

/// Maximum channels per build
pub const MAX_CHANNELS: usize = 12;

/// The five supported container formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Streamed container, big-endian
    Brstm,
    /// Compact streamed container, little-endian header fields
    Bcstm,
    /// Compact streamed container, big-endian header fields
    Bfstm,
    /// 16-byte-group interleave, at most 2 channels
    Idsp,
    /// 1-byte interleave
    G1l,
}

/// Optional build behaviors
#[derive(Debug, Clone, Copy, Default)]
pub struct BuildOptions {
    /// Use a 0x400-sample seek-table granularity instead of one entry per
    /// block
    pub alternate_seek_granularity: bool,
    /// Emit the extended track description (volume/pan) where the format
    /// makes it optional
    pub extended_track_info: bool,
}

/// One input channel: parsed header plus the open stream
#[derive(Debug)]
pub struct Channel<R> {
    pub header: DspHeader,
    pub stream: R,
}

impl<R: Read + Seek> Channel<R> {
    /// Read and validate a channel header from the start of a stream.
    pub fn read_from(mut stream: R) -> Result<Channel<R>, BuildError> {
        let mut bytes = [0u8; HEADER_SIZE];
        stream.seek(SeekFrom::Start(0))?;
        stream.read_exact(&mut bytes)?;
        let header = DspHeader::from_bytes(&bytes)?;
        Ok(Channel { header, stream })
    }
}

/// A validated container build request
#[derive(Debug)]
pub struct BuildRequest<R> {
    pub format: OutputFormat,
    pub channels: Vec<Channel<R>>,
    pub options: BuildOptions,
}

impl<R> BuildRequest<R> {
    /// Validate channel count and cross-channel header agreement.
    ///
    /// # Errors
    /// `BuildError::ChannelCount` for 0 or more than 12 channels;
    /// `BuildError::FormatMismatch` if any channel's stream info differs
    /// from channel 0's.
    pub fn new(
        format: OutputFormat,
        channels: Vec<Channel<R>>,
        options: BuildOptions,
    ) -> Result<BuildRequest<R>, BuildError> {
        if channels.is_empty() || channels.len() > MAX_CHANNELS {
            return Err(BuildError::ChannelCount(channels.len()));
        }

        let first = channels[0].header.stream_info();
        for (index, channel) in channels.iter().enumerate().skip(1) {
            if channel.header.stream_info() != first {
                return Err(BuildError::FormatMismatch { channel: index });
            }
        }

        Ok(BuildRequest {
            format,
            channels,
            options,
        })
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn dsp_bytes(sample_rate: u32, coeff_seed: i16) -> Vec<u8> {
        let mut bytes = vec![0u8; HEADER_SIZE + 0x20];
        bytes[0x04..0x08].copy_from_slice(&64u32.to_be_bytes());
        bytes[0x08..0x0c].copy_from_slice(&sample_rate.to_be_bytes());
        for i in 0..16 {
            let c = coeff_seed.wrapping_add(i as i16);
            bytes[0x1c + i * 2..0x1e + i * 2].copy_from_slice(&c.to_be_bytes());
        }
        bytes
    }

    fn channel(bytes: Vec<u8>) -> Channel<Cursor<Vec<u8>>> {
        Channel::read_from(Cursor::new(bytes)).unwrap()
    }

    #[test]
    fn test_agreeing_channels() {
        // Same stream info, different coefficients: accepted
        let request = BuildRequest::new(
            OutputFormat::Brstm,
            vec![
                channel(dsp_bytes(32000, 100)),
                channel(dsp_bytes(32000, -200)),
            ],
            BuildOptions::default(),
        );
        assert!(request.is_ok());
    }

    #[test]
    fn test_mismatched_sample_rate() {
        let result = BuildRequest::new(
            OutputFormat::Brstm,
            vec![
                channel(dsp_bytes(32000, 1)),
                channel(dsp_bytes(32000, 1)),
                channel(dsp_bytes(44100, 1)),
            ],
            BuildOptions::default(),
        );
        match result {
            Err(BuildError::FormatMismatch { channel }) => assert_eq!(channel, 2),
            other => panic!("expected FormatMismatch, got {:?}", other.err()),
        }
    }

    #[test]
    fn test_channel_count_bounds() {
        let empty: Vec<Channel<Cursor<Vec<u8>>>> = Vec::new();
        assert!(matches!(
            BuildRequest::new(OutputFormat::Brstm, empty, BuildOptions::default()),
            Err(BuildError::ChannelCount(0))
        ));

        let twelve: Vec<_> = (0..12).map(|_| channel(dsp_bytes(32000, 0))).collect();
        assert!(BuildRequest::new(OutputFormat::Brstm, twelve, BuildOptions::default()).is_ok());

        let thirteen: Vec<_> = (0..13).map(|_| channel(dsp_bytes(32000, 0))).collect();
        assert!(matches!(
            BuildRequest::new(OutputFormat::Brstm, thirteen, BuildOptions::default()),
            Err(BuildError::ChannelCount(13))
        ));
    }

    #[test]
    fn test_unsupported_codec_at_read() {
        let mut bytes = dsp_bytes(32000, 0);
        bytes[0x0e..0x10].copy_from_slice(&10u16.to_be_bytes());
        let result = Channel::read_from(Cursor::new(bytes));
        assert!(matches!(result, Err(BuildError::Codec(_))));
    }
}
