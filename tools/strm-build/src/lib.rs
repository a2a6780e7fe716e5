//! strm-build - streamed audio container build tool
//!
//! Converts 1-12 mono DSP ADPCM channel files (.dsp) into one of five
//! container formats (.brstm, .bcstm, .bfstm, .idsp, .g1l). The container
//! encoding itself lives in `strm-formats`; this crate opens the inputs,
//! assembles the build request, and reports per-channel summaries.

use std::fs::File;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use strm_adpcm::nibbles_to_samples;
use strm_formats::{encode, BuildOptions, BuildRequest, Channel, OutputFormat};

/// Open the input channels, run one container build, and write the output
/// file. Returns the number of bytes written.
///
/// A fatal error mid-build leaves the partial output file on disk.
pub fn build(
    format: OutputFormat,
    output: &Path,
    inputs: &[PathBuf],
    options: BuildOptions,
) -> Result<u64> {
    let mut channels = Vec::with_capacity(inputs.len());
    for path in inputs {
        let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
        let channel = Channel::read_from(file)
            .with_context(|| format!("reading codec header from {}", path.display()))?;
        tracing::info!(
            "{}: {} samples @ {} Hz{}",
            path.display(),
            nibbles_to_samples(channel.header.nibble_count()),
            channel.header.sample_rate(),
            if channel.header.loop_flag() {
                ", looped"
            } else {
                ""
            }
        );
        channels.push(channel);
    }

    let mut request = BuildRequest::new(format, channels, options)?;
    let out = File::create(output).with_context(|| format!("creating {}", output.display()))?;
    let written = encode(&mut request, out)?;
    tracing::info!("{}: {} bytes", output.display(), written);
    Ok(written)
}
