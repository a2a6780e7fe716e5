//! strm-build - streamed audio container build tool
//!
//! Converts mono DSP ADPCM channel files (.dsp) into streamed game-audio
//! containers (.brstm, .bcstm, .bfstm, .idsp, .g1l)

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use strm_formats::{BuildOptions, OutputFormat};

#[derive(Parser)]
#[command(name = "strm-build")]
#[command(about = "Streamed audio container build tool")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct BuildArgs {
    /// Output container file
    output: PathBuf,

    /// Input .dsp channel files, in channel order (1-12)
    #[arg(num_args = 1..=12, required = true)]
    inputs: Vec<PathBuf>,

    /// Use a 0x400-sample seek-table interval instead of one entry per
    /// block
    #[arg(long)]
    fine_seek_table: bool,

    /// Emit the extended per-track volume/pan description (BRSTM only)
    #[arg(long)]
    extended_track_info: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a streamed big-endian container
    Brstm(BuildArgs),

    /// Build a compact streamed container with little-endian fields
    Bcstm(BuildArgs),

    /// Build a compact streamed container with big-endian fields
    Bfstm(BuildArgs),

    /// Build a 16-byte-group interleaved container (at most 2 channels)
    Idsp(BuildArgs),

    /// Build a 1-byte interleaved container
    G1l(BuildArgs),
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    let (format, args) = match cli.command {
        Commands::Brstm(args) => (OutputFormat::Brstm, args),
        Commands::Bcstm(args) => (OutputFormat::Bcstm, args),
        Commands::Bfstm(args) => (OutputFormat::Bfstm, args),
        Commands::Idsp(args) => (OutputFormat::Idsp, args),
        Commands::G1l(args) => (OutputFormat::G1l, args),
    };

    let options = BuildOptions {
        alternate_seek_granularity: args.fine_seek_table,
        extended_track_info: args.extended_track_info,
    };

    strm_build::build(format, &args.output, &args.inputs, options)?;
    Ok(())
}
