use clap::{Args, Subcommand};
use std::path::PathBuf;

use pullmux_demux::DemuxConfig;

use crate::exit::{CliError, CliResult, USAGE};
use crate::output::OutputFormat;

pub mod envinfo;
pub mod feed;
pub mod packets;
pub mod probe;
pub mod synth;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Identify a container and list its streams.
    Probe(ProbeArgs),
    /// Probe, then print packet records.
    Packets(PacketsArgs),
    /// Write a synthetic PMX sample.
    Synth(SynthArgs),
    /// Show version information.
    Version(VersionArgs),
    /// Print build and environment diagnostics.
    Envinfo(EnvinfoArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Probe(args) => probe::run(args, format),
        Command::Packets(args) => packets::run(args, format),
        Command::Synth(args) => synth::run(args, format),
        Command::Version(args) => version::run(args),
        Command::Envinfo(args) => envinfo::run(args, format),
    }
}

#[derive(Args, Debug, Clone)]
pub struct InputArgs {
    /// Container file to read.
    pub file: PathBuf,
    /// Largest chunk handed to the demuxer at once.
    #[arg(long, default_value_t = 4096)]
    pub chunk_size: usize,
    /// Initial buffer capacity, which is also the first probe size
    /// [default: $PULLMUX_INITIAL_CAPACITY or 48000].
    #[arg(long)]
    pub initial_capacity: Option<usize>,
    /// Largest buffer probing may grow to, 0 for no limit
    /// [default: $PULLMUX_MAX_PROBE_SIZE or 64 MiB].
    #[arg(long)]
    pub max_probe_size: Option<usize>,
}

impl InputArgs {
    /// Environment configuration with command-line overrides applied.
    pub fn demux_config(&self) -> CliResult<DemuxConfig> {
        let mut config =
            DemuxConfig::from_env().map_err(|err| CliError::new(USAGE, err.to_string()))?;
        if let Some(initial) = self.initial_capacity {
            config = config.with_initial_capacity(initial);
        }
        if let Some(max) = self.max_probe_size {
            config = config.with_max_probe_size(max);
        }
        config
            .validate()
            .map_err(|err| CliError::new(USAGE, err.to_string()))?;
        Ok(config)
    }
}

#[derive(Args, Debug)]
pub struct ProbeArgs {
    #[command(flatten)]
    pub input: InputArgs,
}

#[derive(Args, Debug)]
pub struct PacketsArgs {
    #[command(flatten)]
    pub input: InputArgs,
    /// Stop after N packets.
    #[arg(long)]
    pub count: Option<usize>,
}

#[derive(Args, Debug)]
pub struct SynthArgs {
    /// Output file.
    pub out: PathBuf,
    /// Codecs, one stream each (comma-separated).
    #[arg(long, value_delimiter = ',', default_value = "h264,aac")]
    pub codecs: Vec<String>,
    /// Number of packets, assigned to streams round-robin.
    #[arg(long, default_value_t = 100)]
    pub packets: usize,
    /// Payload bytes per packet.
    #[arg(long, default_value_t = 1024)]
    pub payload_size: usize,
    /// Zero bytes appended to the stream table.
    #[arg(long, default_value_t = 0)]
    pub header_padding: usize,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

#[derive(Args, Debug, Default)]
pub struct EnvinfoArgs {}
