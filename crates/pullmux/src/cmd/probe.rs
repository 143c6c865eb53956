use pullmux_demux::DemuxContext;
use pullmux_frame::FrameEngine;

use crate::cmd::feed::{probe_streams, FileFeeder};
use crate::cmd::ProbeArgs;
use crate::exit::{demux_error, CliResult, SUCCESS};
use crate::output::{print_probe, OutputFormat, ProbeOutput, StreamOutput};

pub fn run(args: ProbeArgs, format: OutputFormat) -> CliResult<i32> {
    let input = args.input;
    let label = input.file.display().to_string();
    let mut ctx = DemuxContext::with_config(FrameEngine::new(), input.demux_config()?)
        .map_err(|err| demux_error("invalid buffer configuration", err))?;
    let mut feeder = FileFeeder::open(&input.file, input.chunk_size)?;

    probe_streams(&mut feeder, &mut ctx)?;
    let streams = ctx
        .streams()
        .map_err(|err| demux_error(&label, err))?
        .iter()
        .map(StreamOutput::from)
        .collect();

    let output = ProbeOutput {
        schema_id: "pullmux/cli/v1/probe",
        file: label,
        format: ctx.format_name().to_string(),
        streams,
        probe_attempts: ctx.probe_attempts(),
        capacity: ctx.capacity(),
        bytes_fed: feeder.fed(),
    };
    ctx.destroy();

    print_probe(&output, format);
    Ok(SUCCESS)
}
