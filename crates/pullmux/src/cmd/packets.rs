use pullmux_demux::{DemuxContext, ErrorKind, ReadOutcome};
use pullmux_frame::FrameEngine;
use tracing::warn;

use crate::cmd::feed::{probe_streams, FileFeeder};
use crate::cmd::PacketsArgs;
use crate::exit::{demux_error, CliResult, DATA_INVALID, SUCCESS};
use crate::output::{print_packets, print_raw, OutputFormat, PacketOutput, PacketsOutput};

pub fn run(args: PacketsArgs, format: OutputFormat) -> CliResult<i32> {
    let input = args.input;
    let label = input.file.display().to_string();
    let mut ctx = DemuxContext::with_config(FrameEngine::new(), input.demux_config()?)
        .map_err(|err| demux_error("invalid buffer configuration", err))?;
    let mut feeder = FileFeeder::open(&input.file, input.chunk_size)?;

    probe_streams(&mut feeder, &mut ctx)?;

    let limit = args.count.unwrap_or(usize::MAX);
    let mut packets = Vec::new();
    let mut read_errors = 0usize;
    let mut complete = false;

    while packets.len() < limit {
        match ctx.read_packet() {
            ReadOutcome::Packet(record) => {
                if matches!(format, OutputFormat::Raw) {
                    print_raw(&record.payload);
                }
                packets.push(PacketOutput::from(&record));
            }
            ReadOutcome::Demand(want) => feeder.feed(&mut ctx, want)?,
            ReadOutcome::Eof => {
                complete = true;
                break;
            }
            ReadOutcome::Error(err) if err.kind() == ErrorKind::ReadError => {
                warn!(%err, "skipping unreadable packet");
                read_errors += 1;
            }
            ReadOutcome::Error(err) => return Err(demux_error(&label, err)),
        }
    }
    ctx.destroy();

    let output = PacketsOutput {
        schema_id: "pullmux/cli/v1/packets",
        file: label,
        packets,
        read_errors,
        complete,
    };
    if !matches!(format, OutputFormat::Raw) {
        print_packets(&output, format);
    }

    if read_errors > 0 {
        return Ok(DATA_INVALID);
    }
    Ok(SUCCESS)
}
