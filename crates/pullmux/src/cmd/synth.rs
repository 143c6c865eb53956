use std::fs::File;
use std::io::BufWriter;

use pullmux_frame::{codec_id_from_name, ContainerWriter, Packet, StreamEntry};
use tracing::debug;

use crate::cmd::SynthArgs;
use crate::exit::{frame_error, io_error, CliError, CliResult, SUCCESS, USAGE};
use crate::output::{print_synth, OutputFormat, SynthOutput};

/// Packet duration in stream time base units.
const PACKET_DURATION: i64 = 40;

pub fn run(args: SynthArgs, format: OutputFormat) -> CliResult<i32> {
    let streams = stream_table(&args.codecs)?;
    let label = args.out.display().to_string();

    let file = File::create(&args.out).map_err(|err| io_error(&format!("create {label}"), err))?;
    let mut writer = ContainerWriter::new(BufWriter::new(file));
    writer
        .write_header(&streams, args.header_padding)
        .map_err(|err| frame_error(&label, err))?;

    for i in 0..args.packets {
        let stream = &streams[i % streams.len()];
        let round = (i / streams.len()) as i64;
        let payload = vec![(i % 251) as u8; args.payload_size];
        let packet = Packet::new(stream.index, round * PACKET_DURATION, PACKET_DURATION, payload);
        writer
            .write_packet(&packet)
            .map_err(|err| frame_error(&label, err))?;
    }
    writer.flush().map_err(|err| frame_error(&label, err))?;

    let file = writer
        .into_inner()
        .into_inner()
        .map_err(|err| io_error(&format!("flush {label}"), err.into_error()))?;
    let bytes_written = file
        .metadata()
        .map_err(|err| io_error(&format!("stat {label}"), err))?
        .len();
    debug!(bytes_written, packets = args.packets, "sample written");

    let output = SynthOutput {
        schema_id: "pullmux/cli/v1/synth",
        file: label,
        streams: args.codecs.iter().map(|c| c.to_ascii_lowercase()).collect(),
        packets: args.packets,
        header_padding: args.header_padding,
        bytes_written,
    };
    print_synth(&output, format);
    Ok(SUCCESS)
}

fn stream_table(codecs: &[String]) -> CliResult<Vec<StreamEntry>> {
    if codecs.is_empty() {
        return Err(CliError::new(USAGE, "at least one codec is required"));
    }
    if codecs.len() > usize::from(u8::MAX) {
        return Err(CliError::new(USAGE, "at most 255 streams are supported"));
    }

    codecs
        .iter()
        .enumerate()
        .map(|(index, name)| {
            let codec_id = codec_id_from_name(name)
                .ok_or_else(|| CliError::new(USAGE, format!("unknown codec: {name}")))?;
            let params = format!("{}-cfg", name.to_ascii_lowercase()).into_bytes();
            Ok(StreamEntry::new(index as u16, codec_id, params))
        })
        .collect()
}
