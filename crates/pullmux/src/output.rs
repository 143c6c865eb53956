use std::io::{IsTerminal, Write};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use pullmux_engine::{PacketRecord, StreamDescriptor, NO_TIMESTAMP};
use serde::Serialize;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
pub struct StreamOutput {
    pub index: u32,
    pub codec_id: u32,
    pub codec_name: String,
    pub params_size: usize,
}

impl From<&StreamDescriptor> for StreamOutput {
    fn from(stream: &StreamDescriptor) -> Self {
        Self {
            index: stream.index,
            codec_id: stream.codec_id,
            codec_name: stream.codec_name.clone(),
            params_size: stream.codec_params.len(),
        }
    }
}

#[derive(Serialize)]
pub struct ProbeOutput {
    pub schema_id: &'static str,
    pub file: String,
    pub format: String,
    pub streams: Vec<StreamOutput>,
    pub probe_attempts: u32,
    pub capacity: usize,
    pub bytes_fed: u64,
}

#[derive(Serialize)]
pub struct PacketOutput {
    pub stream_index: u32,
    pub pts: Option<i64>,
    pub dts: Option<i64>,
    pub duration: i64,
    pub size: usize,
}

impl From<&PacketRecord> for PacketOutput {
    fn from(record: &PacketRecord) -> Self {
        Self {
            stream_index: record.stream_index,
            pts: timestamp(record.pts),
            dts: timestamp(record.dts),
            duration: record.duration,
            size: record.payload.len(),
        }
    }
}

#[derive(Serialize)]
pub struct PacketsOutput {
    pub schema_id: &'static str,
    pub file: String,
    pub packets: Vec<PacketOutput>,
    pub read_errors: usize,
    pub complete: bool,
}

#[derive(Serialize)]
pub struct SynthOutput {
    pub schema_id: &'static str,
    pub file: String,
    pub streams: Vec<String>,
    pub packets: usize,
    pub header_padding: usize,
    pub bytes_written: u64,
}

fn timestamp(value: i64) -> Option<i64> {
    (value != NO_TIMESTAMP).then_some(value)
}

fn print_json<T: Serialize>(value: &T) {
    println!(
        "{}",
        serde_json::to_string(value).unwrap_or_else(|_| "{}".to_string())
    );
}

fn ts_cell(value: Option<i64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| v.to_string())
}

pub fn print_probe(output: &ProbeOutput, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(output),
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["INDEX", "CODEC", "CODEC ID", "PARAMS"]);
            for stream in &output.streams {
                table.add_row(vec![
                    stream.index.to_string(),
                    stream.codec_name.clone(),
                    stream.codec_id.to_string(),
                    stream.params_size.to_string(),
                ]);
            }
            println!(
                "{} ({}): {} stream(s), {} probe attempt(s), capacity {}",
                output.file,
                output.format,
                output.streams.len(),
                output.probe_attempts,
                output.capacity
            );
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!("file={} format={}", output.file, output.format);
            println!(
                "probe_attempts={} capacity={} bytes_fed={}",
                output.probe_attempts, output.capacity, output.bytes_fed
            );
            for stream in &output.streams {
                println!(
                    "stream index={} codec={} ({}) params={}",
                    stream.index, stream.codec_name, stream.codec_id, stream.params_size
                );
            }
        }
        OutputFormat::Raw => {
            for stream in &output.streams {
                println!("{}\t{}", stream.index, stream.codec_name);
            }
        }
    }
}

pub fn print_packets(output: &PacketsOutput, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(output),
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["STREAM", "PTS", "DTS", "DURATION", "SIZE"]);
            for packet in &output.packets {
                table.add_row(vec![
                    packet.stream_index.to_string(),
                    ts_cell(packet.pts),
                    ts_cell(packet.dts),
                    packet.duration.to_string(),
                    packet.size.to_string(),
                ]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty | OutputFormat::Raw => {
            for packet in &output.packets {
                println!(
                    "stream={} pts={} dts={} duration={} size={}",
                    packet.stream_index,
                    ts_cell(packet.pts),
                    ts_cell(packet.dts),
                    packet.duration,
                    packet.size
                );
            }
        }
    }
}

pub fn print_synth(output: &SynthOutput, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(output),
        OutputFormat::Table | OutputFormat::Pretty => {
            println!(
                "wrote {} ({} bytes): streams={} packets={} header_padding={}",
                output.file,
                output.bytes_written,
                output.streams.join(","),
                output.packets,
                output.header_padding
            );
        }
        OutputFormat::Raw => println!("{}", output.file),
    }
}

pub fn print_raw(data: &[u8]) {
    let mut out = std::io::stdout();
    let _ = out.write_all(data);
    let _ = out.flush();
}
