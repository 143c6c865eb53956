use bytes::Bytes;
use pullmux_demux::{DemuxContext, DemuxError, ErrorKind, ProbeState, ReadOutcome};
use pullmux_engine::PacketRecord;
use pullmux_frame::codec_id::{AAC, H264, OPUS};
use pullmux_frame::{ContainerWriter, FrameEngine, Packet, StreamEntry};
use pullmux_queue::QueueMode;

struct Sample {
    bytes: Vec<u8>,
    packets: Vec<Packet>,
}

fn sample(streams: &[StreamEntry], packet_count: usize, payload_size: usize, padding: usize) -> Sample {
    let mut writer = ContainerWriter::new(Vec::new());
    writer.write_header(streams, padding).unwrap();

    let mut packets = Vec::with_capacity(packet_count);
    for i in 0..packet_count {
        let stream = &streams[i % streams.len()];
        let payload = vec![(i % 251) as u8; payload_size + i % 7];
        let packet = Packet::new(stream.index, i as i64 * 40, 40, payload);
        writer.write_packet(&packet).unwrap();
        packets.push(packet);
    }

    Sample {
        bytes: writer.into_inner(),
        packets,
    }
}

fn av_streams() -> Vec<StreamEntry> {
    vec![
        StreamEntry::new(0, H264, Bytes::from_static(b"\x01\x64\x00\x1f")),
        StreamEntry::new(1, AAC, Bytes::from_static(b"\x12\x10")),
    ]
}

/// Feed `input` in chunks no larger than `chunk`, honoring demand, and
/// collect every packet until end of stream.
fn drain(ctx: &mut DemuxContext<FrameEngine>, mut input: &[u8], chunk: usize) -> Vec<PacketRecord> {
    let mut packets = Vec::new();
    loop {
        match ctx.read_packet() {
            ReadOutcome::Packet(packet) => packets.push(packet),
            ReadOutcome::Demand(want) => {
                if input.is_empty() {
                    ctx.add_end_of_input();
                    continue;
                }
                let take = want.min(chunk).min(input.len());
                ctx.add_chunk(&input[..take]).unwrap();
                input = &input[take..];
            }
            ReadOutcome::Eof => return packets,
            ReadOutcome::Error(err) => panic!("unexpected read error: {err}"),
        }
    }
}

fn assert_matches_written(read: &[PacketRecord], written: &[Packet]) {
    assert_eq!(read.len(), written.len());
    for (got, want) in read.iter().zip(written) {
        assert_eq!(got.stream_index, u32::from(want.stream_index));
        assert_eq!(got.pts, want.pts);
        assert_eq!(got.dts, want.dts);
        assert_eq!(got.duration, want.duration);
        assert_eq!(got.payload.len(), want.payload.len());
        assert_eq!(got.payload, want.payload);
    }
}

#[test]
fn header_longer_than_first_buffer_doubles_capacity() {
    let sample = sample(&av_streams(), 4, 100, 60_000);
    let mut ctx = DemuxContext::new(FrameEngine::new());

    ctx.add_chunk(&sample.bytes[..48_000]).unwrap();

    assert!(!ctx.is_ready());
    assert_eq!(ctx.capacity(), 96_000);
    assert_eq!(ctx.demand(), 48_000);
    assert_eq!(ctx.state(), ProbeState::Probing);
}

#[test]
fn small_sample_in_one_chunk_reports_streams() {
    let sample = sample(&av_streams(), 10, 64, 0);
    let mut ctx = DemuxContext::new(FrameEngine::new());

    ctx.add_chunk(&sample.bytes).unwrap();
    let streams = ctx.streams().unwrap().to_vec();

    assert!(ctx.is_ready());
    assert_eq!(streams.len(), 2);
    assert_eq!(streams[0].codec_name, "h264");
    assert_eq!(streams[1].codec_name, "aac");
    assert_eq!(streams[1].codec_params.as_bytes(), b"\x12\x10");
    assert_eq!(ctx.format_name(), "pmx");
}

#[test]
fn read_before_input_demands_full_capacity() {
    let mut ctx = DemuxContext::new(FrameEngine::new());
    assert_eq!(ctx.read_packet(), ReadOutcome::Demand(48_000));
    assert_eq!(ctx.probe_attempts(), 0);
}

#[test]
fn buffered_packets_then_single_eof() {
    let sample = sample(&av_streams(), 25, 200, 0);
    let mut ctx = DemuxContext::new(FrameEngine::new());

    ctx.add_chunk(&sample.bytes).unwrap();
    ctx.streams().unwrap();
    ctx.add_end_of_input();

    let mut read = Vec::new();
    loop {
        match ctx.read_packet() {
            ReadOutcome::Packet(packet) => read.push(packet),
            ReadOutcome::Eof => break,
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    assert_matches_written(&read, &sample.packets);
    for _ in 0..3 {
        assert_eq!(ctx.read_packet(), ReadOutcome::Eof);
    }
}

#[test]
fn streaming_with_small_chunks_recovers_every_packet() {
    let sample = sample(&av_streams(), 200, 1_000, 100_000);
    let mut ctx = DemuxContext::new(FrameEngine::new());

    let read = drain(&mut ctx, &sample.bytes, 4_096);

    assert_matches_written(&read, &sample.packets);
    assert_eq!(ctx.capacity(), 192_000);
    assert_eq!(ctx.queue().mode(), QueueMode::Shift);
    assert!(ctx.queue().len() <= ctx.capacity());
}

#[test]
fn polled_reads_attempt_once_per_capacity_step() {
    let sample = sample(&av_streams(), 200, 1_000, 100_000);
    let mut ctx = DemuxContext::new(FrameEngine::new());

    // Probes at 48 000 and 96 000 fall short, 192 000 succeeds.
    let read = drain(&mut ctx, &sample.bytes, 1_024);
    assert_matches_written(&read, &sample.packets);
    assert_eq!(ctx.capacity(), 192_000);
    assert_eq!(ctx.probe_attempts(), 3);
}

#[test]
fn capacity_is_fixed_once_ready() {
    let sample = sample(&av_streams(), 300, 500, 0);
    let mut ctx = DemuxContext::new(FrameEngine::new());

    ctx.add_chunk(&sample.bytes[..48_000]).unwrap();
    assert!(ctx.is_ready());
    let capacity = ctx.capacity();

    let read = drain(&mut ctx, &sample.bytes[48_000..], 10_000);
    assert_matches_written(&read, &sample.packets);
    assert_eq!(ctx.capacity(), capacity);
}

#[test]
fn stream_indices_pass_through_unmodified() {
    let streams = vec![
        StreamEntry::new(7, OPUS, Bytes::new()),
        StreamEntry::new(2, H264, Bytes::new()),
    ];
    let sample = sample(&streams, 4, 16, 0);
    let mut ctx = DemuxContext::new(FrameEngine::new());
    ctx.add_chunk(&sample.bytes).unwrap();

    let indices: Vec<u32> = ctx.streams().unwrap().iter().map(|s| s.index).collect();
    assert_eq!(indices, vec![7, 2]);

    ctx.add_end_of_input();
    let read = drain(&mut ctx, &[], 1);
    assert_eq!(read[0].stream_index, 7);
    assert_eq!(read[1].stream_index, 2);
}

#[test]
fn foreign_input_is_malformed() {
    let mut input = b"RIFF\x24\x00\x00\x00WAVEfmt ".to_vec();
    input.resize(48_000, 0);
    let mut ctx = DemuxContext::new(FrameEngine::new());

    let err = ctx.add_chunk(&input).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MalformedInput);
    assert_eq!(ctx.state(), ProbeState::Failed);
    assert_eq!(ctx.read_packet(), ReadOutcome::Error(err));
}

#[test]
fn truncated_tail_reports_one_error_then_eof() {
    let sample = sample(&av_streams(), 3, 100, 0);
    let cut = sample.bytes.len() - 10;
    let mut ctx = DemuxContext::new(FrameEngine::new());

    ctx.add_chunk(&sample.bytes[..cut]).unwrap();
    ctx.add_end_of_input();

    assert!(matches!(ctx.read_packet(), ReadOutcome::Packet(_)));
    assert!(matches!(ctx.read_packet(), ReadOutcome::Packet(_)));
    assert_eq!(
        ctx.read_packet(),
        ReadOutcome::Error(DemuxError::ReadError(
            "truncated unit at end of input".to_string()
        ))
    );
    assert_eq!(ctx.read_packet(), ReadOutcome::Eof);
}

#[test]
fn header_cut_by_end_of_input_is_malformed() {
    let sample = sample(&av_streams(), 1, 10, 1_000);
    let mut ctx = DemuxContext::new(FrameEngine::new());

    ctx.add_chunk(&sample.bytes[..500]).unwrap();
    ctx.add_end_of_input();

    let err = ctx.streams().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MalformedInput);
    assert_eq!(ctx.demand(), 0);
}

#[test]
fn destroy_mid_read_is_safe() {
    let sample = sample(&av_streams(), 10, 100, 0);
    let mut ctx = DemuxContext::new(FrameEngine::new());
    ctx.add_chunk(&sample.bytes).unwrap();
    ctx.add_end_of_input();
    assert!(matches!(ctx.read_packet(), ReadOutcome::Packet(_)));

    ctx.destroy();
}
