use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::{FrameError, Result};

/// Container header: magic (2) + version (1) + stream count (1) + table length (4).
pub const HEADER_SIZE: usize = 8;

/// Container magic bytes: "PM" (0x50 0x4D).
pub const MAGIC: [u8; 2] = [0x50, 0x4D];

/// The only container version understood by this crate.
pub const VERSION: u8 = 1;

/// Packet header: magic (2) + length (4) + stream (2) + pts (8) + dts (8) + duration (8).
pub const PACKET_HEADER_SIZE: usize = 32;

/// Packet magic bytes: "PK" (0x50 0x4B).
pub const PACKET_MAGIC: [u8; 2] = [0x50, 0x4B];

/// Fixed part of one stream table entry: index (2) + codec id (4) + params length (4).
pub const STREAM_ENTRY_SIZE: usize = 10;

/// Default maximum payload size: 16 MiB.
pub const DEFAULT_MAX_PAYLOAD: usize = 16 * 1024 * 1024;

/// Default maximum stream table size: 64 MiB.
pub const DEFAULT_MAX_TABLE: usize = 64 * 1024 * 1024;

/// One entry of the stream table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamEntry {
    /// Stream index as written by the muxer.
    pub index: u16,
    /// Codec identifier, see [`crate::codec_id`].
    pub codec_id: u32,
    /// Opaque codec configuration.
    pub params: Bytes,
}

impl StreamEntry {
    /// Create a stream entry.
    pub fn new(index: u16, codec_id: u32, params: impl Into<Bytes>) -> Self {
        Self {
            index,
            codec_id,
            params: params.into(),
        }
    }
}

/// A decoded container header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerHeader {
    /// Declared streams in table order.
    pub streams: Vec<StreamEntry>,
    /// Length of the stream table including padding.
    pub table_len: usize,
}

impl ContainerHeader {
    /// Total bytes occupied by the header and its stream table.
    pub fn wire_size(&self) -> usize {
        HEADER_SIZE + self.table_len
    }
}

/// A framed packet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    pub stream_index: u16,
    pub pts: i64,
    pub dts: i64,
    pub duration: i64,
    pub payload: Bytes,
}

impl Packet {
    /// Create a packet with `pts == dts == timestamp`.
    pub fn new(stream_index: u16, timestamp: i64, duration: i64, payload: impl Into<Bytes>) -> Self {
        Self {
            stream_index,
            pts: timestamp,
            dts: timestamp,
            duration,
            payload: payload.into(),
        }
    }

    /// The total wire size of this packet (header + payload).
    pub fn wire_size(&self) -> usize {
        PACKET_HEADER_SIZE + self.payload.len()
    }
}

/// Encode a container header followed by `padding` zero bytes of table slack.
///
/// Wire format:
/// ```text
/// ┌────────────┬─────────┬─────────┬────────────┬──────────────────────────┐
/// │ Magic (2B) │ Version │ Streams │ Table len  │ Stream table + padding   │
/// │ "PM"       │ (1B)    │ (1B)    │ (4B LE)    │ (Table len bytes)        │
/// └────────────┴─────────┴─────────┴────────────┴──────────────────────────┘
/// stream entry: index (2B LE) │ codec id (4B LE) │ params len (4B LE) │ params
/// ```
pub fn encode_header(streams: &[StreamEntry], padding: usize, dst: &mut BytesMut) -> Result<()> {
    if streams.is_empty() || streams.len() > u8::MAX as usize {
        return Err(FrameError::MalformedTable(format!(
            "stream count must be 1..=255, got {}",
            streams.len()
        )));
    }

    let entries_len: usize = streams
        .iter()
        .map(|s| STREAM_ENTRY_SIZE + s.params.len())
        .sum();
    let table_len = entries_len.saturating_add(padding);
    if table_len > u32::MAX as usize {
        return Err(FrameError::TableTooLarge {
            size: table_len,
            max: u32::MAX as usize,
        });
    }

    dst.reserve(HEADER_SIZE + table_len);
    dst.put_slice(&MAGIC);
    dst.put_u8(VERSION);
    dst.put_u8(streams.len() as u8);
    dst.put_u32_le(table_len as u32);
    for stream in streams {
        if stream.params.len() > u32::MAX as usize {
            return Err(FrameError::TableTooLarge {
                size: stream.params.len(),
                max: u32::MAX as usize,
            });
        }
        dst.put_u16_le(stream.index);
        dst.put_u32_le(stream.codec_id);
        dst.put_u32_le(stream.params.len() as u32);
        dst.put_slice(&stream.params);
    }
    dst.put_bytes(0, padding);
    Ok(())
}

/// Total header size announced by the fixed header prefix, if it is buffered.
pub fn announced_header_size(src: &[u8]) -> Option<usize> {
    if src.len() < HEADER_SIZE {
        return None;
    }
    let mut cursor = &src[4..HEADER_SIZE];
    Some(HEADER_SIZE + cursor.get_u32_le() as usize)
}

/// Decode a container header from a buffer.
///
/// Returns `Ok(None)` if the buffer doesn't contain the complete header and
/// stream table yet. A wrong magic is rejected as soon as its first byte is
/// buffered. On success, consumes the header bytes from the buffer.
pub fn decode_header(src: &mut BytesMut, max_table_len: usize) -> Result<Option<ContainerHeader>> {
    let prefix = src.len().min(MAGIC.len());
    if src[..prefix] != MAGIC[..prefix] {
        return Err(FrameError::InvalidMagic);
    }
    if src.len() < HEADER_SIZE {
        return Ok(None); // Need more data
    }

    let mut cursor = &src[MAGIC.len()..HEADER_SIZE];
    let version = cursor.get_u8();
    let stream_count = cursor.get_u8() as usize;
    let table_len = cursor.get_u32_le() as usize;

    if version != VERSION {
        return Err(FrameError::UnsupportedVersion(version));
    }
    if stream_count == 0 {
        return Err(FrameError::MalformedTable(
            "container declares no streams".to_string(),
        ));
    }
    if table_len > max_table_len {
        return Err(FrameError::TableTooLarge {
            size: table_len,
            max: max_table_len,
        });
    }
    if src.len() < HEADER_SIZE + table_len {
        return Ok(None); // Need more data
    }

    src.advance(HEADER_SIZE);
    let mut table = src.split_to(table_len).freeze();
    let mut streams: Vec<StreamEntry> = Vec::with_capacity(stream_count);

    for _ in 0..stream_count {
        if table.remaining() < STREAM_ENTRY_SIZE {
            return Err(FrameError::MalformedTable(
                "stream entry overruns table".to_string(),
            ));
        }
        let index = table.get_u16_le();
        let codec_id = table.get_u32_le();
        let params_len = table.get_u32_le() as usize;
        if table.remaining() < params_len {
            return Err(FrameError::MalformedTable(format!(
                "codec params of stream {index} overrun table"
            )));
        }
        if streams.iter().any(|s| s.index == index) {
            return Err(FrameError::MalformedTable(format!(
                "duplicate stream index {index}"
            )));
        }
        let params = table.split_to(params_len);
        streams.push(StreamEntry {
            index,
            codec_id,
            params,
        });
    }

    Ok(Some(ContainerHeader { streams, table_len }))
}

/// Encode a packet into the wire format.
///
/// Wire format:
/// ```text
/// ┌────────────┬──────────┬──────────┬──────────┬──────────┬──────────┬─────────┐
/// │ Magic (2B) │ Length   │ Stream   │ PTS      │ DTS      │ Duration │ Payload │
/// │ "PK"       │ (4B LE)  │ (2B LE)  │ (8B LE)  │ (8B LE)  │ (8B LE)  │         │
/// └────────────┴──────────┴──────────┴──────────┴──────────┴──────────┴─────────┘
/// ```
pub fn encode_packet(packet: &Packet, dst: &mut BytesMut) -> Result<()> {
    if packet.payload.len() > u32::MAX as usize {
        return Err(FrameError::PayloadTooLarge {
            size: packet.payload.len(),
            max: u32::MAX as usize,
        });
    }
    dst.reserve(packet.wire_size());
    dst.put_slice(&PACKET_MAGIC);
    dst.put_u32_le(packet.payload.len() as u32);
    dst.put_u16_le(packet.stream_index);
    dst.put_i64_le(packet.pts);
    dst.put_i64_le(packet.dts);
    dst.put_i64_le(packet.duration);
    dst.put_slice(&packet.payload);
    Ok(())
}

/// Decode a packet from a buffer.
///
/// Returns `Ok(None)` if the buffer doesn't contain a complete packet yet.
/// On success, consumes the packet bytes from the buffer.
pub fn decode_packet(src: &mut BytesMut, max_payload: usize) -> Result<Option<Packet>> {
    let prefix = src.len().min(PACKET_MAGIC.len());
    if src[..prefix] != PACKET_MAGIC[..prefix] {
        return Err(FrameError::InvalidPacketMagic);
    }
    if src.len() < PACKET_HEADER_SIZE {
        return Ok(None); // Need more data
    }

    let mut cursor = &src[PACKET_MAGIC.len()..PACKET_HEADER_SIZE];
    let payload_len = cursor.get_u32_le() as usize;
    let stream_index = cursor.get_u16_le();
    let pts = cursor.get_i64_le();
    let dts = cursor.get_i64_le();
    let duration = cursor.get_i64_le();

    if payload_len > max_payload {
        return Err(FrameError::PayloadTooLarge {
            size: payload_len,
            max: max_payload,
        });
    }

    let total = PACKET_HEADER_SIZE + payload_len;
    if src.len() < total {
        return Ok(None); // Need more data
    }

    src.advance(PACKET_HEADER_SIZE);
    let payload = src.split_to(payload_len).freeze();

    Ok(Some(Packet {
        stream_index,
        pts,
        dts,
        duration,
        payload,
    }))
}

/// Drop bytes up to the next candidate packet magic after a decode error.
///
/// Returns the number of bytes discarded. Always discards at least one byte
/// from a non-empty buffer so repeated calls make progress.
pub fn resync(src: &mut BytesMut) -> usize {
    if src.is_empty() {
        return 0;
    }
    let skip = src[1..]
        .windows(PACKET_MAGIC.len())
        .position(|w| w == PACKET_MAGIC)
        .map(|pos| pos + 1)
        .unwrap_or_else(|| {
            // Keep a trailing first magic byte; its partner may still arrive.
            if src.len() > 1 && src[src.len() - 1] == PACKET_MAGIC[0] {
                src.len() - 1
            } else {
                src.len()
            }
        });
    src.advance(skip);
    skip
}

/// Configuration for the container codec.
#[derive(Debug, Clone)]
pub struct FrameConfig {
    /// Maximum payload size in bytes. Default: 16 MiB.
    pub max_payload_size: usize,
    /// Maximum stream table size in bytes. Default: 64 MiB.
    pub max_table_len: usize,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            max_payload_size: DEFAULT_MAX_PAYLOAD,
            max_table_len: DEFAULT_MAX_TABLE,
        }
    }
}
