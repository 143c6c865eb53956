use bytes::BytesMut;
use pullmux_engine::{
    CodecParams, EngineError, FormatEngine, PacketRecord, ProbeLimits, StreamDescriptor,
};
use pullmux_queue::{ByteSource, Pull};
use tracing::{debug, trace};

use crate::codec::{
    announced_header_size, decode_header, decode_packet, resync, ContainerHeader, FrameConfig,
    Packet,
};
use crate::codec_id::codec_name;
use crate::error::FrameError;

const READ_CHUNK_SIZE: usize = 8 * 1024;

/// [`FormatEngine`] for the PMX reference container.
///
/// Bytes pulled from the source but not yet decoded are kept in the handle,
/// so a source that discards on read never loses part of a packet.
#[derive(Debug, Clone, Default)]
pub struct FrameEngine {
    config: FrameConfig,
}

/// Per-input state of an opened PMX container.
#[derive(Debug)]
pub struct FrameHandle {
    buf: BytesMut,
    header: ContainerHeader,
    packets_read: u64,
}

impl FrameHandle {
    /// The decoded container header.
    pub fn header(&self) -> &ContainerHeader {
        &self.header
    }

    /// Number of packets returned so far.
    pub fn packets_read(&self) -> u64 {
        self.packets_read
    }

    /// Bytes pulled from the source but not yet decoded.
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }
}

impl FrameEngine {
    /// Create an engine with default configuration.
    pub fn new() -> Self {
        Self::with_config(FrameConfig::default())
    }

    /// Create an engine with explicit configuration.
    pub fn with_config(config: FrameConfig) -> Self {
        Self { config }
    }

    /// Current engine configuration.
    pub fn config(&self) -> &FrameConfig {
        &self.config
    }

    fn to_record(&self, handle: &FrameHandle, packet: Packet) -> Result<PacketRecord, FrameError> {
        if !handle
            .header
            .streams
            .iter()
            .any(|s| s.index == packet.stream_index)
        {
            return Err(FrameError::UnknownStream(packet.stream_index));
        }
        Ok(PacketRecord {
            stream_index: u32::from(packet.stream_index),
            pts: packet.pts,
            dts: packet.dts,
            duration: packet.duration,
            payload: packet.payload,
        })
    }
}

impl FormatEngine for FrameEngine {
    type Handle = FrameHandle;

    fn name(&self) -> &str {
        "pmx"
    }

    fn open(
        &mut self,
        source: &mut dyn ByteSource,
        limits: ProbeLimits,
    ) -> pullmux_engine::Result<FrameHandle> {
        let mut buf = BytesMut::with_capacity(READ_CHUNK_SIZE.min(limits.probe_size));
        let mut consumed = 0usize;

        loop {
            if let Some(header) =
                decode_header(&mut buf, self.config.max_table_len).map_err(header_error)?
            {
                debug!(
                    streams = header.streams.len(),
                    header_size = header.wire_size(),
                    consumed,
                    "pmx header decoded"
                );
                return Ok(FrameHandle {
                    buf,
                    header,
                    packets_read: 0,
                });
            }

            if let Some(required) = announced_header_size(&buf) {
                if required > limits.probe_size {
                    debug!(
                        required,
                        probe_size = limits.probe_size,
                        "pmx header exceeds probe size"
                    );
                    return Err(EngineError::NeedMoreData);
                }
            }

            let budget = limits.probe_size.saturating_sub(consumed);
            if budget == 0 {
                return Err(EngineError::NeedMoreData);
            }

            let mut chunk = [0u8; READ_CHUNK_SIZE];
            let want = budget.min(READ_CHUNK_SIZE);
            match source.pull(&mut chunk[..want]) {
                Pull::Data(0) | Pull::EndOfData => return Err(EngineError::NeedMoreData),
                Pull::Data(read) => {
                    consumed += read;
                    buf.extend_from_slice(&chunk[..read]);
                }
            }
        }
    }

    fn find_streams(
        &mut self,
        handle: &mut FrameHandle,
        _source: &mut dyn ByteSource,
    ) -> pullmux_engine::Result<Vec<StreamDescriptor>> {
        Ok(handle
            .header
            .streams
            .iter()
            .map(|entry| StreamDescriptor {
                index: u32::from(entry.index),
                codec_id: entry.codec_id,
                codec_name: codec_name(entry.codec_id).to_string(),
                codec_params: CodecParams::new(entry.params.clone()),
            })
            .collect())
    }

    fn read_frame(
        &mut self,
        handle: &mut FrameHandle,
        source: &mut dyn ByteSource,
    ) -> pullmux_engine::Result<Option<PacketRecord>> {
        loop {
            match decode_packet(&mut handle.buf, self.config.max_payload_size) {
                Ok(Some(packet)) => {
                    let record = self
                        .to_record(handle, packet)
                        .map_err(|err| EngineError::Corrupt(err.to_string()))?;
                    handle.packets_read += 1;
                    trace!(
                        stream = record.stream_index,
                        size = record.payload.len(),
                        "pmx packet decoded"
                    );
                    return Ok(Some(record));
                }
                Ok(None) => {}
                Err(err) => {
                    let skipped = resync(&mut handle.buf);
                    debug!(%err, skipped, "pmx packet corrupt, resynchronising");
                    return Err(EngineError::Corrupt(err.to_string()));
                }
            }

            let mut chunk = [0u8; READ_CHUNK_SIZE];
            match source.pull(&mut chunk) {
                Pull::Data(0) | Pull::EndOfData => {
                    if handle.buf.is_empty() {
                        return Ok(None);
                    }
                    return Err(EngineError::NeedMoreData);
                }
                Pull::Data(read) => handle.buf.extend_from_slice(&chunk[..read]),
            }
        }
    }

    fn close(&mut self, handle: FrameHandle) {
        debug!(
            packets = handle.packets_read,
            discarded = handle.buf.len(),
            "pmx handle closed"
        );
    }
}

fn header_error(err: FrameError) -> EngineError {
    EngineError::Malformed(err.to_string())
}
