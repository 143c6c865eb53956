use bytes::Bytes;

/// Timestamp value used when an engine has no pts/dts for a unit.
pub const NO_TIMESTAMP: i64 = i64::MIN;

/// Engine-defined codec configuration, treated as an opaque value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CodecParams(Bytes);

impl CodecParams {
    /// Wrap engine-provided parameter bytes.
    pub fn new(params: impl Into<Bytes>) -> Self {
        Self(params.into())
    }

    /// Deep copy into a fresh allocation that shares nothing with the
    /// engine's buffers.
    pub fn detach(&self) -> Self {
        Self(Bytes::copy_from_slice(&self.0))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// One elementary stream discovered while probing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamDescriptor {
    /// Engine-assigned stream index. Not renumbered; may be sparse.
    pub index: u32,
    /// Engine codec identifier.
    pub codec_id: u32,
    /// Human-readable codec name.
    pub codec_name: String,
    /// Opaque codec configuration.
    pub codec_params: CodecParams,
}

impl StreamDescriptor {
    /// Copy of this descriptor whose codec params are detached from the engine.
    pub fn detached(&self) -> Self {
        Self {
            index: self.index,
            codec_id: self.codec_id,
            codec_name: self.codec_name.clone(),
            codec_params: self.codec_params.detach(),
        }
    }
}

/// One demuxed unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PacketRecord {
    /// Index of the stream this unit belongs to.
    pub stream_index: u32,
    /// Presentation timestamp, or [`NO_TIMESTAMP`].
    pub pts: i64,
    /// Decode timestamp, or [`NO_TIMESTAMP`].
    pub dts: i64,
    /// Duration in stream time base units.
    pub duration: i64,
    /// Unit payload.
    pub payload: Bytes,
}

impl PacketRecord {
    /// Copy of this record whose payload lives in its own allocation.
    pub fn detached(&self) -> Self {
        Self {
            stream_index: self.stream_index,
            pts: self.pts,
            dts: self.dts,
            duration: self.duration,
            payload: Bytes::copy_from_slice(&self.payload),
        }
    }

    /// Payload size in bytes.
    pub fn size(&self) -> usize {
        self.payload.len()
    }
}

#[cfg(test)]
mod tests {
    use bytes::BytesMut;

    use super::*;

    #[test]
    fn detached_params_survive_source_buffer() {
        let mut scratch = BytesMut::from(&b"params-and-more"[..]);
        let shared = scratch.split_to(6).freeze();
        let params = CodecParams::new(shared).detach();
        drop(scratch);
        assert_eq!(params.as_bytes(), b"params");
    }

    #[test]
    fn detached_packet_keeps_fields_and_length() {
        let record = PacketRecord {
            stream_index: 3,
            pts: 10,
            dts: 9,
            duration: 1,
            payload: Bytes::from_static(b"unit"),
        };
        let copy = record.detached();
        assert_eq!(copy, record);
        assert_eq!(copy.size(), 4);
    }

    #[test]
    fn stream_index_passes_through_detach() {
        let stream = StreamDescriptor {
            index: 17,
            codec_id: 2,
            codec_name: "aac".to_string(),
            codec_params: CodecParams::new(vec![1, 2, 3]),
        };
        let copy = stream.detached();
        assert_eq!(copy.index, 17);
        assert_eq!(copy.codec_params.len(), 3);
    }
}
