use std::io::{ErrorKind, Write};

use bytes::BytesMut;

use crate::codec::{encode_header, encode_packet, FrameConfig, Packet, StreamEntry};
use crate::error::{FrameError, Result};

const INITIAL_BUFFER_CAPACITY: usize = 8 * 1024;

/// Writes a PMX container (header, then packets) to any `Write` sink.
pub struct ContainerWriter<T> {
    inner: T,
    buf: BytesMut,
    config: FrameConfig,
    streams: Vec<u16>,
}

impl<T: Write> ContainerWriter<T> {
    /// Create a new container writer with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, FrameConfig::default())
    }

    /// Create a new container writer with explicit configuration.
    pub fn with_config(inner: T, config: FrameConfig) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            config,
            streams: Vec::new(),
        }
    }

    /// Write the container header. Must be called exactly once, first.
    ///
    /// `padding` adds zero bytes to the stream table, raising the amount of
    /// leading data a reader needs before the format can be identified.
    pub fn write_header(&mut self, streams: &[StreamEntry], padding: usize) -> Result<()> {
        if !self.streams.is_empty() {
            return Err(FrameError::MalformedTable(
                "header already written".to_string(),
            ));
        }

        self.buf.clear();
        encode_header(streams, padding, &mut self.buf)?;
        self.flush_buf()?;
        self.streams = streams.iter().map(|s| s.index).collect();
        Ok(())
    }

    /// Write one packet for a declared stream.
    pub fn write_packet(&mut self, packet: &Packet) -> Result<()> {
        if !self.streams.contains(&packet.stream_index) {
            return Err(FrameError::UnknownStream(packet.stream_index));
        }
        if packet.payload.len() > self.config.max_payload_size {
            return Err(FrameError::PayloadTooLarge {
                size: packet.payload.len(),
                max: self.config.max_payload_size,
            });
        }

        self.buf.clear();
        encode_packet(packet, &mut self.buf)?;
        self.flush_buf()
    }

    /// Flush the underlying sink.
    pub fn flush(&mut self) -> Result<()> {
        loop {
            match self.inner.flush() {
                Ok(()) => return Ok(()),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
        }
    }

    /// Borrow the underlying sink.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Consume the writer and return the inner sink.
    pub fn into_inner(self) -> T {
        self.inner
    }

    fn flush_buf(&mut self) -> Result<()> {
        let mut offset = 0usize;
        while offset < self.buf.len() {
            match self.inner.write(&self.buf[offset..]) {
                Ok(0) => return Err(FrameError::SinkClosed),
                Ok(n) => offset += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
        }
        Ok(())
    }
}
