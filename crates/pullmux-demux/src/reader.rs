use pullmux_engine::{EngineError, FormatEngine, PacketRecord};
use pullmux_queue::ByteQueue;
use tracing::{debug, trace, warn};

use crate::error::DemuxError;

/// Result of one [`DemuxContext::read_packet`](crate::DemuxContext::read_packet) call.
#[derive(Debug, Clone, PartialEq)]
pub enum ReadOutcome {
    /// One demuxed unit, detached from the engine and the queue.
    Packet(PacketRecord),
    /// Feed this many more bytes before reading again.
    Demand(usize),
    /// The engine reached end of stream. Repeats on every later call.
    Eof,
    /// The read failed.
    Error(DemuxError),
}

impl ReadOutcome {
    pub fn is_eof(&self) -> bool {
        matches!(self, ReadOutcome::Eof)
    }
}

/// Pulls units from an open engine handle one at a time.
#[derive(Debug)]
pub(crate) struct PacketReader<H> {
    handle: Option<H>,
    eof: bool,
    closed: Option<DemuxError>,
    packets: u64,
}

impl<H> PacketReader<H> {
    pub(crate) fn new() -> Self {
        Self {
            handle: None,
            eof: false,
            closed: None,
            packets: 0,
        }
    }

    pub(crate) fn attach(&mut self, handle: H) {
        self.handle = Some(handle);
    }

    pub(crate) fn detach(&mut self) -> Option<H> {
        self.handle.take()
    }

    pub(crate) fn has_handle(&self) -> bool {
        self.handle.is_some()
    }

    pub(crate) fn is_eof(&self) -> bool {
        self.eof
    }

    pub(crate) fn packets(&self) -> u64 {
        self.packets
    }

    pub(crate) fn next<E>(
        &mut self,
        engine: &mut E,
        queue: &mut ByteQueue,
        end_of_input: bool,
    ) -> ReadOutcome
    where
        E: FormatEngine<Handle = H>,
    {
        if let Some(err) = &self.closed {
            return ReadOutcome::Error(err.clone());
        }
        if self.eof {
            return ReadOutcome::Eof;
        }
        let Some(handle) = self.handle.as_mut() else {
            return ReadOutcome::Error(DemuxError::Failed("no open engine handle".to_string()));
        };

        let free = queue.free_space();
        if free > 0 && !end_of_input {
            trace!(free, "read deferred until queue fills");
            return ReadOutcome::Demand(free);
        }

        let result = engine.read_frame(handle, &mut queue.source());
        match result {
            Ok(Some(record)) => {
                self.packets += 1;
                trace!(
                    stream = record.stream_index,
                    size = record.payload.len(),
                    "packet read"
                );
                ReadOutcome::Packet(record.detached())
            }
            Ok(None) => {
                debug!(packets = self.packets, "engine reached end of stream");
                self.eof = true;
                ReadOutcome::Eof
            }
            Err(EngineError::NeedMoreData) if !end_of_input => {
                ReadOutcome::Demand(queue.free_space().max(1))
            }
            Err(EngineError::NeedMoreData) => {
                warn!(packets = self.packets, "input ended inside a unit");
                self.eof = true;
                ReadOutcome::Error(DemuxError::ReadError(
                    "truncated unit at end of input".to_string(),
                ))
            }
            Err(EngineError::Corrupt(msg)) | Err(EngineError::Malformed(msg)) => {
                debug!(%msg, "unit could not be read");
                ReadOutcome::Error(DemuxError::ReadError(msg))
            }
            Err(EngineError::Closed(msg)) => {
                warn!(%msg, "engine closed its handle");
                let err = DemuxError::Failed(format!("engine closed: {msg}"));
                self.closed = Some(err.clone());
                ReadOutcome::Error(err)
            }
        }
    }
}
