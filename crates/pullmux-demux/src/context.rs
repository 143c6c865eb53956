use std::fmt;

use pullmux_engine::{FormatEngine, StreamDescriptor};
use pullmux_queue::{ByteQueue, QueueError, DEFAULT_INITIAL_CAPACITY};
use tracing::{debug, trace};

use crate::config::{DemuxConfig, DEFAULT_MAX_CAPACITY};
use crate::error::{DemuxError, Result};
use crate::probe::{HeaderProbe, ProbeState, Probed};
use crate::reader::{PacketReader, ReadOutcome};

/// Adapts pushed byte chunks to a pull-driven [`FormatEngine`].
///
/// The context owns the queue, the probe and reader state, and (once the
/// header is known) the engine handle. Teardown closes the engine handle
/// first, then drops reader state, then the queue buffer. This happens in
/// [`destroy`](Self::destroy) or, failing that, on drop.
///
/// A context is driven by a single caller; no call blocks. When the core
/// cannot make progress it answers with a demand for more bytes.
pub struct DemuxContext<E: FormatEngine> {
    // Field order is drop order: reader state, then streams, then queue.
    reader: PacketReader<E::Handle>,
    streams: Vec<StreamDescriptor>,
    queue: ByteQueue,
    probe: HeaderProbe,
    end_of_input: bool,
    engine: E,
}

impl<E: FormatEngine> DemuxContext<E> {
    /// Create a context with the default configuration: a
    /// [`DEFAULT_INITIAL_CAPACITY`] buffer growing to at most
    /// [`DEFAULT_MAX_CAPACITY`].
    pub fn new(engine: E) -> Self {
        let queue =
            ByteQueue::new(DEFAULT_INITIAL_CAPACITY).with_ceiling(Some(DEFAULT_MAX_CAPACITY));
        Self::from_queue(engine, queue)
    }

    /// Create a context with explicit buffer sizing.
    pub fn with_config(engine: E, config: DemuxConfig) -> Result<Self> {
        config.validate()?;
        let queue = ByteQueue::with_limit(config.initial_capacity, config.max_capacity)?;
        Ok(Self::from_queue(engine, queue))
    }

    fn from_queue(engine: E, queue: ByteQueue) -> Self {
        debug!(
            engine = engine.name(),
            capacity = queue.capacity(),
            max_capacity = ?queue.max_capacity(),
            "demux context created"
        );
        Self {
            reader: PacketReader::new(),
            streams: Vec::new(),
            queue,
            probe: HeaderProbe::new(),
            end_of_input: false,
            engine,
        }
    }

    /// Buffer a chunk of input.
    ///
    /// While the header is unknown, a probe runs as soon as the buffered
    /// bytes reach the probe size. An empty chunk is a no-op.
    pub fn add_chunk(&mut self, data: &[u8]) -> Result<()> {
        if let Some(err) = self.probe.failure() {
            return Err(err.clone());
        }
        if data.is_empty() {
            return Ok(());
        }
        if self.end_of_input {
            return Err(DemuxError::Failed(
                "chunk added after end of input".to_string(),
            ));
        }

        let probe_size = self.queue.capacity();
        if let Err(err) = self.queue.append(data) {
            return Err(self.append_failed(err));
        }
        trace!(
            len = data.len(),
            buffered = self.queue.len(),
            capacity = self.queue.capacity(),
            "chunk buffered"
        );

        if !self.is_ready() && self.queue.len() >= probe_size {
            self.try_probe()?;
        }
        Ok(())
    }

    /// Signal that no more chunks will arrive.
    pub fn add_end_of_input(&mut self) {
        if !self.end_of_input {
            debug!(buffered = self.queue.len(), "end of input");
        }
        self.end_of_input = true;
    }

    /// True once the header has been identified.
    pub fn is_ready(&self) -> bool {
        self.probe.is_ready()
    }

    /// Bytes the context wants before it can make progress. 0 after end of
    /// input or a fatal probe failure.
    pub fn demand(&self) -> usize {
        if self.end_of_input || self.probe.state() == ProbeState::Failed || self.reader.is_eof() {
            return 0;
        }
        self.queue.free_space()
    }

    /// Streams discovered by the probe, in engine order with engine indices.
    ///
    /// Runs a probe first if the header is not known yet and input is
    /// buffered.
    pub fn streams(&mut self) -> Result<&[StreamDescriptor]> {
        if !self.is_ready() {
            if let Some(err) = self.probe.failure() {
                return Err(err.clone());
            }
            if self.queue.is_empty() && !self.end_of_input {
                return Err(DemuxError::NotReady {
                    demand: self.demand(),
                });
            }
            if !self.try_probe()? {
                return Err(DemuxError::NotReady {
                    demand: self.demand(),
                });
            }
        }
        Ok(&self.streams)
    }

    /// Read the next unit, or report what is needed first.
    ///
    /// Before the header is known this only probes once the buffer is full
    /// or input has ended; otherwise it answers with the free space.
    pub fn read_packet(&mut self) -> ReadOutcome {
        if !self.is_ready() {
            if let Some(err) = self.probe.failure() {
                return ReadOutcome::Error(err.clone());
            }
            // Probes run when the buffer fills or input ends, never per poll.
            if !self.end_of_input && !self.queue.is_filled() {
                return ReadOutcome::Demand(self.queue.free_space());
            }
            match self.try_probe() {
                Ok(true) => {}
                Ok(false) => return ReadOutcome::Demand(self.queue.free_space().max(1)),
                Err(err) => return ReadOutcome::Error(err),
            }
        }

        self.reader
            .next(&mut self.engine, &mut self.queue, self.end_of_input)
    }

    /// Release every owned resource.
    pub fn destroy(mut self) {
        self.release();
    }

    /// Current probe state.
    pub fn state(&self) -> ProbeState {
        self.probe.state()
    }

    /// Logical queue capacity, which is the probe size.
    pub fn capacity(&self) -> usize {
        self.queue.capacity()
    }

    /// Bytes currently held in the queue.
    pub fn buffered(&self) -> usize {
        self.queue.len()
    }

    pub fn probe_attempts(&self) -> u32 {
        self.probe.attempts()
    }

    pub fn packets_read(&self) -> u64 {
        self.reader.packets()
    }

    pub fn is_end_of_input(&self) -> bool {
        self.end_of_input
    }

    pub fn queue(&self) -> &ByteQueue {
        &self.queue
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Name reported by the engine.
    pub fn format_name(&self) -> &str {
        self.engine.name()
    }

    fn try_probe(&mut self) -> Result<bool> {
        match self
            .probe
            .attempt(&mut self.engine, &mut self.queue, self.end_of_input)?
        {
            Some(Probed { handle, streams }) => {
                self.streams = streams;
                self.reader.attach(handle);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn append_failed(&mut self, err: QueueError) -> DemuxError {
        match err {
            QueueError::CapacityExceeded { requested, max } if !self.is_ready() => {
                self.probe.fail(DemuxError::ProbeSizeExceeded {
                    probe_size: requested,
                    max,
                })
            }
            other => other.into(),
        }
    }

    fn release(&mut self) {
        if let Some(handle) = self.reader.detach() {
            debug!(engine = self.engine.name(), "closing engine handle");
            self.engine.close(handle);
        }
        self.streams.clear();
    }
}

impl<E: FormatEngine> fmt::Debug for DemuxContext<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DemuxContext")
            .field("engine", &self.engine.name())
            .field("state", &self.probe.state())
            .field("queue", &self.queue)
            .field("streams", &self.streams)
            .field("end_of_input", &self.end_of_input)
            .finish_non_exhaustive()
    }
}

impl<E: FormatEngine> Drop for DemuxContext<E> {
    fn drop(&mut self) {
        let had_handle = self.reader.has_handle();
        self.release();
        trace!(had_handle, "demux context released");
    }
}
