use pullmux_engine::{EngineError, FormatEngine, ProbeLimits, StreamDescriptor};
use pullmux_queue::{ByteQueue, QueueError, QueueMode};
use tracing::{debug, warn};

use crate::error::{DemuxError, Result};

/// Header detection state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeState {
    /// Waiting for enough leading bytes to identify the format.
    Probing,
    /// Format identified and streams captured. Terminal.
    Ready,
    /// Probing failed fatally. Terminal.
    Failed,
}

impl ProbeState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProbeState::Probing => "probing",
            ProbeState::Ready => "ready",
            ProbeState::Failed => "failed",
        }
    }
}

/// Result of a successful probe: an open engine handle and detached streams.
#[derive(Debug)]
pub(crate) struct Probed<H> {
    pub(crate) handle: H,
    pub(crate) streams: Vec<StreamDescriptor>,
}

/// Drives an engine's open + stream discovery over the buffered prefix,
/// growing the queue after each attempt that ran out of data.
#[derive(Debug)]
pub struct HeaderProbe {
    state: ProbeState,
    attempts: u32,
    failure: Option<DemuxError>,
}

impl Default for HeaderProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl HeaderProbe {
    pub fn new() -> Self {
        Self {
            state: ProbeState::Probing,
            attempts: 0,
            failure: None,
        }
    }

    pub fn state(&self) -> ProbeState {
        self.state
    }

    pub fn is_ready(&self) -> bool {
        self.state == ProbeState::Ready
    }

    /// Number of attempts made so far.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// The fatal error, once probing has failed.
    pub fn failure(&self) -> Option<&DemuxError> {
        self.failure.as_ref()
    }

    /// Make one probe attempt.
    ///
    /// Every attempt rescans from the start of the buffered bytes with the
    /// queue capacity as probe size. `Ok(None)` means the engine needs more
    /// data and the caller should wait for the queue to refill.
    pub(crate) fn attempt<E: FormatEngine>(
        &mut self,
        engine: &mut E,
        queue: &mut ByteQueue,
        end_of_input: bool,
    ) -> Result<Option<Probed<E::Handle>>> {
        match self.state {
            ProbeState::Failed => {
                return Err(self
                    .failure
                    .clone()
                    .unwrap_or_else(|| DemuxError::Failed("probe failed".to_string())));
            }
            ProbeState::Ready => {
                return Err(DemuxError::Failed("header already probed".to_string()));
            }
            ProbeState::Probing => {}
        }

        self.attempts += 1;
        queue.rewind();
        let probe_size = queue.capacity();
        let saw_full_buffer = queue.is_filled();
        debug!(
            engine = engine.name(),
            attempt = self.attempts,
            probe_size,
            buffered = queue.len(),
            end_of_input,
            "probing header"
        );

        let opened = {
            let mut source = queue.source();
            match engine.open(&mut source, ProbeLimits { probe_size }) {
                Ok(mut handle) => match engine.find_streams(&mut handle, &mut source) {
                    Ok(streams) => Ok((handle, streams)),
                    Err(err) => {
                        engine.close(handle);
                        Err(err)
                    }
                },
                Err(err) => Err(err),
            }
        };

        match opened {
            Ok((handle, streams)) => {
                let streams: Vec<StreamDescriptor> =
                    streams.iter().map(StreamDescriptor::detached).collect();
                queue.compact();
                queue.set_mode(QueueMode::Shift);
                self.state = ProbeState::Ready;
                debug!(
                    engine = engine.name(),
                    attempt = self.attempts,
                    streams = streams.len(),
                    capacity = queue.capacity(),
                    "header ready, queue switched to shift mode"
                );
                Ok(Some(Probed { handle, streams }))
            }
            Err(EngineError::NeedMoreData) if end_of_input => Err(self.fail(
                DemuxError::MalformedInput(
                    "input ended before the header was complete".to_string(),
                ),
            )),
            Err(EngineError::NeedMoreData) => {
                if saw_full_buffer {
                    match queue.grow() {
                        Ok(capacity) => {
                            debug!(from = probe_size, to = capacity, "probe needs more data");
                        }
                        Err(QueueError::CapacityExceeded { max, .. }) => {
                            return Err(
                                self.fail(DemuxError::ProbeSizeExceeded { probe_size, max })
                            );
                        }
                        Err(err) => return Err(self.fail(err.into())),
                    }
                }
                Ok(None)
            }
            Err(EngineError::Malformed(msg)) | Err(EngineError::Corrupt(msg)) => {
                Err(self.fail(DemuxError::MalformedInput(msg)))
            }
            Err(EngineError::Closed(msg)) => Err(self.fail(DemuxError::Failed(msg))),
        }
    }

    /// Record a fatal failure. Later attempts return the same error.
    pub(crate) fn fail(&mut self, err: DemuxError) -> DemuxError {
        warn!(kind = err.kind().as_str(), %err, "header probe failed");
        self.state = ProbeState::Failed;
        self.failure = Some(err.clone());
        err
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockEngine;

    #[test]
    fn success_switches_queue_to_shift() {
        let mut engine = MockEngine::new(4);
        let mut queue = ByteQueue::new(8);
        queue.append(b"HDR!rest").unwrap();

        let mut probe = HeaderProbe::new();
        let probed = probe.attempt(&mut engine, &mut queue, false).unwrap().unwrap();
        assert_eq!(probed.streams.len(), 1);
        assert_eq!(probe.state(), ProbeState::Ready);
        assert_eq!(queue.mode(), QueueMode::Shift);
        assert_eq!(queue.read_offset(), 0);
        assert_eq!(queue.peek(), b"rest");
    }

    #[test]
    fn full_buffer_without_header_doubles_capacity() {
        let mut engine = MockEngine::new(12);
        let mut queue = ByteQueue::new(8);
        queue.append(&[0u8; 8]).unwrap();

        let mut probe = HeaderProbe::new();
        assert!(probe.attempt(&mut engine, &mut queue, false).unwrap().is_none());
        assert_eq!(queue.capacity(), 16);
        assert_eq!(queue.mode(), QueueMode::Grow);
        assert_eq!(queue.len(), 8);
        assert_eq!(probe.state(), ProbeState::Probing);
    }

    #[test]
    fn partial_buffer_does_not_grow() {
        let mut engine = MockEngine::new(12);
        let mut queue = ByteQueue::new(16);
        queue.append(&[0u8; 8]).unwrap();

        let mut probe = HeaderProbe::new();
        for _ in 0..3 {
            assert!(probe.attempt(&mut engine, &mut queue, false).unwrap().is_none());
        }
        assert_eq!(queue.capacity(), 16);
        assert_eq!(probe.attempts(), 3);
    }

    #[test]
    fn retry_rescans_from_start() {
        let mut engine = MockEngine::new(6);
        let mut queue = ByteQueue::new(4);
        queue.append(b"abcd").unwrap();

        let mut probe = HeaderProbe::new();
        assert!(probe.attempt(&mut engine, &mut queue, false).unwrap().is_none());
        queue.append(b"ef").unwrap();
        assert!(probe.attempt(&mut engine, &mut queue, false).unwrap().is_some());
        assert_eq!(engine.last_header(), b"abcdef");
    }

    #[test]
    fn ceiling_is_fatal_and_sticky() {
        let mut engine = MockEngine::new(64);
        let mut queue = ByteQueue::with_limit(8, Some(16)).unwrap();
        queue.append(&[0u8; 8]).unwrap();

        let mut probe = HeaderProbe::new();
        assert!(probe.attempt(&mut engine, &mut queue, false).unwrap().is_none());
        queue.append(&[0u8; 8]).unwrap();
        let err = probe.attempt(&mut engine, &mut queue, false).unwrap_err();
        assert_eq!(
            err,
            DemuxError::ProbeSizeExceeded {
                probe_size: 16,
                max: 16
            }
        );
        assert_eq!(probe.state(), ProbeState::Failed);

        let opens = engine.open_calls();
        assert_eq!(probe.attempt(&mut engine, &mut queue, false).unwrap_err(), err);
        assert_eq!(engine.open_calls(), opens);
    }

    #[test]
    fn end_of_input_turns_shortfall_into_malformed() {
        let mut engine = MockEngine::new(12);
        let mut queue = ByteQueue::new(16);
        queue.append(&[0u8; 5]).unwrap();

        let mut probe = HeaderProbe::new();
        let err = probe.attempt(&mut engine, &mut queue, true).unwrap_err();
        assert!(matches!(err, DemuxError::MalformedInput(msg) if msg.contains("input ended")));
    }

    #[test]
    fn malformed_is_fatal_without_growth() {
        let mut engine = MockEngine::new(4).with_open_error(EngineError::Malformed("nope".into()));
        let mut queue = ByteQueue::new(8);
        queue.append(&[0u8; 8]).unwrap();

        let mut probe = HeaderProbe::new();
        let err = probe.attempt(&mut engine, &mut queue, false).unwrap_err();
        assert_eq!(err, DemuxError::MalformedInput("nope".into()));
        assert_eq!(queue.capacity(), 8);
    }

    #[test]
    fn codec_params_are_detached() {
        let mut engine = MockEngine::new(2);
        let mut queue = ByteQueue::new(4);
        queue.append(b"HDxx").unwrap();

        let mut probe = HeaderProbe::new();
        let probed = probe.attempt(&mut engine, &mut queue, false).unwrap().unwrap();
        engine.close(probed.handle);
        assert_eq!(probed.streams[0].codec_params.as_bytes(), b"cfg");
    }
}
