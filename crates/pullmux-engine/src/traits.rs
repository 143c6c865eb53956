use pullmux_queue::ByteSource;

use crate::error::Result;
use crate::types::{PacketRecord, StreamDescriptor};

/// Bounds applied to a single probe attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeLimits {
    /// Maximum number of bytes the engine may consume while opening.
    pub probe_size: usize,
}

/// A container format engine driven through a [`ByteSource`].
///
/// The source is lent for the duration of each call only. Engines keep any
/// partially consumed bytes in their own handle; the source discards what
/// it hands out once the format is known.
pub trait FormatEngine {
    /// Per-input engine state produced by a successful [`open`](Self::open).
    type Handle;

    /// Short engine or format name, used in diagnostics.
    fn name(&self) -> &str;

    /// Identify the format from the start of the source.
    ///
    /// Returns [`EngineError::NeedMoreData`](crate::EngineError::NeedMoreData)
    /// when the bytes available so far are not enough to decide.
    fn open(&mut self, source: &mut dyn ByteSource, limits: ProbeLimits) -> Result<Self::Handle>;

    /// Enumerate the streams of an opened input.
    fn find_streams(
        &mut self,
        handle: &mut Self::Handle,
        source: &mut dyn ByteSource,
    ) -> Result<Vec<StreamDescriptor>>;

    /// Extract the next unit. `Ok(None)` is end of stream.
    fn read_frame(
        &mut self,
        handle: &mut Self::Handle,
        source: &mut dyn ByteSource,
    ) -> Result<Option<PacketRecord>>;

    /// Release an opened handle.
    fn close(&mut self, handle: Self::Handle);
}
