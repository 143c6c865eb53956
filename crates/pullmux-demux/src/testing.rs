use std::cell::Cell;
use std::collections::VecDeque;
use std::rc::Rc;

use bytes::Bytes;
use pullmux_engine::{
    CodecParams, EngineError, FormatEngine, PacketRecord, ProbeLimits, StreamDescriptor,
};
use pullmux_queue::{ByteSource, Pull};

/// Scripted engine: the "header" is the first `header_len` bytes of input,
/// and reads replay a fixed list of results.
pub(crate) struct MockEngine {
    header_len: usize,
    open_error: Option<EngineError>,
    streams: Vec<StreamDescriptor>,
    reads: VecDeque<pullmux_engine::Result<Option<PacketRecord>>>,
    open_calls: usize,
    read_calls: usize,
    closes: Rc<Cell<usize>>,
    last_header: Vec<u8>,
}

#[derive(Debug)]
pub(crate) struct MockHandle;

impl MockEngine {
    pub(crate) fn new(header_len: usize) -> Self {
        Self {
            header_len,
            open_error: None,
            streams: vec![StreamDescriptor {
                index: 3,
                codec_id: 1,
                codec_name: "mock".to_string(),
                codec_params: CodecParams::new(Bytes::from_static(b"cfg")),
            }],
            reads: VecDeque::new(),
            open_calls: 0,
            read_calls: 0,
            closes: Rc::new(Cell::new(0)),
            last_header: Vec::new(),
        }
    }

    pub(crate) fn with_open_error(mut self, err: EngineError) -> Self {
        self.open_error = Some(err);
        self
    }

    pub(crate) fn with_reads(
        mut self,
        reads: impl IntoIterator<Item = pullmux_engine::Result<Option<PacketRecord>>>,
    ) -> Self {
        self.reads = reads.into_iter().collect();
        self
    }

    pub(crate) fn open_calls(&self) -> usize {
        self.open_calls
    }

    pub(crate) fn read_calls(&self) -> usize {
        self.read_calls
    }

    pub(crate) fn close_counter(&self) -> Rc<Cell<usize>> {
        Rc::clone(&self.closes)
    }

    pub(crate) fn last_header(&self) -> &[u8] {
        &self.last_header
    }
}

pub(crate) fn record(stream_index: u32, pts: i64, payload: &'static [u8]) -> PacketRecord {
    PacketRecord {
        stream_index,
        pts,
        dts: pts,
        duration: 1,
        payload: Bytes::from_static(payload),
    }
}

impl FormatEngine for MockEngine {
    type Handle = MockHandle;

    fn name(&self) -> &str {
        "mock"
    }

    fn open(
        &mut self,
        source: &mut dyn ByteSource,
        limits: ProbeLimits,
    ) -> pullmux_engine::Result<MockHandle> {
        self.open_calls += 1;
        if let Some(err) = self.open_error.clone() {
            return Err(err);
        }

        let want = self.header_len.min(limits.probe_size);
        let mut header = vec![0u8; want];
        let mut filled = 0;
        while filled < want {
            match source.pull(&mut header[filled..]) {
                Pull::Data(count) => filled += count,
                Pull::EndOfData => return Err(EngineError::NeedMoreData),
            }
        }
        if want < self.header_len {
            return Err(EngineError::NeedMoreData);
        }

        self.last_header = header;
        Ok(MockHandle)
    }

    fn find_streams(
        &mut self,
        _handle: &mut MockHandle,
        _source: &mut dyn ByteSource,
    ) -> pullmux_engine::Result<Vec<StreamDescriptor>> {
        Ok(self.streams.clone())
    }

    fn read_frame(
        &mut self,
        _handle: &mut MockHandle,
        _source: &mut dyn ByteSource,
    ) -> pullmux_engine::Result<Option<PacketRecord>> {
        self.read_calls += 1;
        self.reads.pop_front().unwrap_or(Ok(None))
    }

    fn close(&mut self, _handle: MockHandle) {
        self.closes.set(self.closes.get() + 1);
    }
}
