use std::io::Read;

use tracing::trace;

use crate::queue::ByteQueue;

/// Outcome of a single [`ByteSource::pull`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pull {
    /// This many bytes were written to the front of the destination.
    Data(usize),
    /// Nothing is buffered right now. More bytes may arrive later, but the
    /// caller must not wait for them.
    EndOfData,
}

/// The single capability a format engine is given to obtain input bytes.
///
/// Implementations never block: an empty source answers
/// [`Pull::EndOfData`] immediately.
pub trait ByteSource {
    /// Copy at most `dst.len()` bytes into `dst`.
    fn pull(&mut self, dst: &mut [u8]) -> Pull;
}

/// Queue-backed [`ByteSource`] adapter.
///
/// Borrows the queue for the duration of one engine call, so an engine can
/// never outlive or retain the bytes it reads from.
#[derive(Debug)]
pub struct QueueSource<'q> {
    queue: &'q mut ByteQueue,
    pulled: usize,
}

impl<'q> QueueSource<'q> {
    /// Wrap a queue.
    pub fn new(queue: &'q mut ByteQueue) -> Self {
        Self { queue, pulled: 0 }
    }

    /// Total bytes handed out through this adapter.
    pub fn pulled(&self) -> usize {
        self.pulled
    }
}

impl ByteSource for QueueSource<'_> {
    fn pull(&mut self, dst: &mut [u8]) -> Pull {
        match self.queue.read(dst) {
            Some(count) => {
                self.pulled += count;
                trace!(count, requested = dst.len(), "pulled bytes from queue");
                Pull::Data(count)
            }
            None => {
                trace!(requested = dst.len(), "queue exhausted");
                Pull::EndOfData
            }
        }
    }
}

impl Read for QueueSource<'_> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        match self.pull(buf) {
            Pull::Data(count) => Ok(count),
            Pull::EndOfData => Ok(0),
        }
    }
}

impl ByteQueue {
    /// Borrow this queue as a [`ByteSource`].
    pub fn source(&mut self) -> QueueSource<'_> {
        QueueSource::new(self)
    }
}
