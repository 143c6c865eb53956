use bytes::{Buf, BytesMut};
use tracing::{debug, warn};

use crate::error::{QueueError, Result};

/// Default initial capacity: 48 000 bytes.
pub const DEFAULT_INITIAL_CAPACITY: usize = 48_000;

/// How the queue treats bytes once they have been read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueMode {
    /// Keep the full byte history; reads never discard.
    Grow,
    /// Discard read bytes immediately (compact after every read).
    Shift,
}

/// A growable byte buffer with independent read and write cursors.
///
/// Cursor invariant: `0 <= read_offset <= write_offset <= capacity`.
/// `capacity` is the logical buffer size used for demand and probe-size
/// accounting; it never decreases.
#[derive(Debug)]
pub struct ByteQueue {
    // Holds exactly the bytes in [0, write_offset).
    buf: BytesMut,
    read_offset: usize,
    capacity: usize,
    max_capacity: Option<usize>,
    mode: QueueMode,
}

impl ByteQueue {
    /// Create an empty queue in [`QueueMode::Grow`] with no growth ceiling.
    pub fn new(initial_capacity: usize) -> Self {
        let initial_capacity = initial_capacity.max(1);
        Self {
            buf: BytesMut::with_capacity(initial_capacity),
            read_offset: 0,
            capacity: initial_capacity,
            max_capacity: None,
            mode: QueueMode::Grow,
        }
    }

    /// Create an empty queue whose capacity may never exceed `max_capacity`.
    pub fn with_limit(initial_capacity: usize, max_capacity: Option<usize>) -> Result<Self> {
        if initial_capacity == 0 {
            return Err(QueueError::InvalidCapacity(
                "initial capacity must be greater than zero".to_string(),
            ));
        }
        if let Some(max) = max_capacity {
            if max < initial_capacity {
                return Err(QueueError::InvalidCapacity(format!(
                    "max capacity {max} is below initial capacity {initial_capacity}"
                )));
            }
        }

        Ok(Self::new(initial_capacity).with_ceiling(max_capacity))
    }

    /// Set the growth ceiling. A ceiling below the current capacity is
    /// raised to it, so this never fails.
    pub fn with_ceiling(mut self, max_capacity: Option<usize>) -> Self {
        self.max_capacity = max_capacity.map(|max| max.max(self.capacity));
        self
    }

    /// Append a chunk at the write cursor.
    ///
    /// If the chunk does not fit, capacity grows to twice its current size,
    /// or to exactly what is needed when doubling is not enough. Existing
    /// bytes are preserved. Fails only when the configured ceiling would be
    /// exceeded.
    pub fn append(&mut self, data: &[u8]) -> Result<()> {
        if data.is_empty() {
            return Ok(());
        }

        if self.free_space() < data.len() {
            let needed = self.len().saturating_add(data.len());
            let mut target = self.capacity.saturating_mul(2).max(needed);
            if let Some(max) = self.max_capacity {
                if needed > max {
                    return Err(QueueError::CapacityExceeded {
                        requested: needed,
                        max,
                    });
                }
                target = target.min(max);
            }
            debug!(
                from = self.capacity,
                to = target,
                chunk = data.len(),
                "growing queue to fit chunk"
            );
            self.resize(target);
        }

        self.buf.extend_from_slice(data);
        Ok(())
    }

    /// Double the capacity (clamped to the ceiling) and return the new value.
    ///
    /// Fails with [`QueueError::CapacityExceeded`] when the queue is already
    /// at its ceiling.
    pub fn grow(&mut self) -> Result<usize> {
        let doubled = self.capacity.saturating_mul(2);
        let target = match self.max_capacity {
            Some(max) if self.capacity >= max => {
                return Err(QueueError::CapacityExceeded {
                    requested: doubled,
                    max,
                });
            }
            Some(max) => doubled.min(max),
            None => doubled,
        };

        debug!(from = self.capacity, to = target, "doubling queue capacity");
        self.resize(target);
        Ok(target)
    }

    /// Copy up to `dst.len()` unread bytes into `dst`.
    ///
    /// Returns `None` when no unread bytes remain. In [`QueueMode::Shift`]
    /// the consumed bytes are discarded before returning.
    pub fn read(&mut self, dst: &mut [u8]) -> Option<usize> {
        let unread = self.unread();
        if unread == 0 {
            return None;
        }

        let count = dst.len().min(unread);
        let start = self.read_offset;
        dst[..count].copy_from_slice(&self.buf[start..start + count]);
        self.read_offset += count;

        if self.mode == QueueMode::Shift {
            self.compact();
        }

        Some(count)
    }

    /// Move the unread bytes to offset 0. Never shrinks capacity.
    pub fn compact(&mut self) {
        if self.read_offset == 0 {
            return;
        }
        self.buf.advance(self.read_offset);
        self.read_offset = 0;
    }

    /// Reset the read cursor to the start of the buffered bytes.
    pub fn rewind(&mut self) {
        self.read_offset = 0;
    }

    /// Switch operating mode. The only permitted transition is Grow -> Shift.
    pub fn set_mode(&mut self, mode: QueueMode) {
        if self.mode == QueueMode::Shift && mode == QueueMode::Grow {
            warn!("ignoring queue mode change from shift back to grow");
            return;
        }
        self.mode = mode;
    }

    /// Current operating mode.
    pub fn mode(&self) -> QueueMode {
        self.mode
    }

    /// Bytes that can be appended before the queue is filled.
    pub fn free_space(&self) -> usize {
        self.capacity - self.len()
    }

    /// True when the write cursor has reached capacity.
    pub fn is_filled(&self) -> bool {
        self.len() == self.capacity
    }

    /// Buffered bytes not yet read.
    pub fn unread(&self) -> usize {
        self.len() - self.read_offset
    }

    /// Position of the write cursor (total buffered bytes, read or not).
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// True when nothing is buffered.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Position of the read cursor.
    pub fn read_offset(&self) -> usize {
        self.read_offset
    }

    /// Logical capacity.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Configured growth ceiling, if any.
    pub fn max_capacity(&self) -> Option<usize> {
        self.max_capacity
    }

    /// The unread bytes, without consuming them.
    pub fn peek(&self) -> &[u8] {
        &self.buf[self.read_offset..]
    }

    fn resize(&mut self, target: usize) {
        self.buf.reserve(target - self.buf.len());
        self.capacity = target;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_cursors(q: &ByteQueue) {
        assert!(q.read_offset() <= q.len());
        assert!(q.len() <= q.capacity());
    }

    #[test]
    fn new_queue_is_empty_and_growing() {
        let q = ByteQueue::new(16);
        assert_eq!(q.capacity(), 16);
        assert_eq!(q.free_space(), 16);
        assert_eq!(q.mode(), QueueMode::Grow);
        assert!(q.is_empty());
        assert!(!q.is_filled());
    }

    #[test]
    fn append_then_read() {
        let mut q = ByteQueue::new(16);
        q.append(b"hello").unwrap();

        let mut dst = [0u8; 3];
        assert_eq!(q.read(&mut dst), Some(3));
        assert_eq!(&dst, b"hel");
        assert_eq!(q.read_offset(), 3);
        assert_eq!(q.unread(), 2);
        assert_cursors(&q);
    }

    #[test]
    fn read_on_empty_queue_is_exhausted() {
        let mut q = ByteQueue::new(8);
        let mut dst = [0u8; 4];
        assert_eq!(q.read(&mut dst), None);
    }

    #[test]
    fn read_after_drain_is_exhausted() {
        let mut q = ByteQueue::new(8);
        q.append(b"ab").unwrap();
        let mut dst = [0u8; 8];
        assert_eq!(q.read(&mut dst), Some(2));
        assert_eq!(q.read(&mut dst), None);
    }

    #[test]
    fn grow_mode_keeps_history_for_rewind() {
        let mut q = ByteQueue::new(8);
        q.append(b"abcdef").unwrap();

        let mut dst = [0u8; 4];
        q.read(&mut dst).unwrap();
        assert_eq!(q.len(), 6);

        q.rewind();
        let mut again = [0u8; 6];
        assert_eq!(q.read(&mut again), Some(6));
        assert_eq!(&again, b"abcdef");
    }

    #[test]
    fn shift_mode_compacts_after_each_read() {
        let mut q = ByteQueue::new(8);
        q.append(b"abcdef").unwrap();
        q.set_mode(QueueMode::Shift);

        let mut dst = [0u8; 4];
        assert_eq!(q.read(&mut dst), Some(4));
        assert_eq!(q.read_offset(), 0);
        assert_eq!(q.len(), 2);
        assert_eq!(q.peek(), b"ef");
        assert_eq!(q.free_space(), 6);
        assert_cursors(&q);
    }

    #[test]
    fn compact_moves_unread_to_front_without_shrinking() {
        let mut q = ByteQueue::new(8);
        q.append(b"12345678").unwrap();
        let mut dst = [0u8; 5];
        q.read(&mut dst).unwrap();

        q.compact();
        assert_eq!(q.read_offset(), 0);
        assert_eq!(q.len(), 3);
        assert_eq!(q.peek(), b"678");
        assert_eq!(q.capacity(), 8);
    }

    #[test]
    fn append_overflow_doubles_capacity() {
        let mut q = ByteQueue::new(8);
        q.append(b"123456").unwrap();
        q.append(b"789").unwrap();
        assert_eq!(q.capacity(), 16);
        assert_eq!(q.peek(), b"123456789");
    }

    #[test]
    fn append_overflow_grows_to_fit_large_chunk() {
        let mut q = ByteQueue::new(4);
        q.append(&[7u8; 20]).unwrap();
        assert_eq!(q.capacity(), 20);
        assert!(q.is_filled());
    }

    #[test]
    fn append_respects_ceiling() {
        let mut q = ByteQueue::with_limit(4, Some(10)).unwrap();
        q.append(b"1234").unwrap();
        q.append(b"5678").unwrap();
        assert_eq!(q.capacity(), 8);

        q.append(b"9").unwrap();
        assert_eq!(q.capacity(), 10);

        let err = q.append(b"abc").unwrap_err();
        assert_eq!(
            err,
            QueueError::CapacityExceeded {
                requested: 12,
                max: 10
            }
        );
        assert_eq!(q.len(), 9);
    }

    #[test]
    fn ceiling_never_sits_below_capacity() {
        let q = ByteQueue::new(16).with_ceiling(Some(4));
        assert_eq!(q.max_capacity(), Some(16));
        assert_eq!(ByteQueue::new(16).with_ceiling(None).max_capacity(), None);
    }

    #[test]
    fn grow_doubles_and_clamps_to_ceiling() {
        let mut q = ByteQueue::with_limit(4, Some(12)).unwrap();
        assert_eq!(q.grow().unwrap(), 8);
        assert_eq!(q.grow().unwrap(), 12);
        assert!(matches!(
            q.grow(),
            Err(QueueError::CapacityExceeded { max: 12, .. })
        ));
        assert_eq!(q.capacity(), 12);
    }

    #[test]
    fn grow_preserves_buffered_bytes() {
        let mut q = ByteQueue::new(4);
        q.append(b"abcd").unwrap();
        q.grow().unwrap();
        assert_eq!(q.peek(), b"abcd");
        assert_eq!(q.free_space(), 4);
    }

    #[test]
    fn shift_mode_is_one_way() {
        let mut q = ByteQueue::new(4);
        q.set_mode(QueueMode::Shift);
        q.set_mode(QueueMode::Grow);
        assert_eq!(q.mode(), QueueMode::Shift);
    }

    #[test]
    fn invalid_limits_are_rejected() {
        assert!(ByteQueue::with_limit(0, None).is_err());
        assert!(ByteQueue::with_limit(16, Some(8)).is_err());
        assert!(ByteQueue::with_limit(16, Some(16)).is_ok());
    }

    #[test]
    fn cursors_hold_across_mixed_operations() {
        let mut q = ByteQueue::new(3);
        let mut dst = [0u8; 2];
        for round in 0..50u8 {
            q.append(&[round; 5]).unwrap();
            assert_cursors(&q);
            q.read(&mut dst);
            assert_cursors(&q);
            if round == 25 {
                q.set_mode(QueueMode::Shift);
            }
            if round % 7 == 0 {
                q.compact();
                assert_cursors(&q);
            }
        }
    }
}
