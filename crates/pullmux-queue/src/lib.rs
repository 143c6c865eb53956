//! Growable, compacting byte queue for push-to-pull adaptation.
//!
//! Producers push arbitrary-sized chunks into a [`ByteQueue`]; a format
//! engine pulls them back out through the [`ByteSource`] capability. The
//! queue has two modes:
//! - [`QueueMode::Grow`] keeps every byte seen so far so header probing can
//!   rescan from the start.
//! - [`QueueMode::Shift`] discards bytes as soon as they are read, bounding
//!   memory to one working buffer once the format is known.
//!
//! This is the lowest layer of pullmux. Everything else builds on top of it.

pub mod error;
pub mod queue;
pub mod source;

pub use error::{QueueError, Result};
pub use queue::{ByteQueue, QueueMode, DEFAULT_INITIAL_CAPACITY};
pub use source::{ByteSource, Pull, QueueSource};
