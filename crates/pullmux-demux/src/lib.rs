//! Push-to-pull demux core.
//!
//! A [`DemuxContext`] accepts input as arbitrary-sized chunks and drives a
//! pull-style [`FormatEngine`](pullmux_engine::FormatEngine) over them:
//!
//! - While the format is unknown the queue keeps every byte, and a probe is
//!   retried with a doubled probe size each time a full buffer was not enough.
//! - Once the header is known the queue discards bytes as the engine
//!   consumes them, and packets are read one at a time.
//! - When the engine cannot make progress, the caller is told how many more
//!   bytes to supply instead of being blocked.

pub mod config;
pub mod context;
pub mod error;
pub mod probe;
pub mod reader;

#[cfg(test)]
mod testing;

pub use config::{DemuxConfig, DEFAULT_MAX_CAPACITY, INITIAL_CAPACITY_ENV, MAX_PROBE_SIZE_ENV};
pub use context::DemuxContext;
pub use error::{DemuxError, ErrorKind, Result};
pub use probe::{HeaderProbe, ProbeState};
pub use reader::ReadOutcome;
