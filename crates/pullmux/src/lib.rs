//! Push-to-pull container demuxing with backpressure.
//!
//! pullmux accepts input as arbitrary chunks pushed by a producer and drives
//! a pull-style container engine over them, reporting how many more bytes
//! it needs instead of blocking.
//!
//! # Crate Structure
//!
//! - [`queue`]: Growable byte queue and the `ByteSource` pull capability
//! - [`engine`]: The contract a container format engine implements
//! - [`frame`]: The PMX reference container and its engine
//! - [`demux`]: Header probing, packet reading, and context lifecycle

/// Re-export queue types.
pub mod queue {
    pub use pullmux_queue::*;
}

/// Re-export engine contract types.
pub mod engine {
    pub use pullmux_engine::*;
}

/// Re-export reference container types.
pub mod frame {
    pub use pullmux_frame::*;
}

/// Re-export demux types.
pub mod demux {
    pub use pullmux_demux::*;
}

pub use pullmux_demux::{DemuxConfig, DemuxContext, DemuxError, ReadOutcome};
