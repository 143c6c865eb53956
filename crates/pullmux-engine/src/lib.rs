//! Contract between pullmux and a container format engine.
//!
//! The engine owns all knowledge of container byte layouts. pullmux only
//! hands it a [`ByteSource`](pullmux_queue::ByteSource) for the duration of
//! each call and receives owned [`StreamDescriptor`]s and [`PacketRecord`]s
//! back.

pub mod error;
pub mod traits;
pub mod types;

pub use error::{EngineError, Result};
pub use traits::{FormatEngine, ProbeLimits};
pub use types::{CodecParams, PacketRecord, StreamDescriptor, NO_TIMESTAMP};
