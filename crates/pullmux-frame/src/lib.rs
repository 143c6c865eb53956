//! Reference container format ("PMX") and a pullmux format engine for it.
//!
//! Every input starts with a header:
//! - A 2-byte magic number ("PM")
//! - A 1-byte version and a 1-byte stream count
//! - A 4-byte little-endian stream table length
//!
//! followed by the stream table and a sequence of framed packets. The table
//! may carry zero padding, so a sample can demand an arbitrary amount of
//! leading data before it is identifiable.
//!
//! [`FrameEngine`] parses this layout exclusively through a
//! [`ByteSource`](pullmux_queue::ByteSource), which makes it a stand-in for a
//! full container engine in tests, tools, and the C ABI.

pub mod codec;
pub mod codec_id;
pub mod engine;
pub mod error;
pub mod writer;

pub use codec::{
    decode_header, decode_packet, encode_header, encode_packet, ContainerHeader, FrameConfig,
    Packet, StreamEntry, DEFAULT_MAX_PAYLOAD, DEFAULT_MAX_TABLE, HEADER_SIZE, PACKET_HEADER_SIZE,
};
pub use codec_id::{codec_id_from_name, codec_name};
pub use engine::{FrameEngine, FrameHandle};
pub use error::{FrameError, Result};
pub use writer::ContainerWriter;
