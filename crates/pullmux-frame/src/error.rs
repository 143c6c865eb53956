/// Errors that can occur while encoding or decoding PMX data.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The container header does not start with "PM".
    #[error("invalid container magic (expected 0x504D \"PM\")")]
    InvalidMagic,

    /// The container declares a version this decoder does not understand.
    #[error("unsupported container version {0}")]
    UnsupportedVersion(u8),

    /// The stream table exceeds the configured maximum size.
    #[error("stream table too large ({size} bytes, max {max})")]
    TableTooLarge { size: usize, max: usize },

    /// The stream table is structurally inconsistent.
    #[error("malformed stream table: {0}")]
    MalformedTable(String),

    /// A packet does not start with "PK".
    #[error("invalid packet magic (expected 0x504B \"PK\")")]
    InvalidPacketMagic,

    /// The payload exceeds the configured maximum size.
    #[error("payload too large ({size} bytes, max {max})")]
    PayloadTooLarge { size: usize, max: usize },

    /// A packet refers to a stream the header did not declare.
    #[error("packet for undeclared stream {0}")]
    UnknownStream(u16),

    /// An I/O error occurred while writing.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The writer's sink stopped accepting bytes.
    #[error("sink closed (incomplete write)")]
    SinkClosed,
}

pub type Result<T> = std::result::Result<T, FrameError>;
