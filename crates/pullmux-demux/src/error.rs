use pullmux_queue::QueueError;

/// Stable classification of a [`DemuxError`], for callers that branch on
/// the failure rather than print it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    ProbeSizeExceeded,
    MalformedInput,
    ReadError,
    NotReady,
    Failed,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::ProbeSizeExceeded => "probe_size_exceeded",
            ErrorKind::MalformedInput => "malformed_input",
            ErrorKind::ReadError => "read_error",
            ErrorKind::NotReady => "not_ready",
            ErrorKind::Failed => "failed",
        }
    }
}

/// Errors surfaced by a demux context.
///
/// Insufficient data while probing is never an error; it shows up as
/// `is_ready() == false` with a positive demand.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DemuxError {
    /// The header could not be identified within the configured ceiling.
    #[error("probe size exceeded: header not found within {max} bytes")]
    ProbeSizeExceeded { probe_size: usize, max: usize },

    /// The input is structurally invalid.
    #[error("malformed input: {0}")]
    MalformedInput(String),

    /// A single unit could not be read; the context stays usable.
    #[error("read error: {0}")]
    ReadError(String),

    /// Stream metadata was requested before any input arrived.
    #[error("header not ready, {demand} more bytes wanted")]
    NotReady { demand: usize },

    /// The engine closed itself or the context can no longer make progress.
    #[error("demux failed: {0}")]
    Failed(String),

    /// Buffer error.
    #[error("queue error: {0}")]
    Queue(#[from] QueueError),
}

impl DemuxError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DemuxError::ProbeSizeExceeded { .. } => ErrorKind::ProbeSizeExceeded,
            DemuxError::MalformedInput(_) => ErrorKind::MalformedInput,
            DemuxError::ReadError(_) => ErrorKind::ReadError,
            DemuxError::NotReady { .. } => ErrorKind::NotReady,
            DemuxError::Failed(_) => ErrorKind::Failed,
            DemuxError::Queue(QueueError::CapacityExceeded { .. }) => {
                ErrorKind::ProbeSizeExceeded
            }
            DemuxError::Queue(_) => ErrorKind::Failed,
        }
    }
}

pub type Result<T> = std::result::Result<T, DemuxError>;
