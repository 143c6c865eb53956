/// Errors that can occur in byte queue operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueueError {
    /// Growing the queue would exceed the configured ceiling.
    #[error("queue capacity exceeded ({requested} bytes requested, max {max})")]
    CapacityExceeded { requested: usize, max: usize },

    /// The requested capacity configuration is unusable.
    #[error("invalid queue capacity: {0}")]
    InvalidCapacity(String),
}

pub type Result<T> = std::result::Result<T, QueueError>;
