/// Failures reported by a format engine.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    /// The source ran dry before the engine could finish. During probing
    /// this means the format cannot be identified from the bytes so far.
    #[error("not enough data")]
    NeedMoreData,

    /// The input is structurally invalid regardless of how much is supplied.
    #[error("malformed input: {0}")]
    Malformed(String),

    /// A single unit could not be extracted; later units may still be fine.
    #[error("corrupt unit: {0}")]
    Corrupt(String),

    /// The engine handle is permanently unusable.
    #[error("engine closed: {0}")]
    Closed(String),
}

impl EngineError {
    /// True when supplying more bytes could make the same call succeed.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, EngineError::NeedMoreData)
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
