use thiserror::Error;

/// Top-level error type for aipm.
#[derive(Debug, Error)]
pub enum AipmError {
    /// Error from a text-completion provider (transport, status, timeout).
    #[error("provider error: {0}")]
    Provider(String),

    /// Error talking to the issue tracker.
    #[error("tracker error: {0}")]
    Tracker(String),

    /// Configuration error.
    #[error("config error: {0}")]
    Config(String),

    /// Memory/storage error.
    #[error("memory error: {0}")]
    Memory(String),

    /// The provider answered, but not with the structure we asked for.
    #[error("malformed provider response: {0}")]
    MalformedResponse(String),

    /// Explicit task creation with an id that is already taken.
    #[error("duplicate identifier: task {0} already exists")]
    DuplicateId(u64),

    /// Input that violates a local invariant (e.g. empty task description).
    #[error("invalid input: {0}")]
    Invalid(String),

    /// I/O error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
