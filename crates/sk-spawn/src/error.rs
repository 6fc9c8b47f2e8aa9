use sk_core::CoreError;

/// Alias for `Result<T, SpawnError>`.
pub type SpawnResult<T> = Result<T, SpawnError>;

/// Errors raised by the spawn engine.
#[derive(Debug, thiserror::Error)]
pub enum SpawnError {
    /// No area with this name exists.
    #[error("unknown area: {0}")]
    UnknownArea(String),

    /// An area with this name already exists.
    #[error("area already exists: {0}")]
    DuplicateArea(String),

    /// A core definition failed validation.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Reading or writing the store failed.
    #[error("store I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The store or catalog is not valid JSON.
    #[error("store format error: {0}")]
    Json(#[from] serde_json::Error),
}
