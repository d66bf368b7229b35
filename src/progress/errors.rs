use thiserror::Error;

/// Errors that can arise while loading content or persisting progress.
#[derive(Debug, Error)]
pub enum ProgressError {
    /// Wrapper around sled's error type.
    #[error("sled error: {0}")]
    Sled(#[from] sled::Error),

    /// Wrapper around JSON serialization and deserialization errors.
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// Wrapper around IO errors (directory creation, content files, etc.).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Achievement catalog, collectible catalog or rank table missing or malformed.
    /// Fatal at startup: there is no safe default for a broken rule set.
    #[error("content load failure: {0}")]
    ContentLoad(String),

    /// Writing the progress record to the backing store failed. The in-memory
    /// state is still valid and the caller may retry the save.
    #[error("persist failure: {0}")]
    Persist(String),

    /// Stored progress blob could not be decoded. Never surfaced by
    /// `ProgressStore::load`, which treats it as absence.
    #[error("deserialize failure: {0}")]
    Deserialize(String),

    /// The progress actor task has stopped and can no longer take commands.
    #[error("progress actor closed")]
    ActorClosed,
}

impl ProgressError {
    pub fn content(msg: impl Into<String>) -> Self {
        ProgressError::ContentLoad(msg.into())
    }

    pub fn is_persist(&self) -> bool {
        matches!(self, ProgressError::Persist(_))
    }
}
