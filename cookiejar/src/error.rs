//! Error types for the cookie jar.

use thiserror::Error;

/// Errors raised while loading or saving a cookie jar file.
#[derive(Debug, Error)]
pub enum JarError {
    /// The jar file exists but is not a valid jar document.
    ///
    /// This is never recovered from silently: a corrupt jar aborts the run.
    #[error("cookie jar is corrupt: {0}")]
    Corrupt(#[source] serde_json::Error),

    /// Reading or writing the jar file failed.
    #[error("cookie jar I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The in-memory jar could not be encoded.
    #[error("failed to serialize cookie jar: {0}")]
    Serialize(#[source] serde_json::Error),
}

/// Convenience alias for `Result<T, JarError>`.
pub type Result<T> = std::result::Result<T, JarError>;
