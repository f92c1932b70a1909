//! Common error types for scenecut

use std::path::PathBuf;
use thiserror::Error;

/// Common result type for scenecut operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error type shared by the document model, registry, and serializer
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Document could not be parsed into the model
    #[error("parse error: {0}")]
    Parse(String),

    /// Document could not be serialized
    #[error("serialize error: {0}")]
    Serialize(String),

    /// A duration/offset string was not `"0s"` or `"<int>/<int>s"`
    #[error("invalid time value: {0}")]
    InvalidTime(String),

    /// Invalid user input or request parameter
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A referenced media file does not exist on disk
    #[error("media file not found: {0}")]
    MissingFile(PathBuf),

    /// The document has no event/project/sequence to edit
    #[error("document has no sequence")]
    NoSequence,

    /// A transaction was used after `rollback()`
    #[error("transaction has been rolled back")]
    TransactionRolledBack,

    /// The duration probe reported an unusable result
    #[error("media probe failed: {0}")]
    Probe(String),

    /// Configuration loading or validation error
    #[error("configuration error: {0}")]
    Config(String),
}
