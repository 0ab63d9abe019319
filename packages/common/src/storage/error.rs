use std::fmt;

/// Errors raised by the content store.
#[derive(Debug)]
pub enum StorageError {
    /// No object exists at the location. When the registry still references
    /// the location this means stored bytes were lost.
    NotFound(String),
    /// An I/O error occurred (disk full, permission denied, ...).
    Io(std::io::Error),
    /// The provided content hash is malformed.
    InvalidHash(String),
    /// The location string is not of the form `<shard>/<hash>`.
    InvalidLocation(String),
    /// The bytes handed to a write do not digest to the claimed hash.
    HashMismatch { expected: String, actual: String },
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound(location) => write!(f, "stored content not found: {location}"),
            Self::Io(err) => write!(f, "storage IO error: {err}"),
            Self::InvalidHash(msg) => write!(f, "invalid content hash: {msg}"),
            Self::InvalidLocation(location) => write!(f, "invalid storage location: {location}"),
            Self::HashMismatch { expected, actual } => {
                write!(f, "content hash mismatch (expected {expected}, got {actual})")
            }
        }
    }
}

impl std::error::Error for StorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}
