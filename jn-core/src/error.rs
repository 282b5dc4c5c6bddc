use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum JnError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("I/O error on {}: {source}", path.display())]
    IoAt {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Walk error: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("fragment already exists: {}", path.display())]
    AlreadyExists { path: PathBuf },

    #[error("{} is {size} bytes, larger than the fragment budget of {limit} bytes", path.display())]
    FileTooLarge { path: PathBuf, size: u64, limit: u64 },

    #[error("{} grew past its enumerated size of {declared} bytes while packing", path.display())]
    SourceGrew { path: PathBuf, declared: u64 },

    #[error("Format error: {0}")]
    Format(String),

    #[error("Corrupt index: {0}")]
    CorruptIndex(String),

    #[error("entry already exists: {}", path.display())]
    EntryAlreadyExists { path: PathBuf },

    #[error("entry {path}: range {start}+{length} exceeds data region ending at {limit}")]
    EntryOutOfBounds {
        path: String,
        start: u64,
        length: u64,
        limit: u64,
    },

    #[error("entry {path}: expected {expected} bytes, read {got}")]
    Truncated { path: String, expected: u64, got: u64 },

    #[error("entry {path}: digest mismatch (stored {expected}, computed {actual})")]
    DigestMismatch {
        path: String,
        expected: String,
        actual: String,
    },

    #[error("unsafe path: {0}")]
    UnsafePath(String),
}

impl JnError {
    /// Attach the file or fragment path to an I/O failure.
    pub fn at(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> JnError {
        let path = path.into();
        move |source| JnError::IoAt { path, source }
    }

    /// True when the failure concerns a single extracted entry and the run can
    /// move on to the next one.
    pub fn is_entry_local(&self) -> bool {
        matches!(
            self,
            JnError::IoAt { .. }
                | JnError::EntryAlreadyExists { .. }
                | JnError::EntryOutOfBounds { .. }
                | JnError::Truncated { .. }
                | JnError::DigestMismatch { .. }
                | JnError::UnsafePath(_)
        )
    }
}

// Convenient crate-wide result type
pub type Result<T> = std::result::Result<T, JnError>;
