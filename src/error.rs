//! Error types for the log tail library.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for log tail operations.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O errors while reading the followed file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// File watching errors from the notify crate.
    #[error("File watcher error: {0}")]
    Watcher(#[from] notify::Error),

    /// UTF-8 decoding errors for a single line.
    #[error("UTF-8 decoding error: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    /// Rejected polling parameters.
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// The file could not be opened when the reader was created.
    #[error("Failed to open {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The starting offset could not be applied.
    #[error("Failed to seek {} to offset {offset}: {source}", path.display())]
    Seek {
        path: PathBuf,
        offset: u64,
        #[source]
        source: std::io::Error,
    },

    /// The file stayed unreachable for longer than the stale timeout.
    #[error("File no longer exists: {}", path.display())]
    EndOfStream { path: PathBuf },

    /// The reader was closed by its owner.
    #[error("Reader closed")]
    Closed,
}

impl Error {
    /// Returns true when the reader that produced this error can never yield another line.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Error::EndOfStream { .. } | Error::Closed)
    }
}

/// A convenient Result type for log tail operations.
pub type Result<T> = std::result::Result<T, Error>;
