// ============================================================================
// reencode-core/src/error.rs
// ============================================================================
//
// ERROR HANDLING: Core Error Types
//
// Every fallible operation in the core library returns `CoreResult<T>`.
// Per-file failures are converted into worker outcomes at the worker
// boundary; only startup problems (bad profile, unreadable file list,
// unwalkable directory) reach the CLI as errors.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by the reencode core library.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to start {0}: {1}")]
    CommandStart(String, #[source] io::Error),

    #[error("Failed waiting for {0}: {1}")]
    CommandWait(String, #[source] io::Error),

    #[error("Invalid profile: {0}")]
    Config(String),

    #[error("Path error: {0}")]
    PathError(String),

    #[error("Directory walk failed: {0}")]
    Walkdir(#[from] walkdir::Error),

    #[error("Invalid filter expression: {0}")]
    Filter(#[from] regex::Error),

    #[error("Input path is neither a file nor a directory: {}", .0.display())]
    InvalidInputPath(PathBuf),

    #[error("Extension \"{0}\" not in whitelist")]
    UnsupportedExtension(String),

    #[error("{0}")]
    OperationFailed(String),
}

/// Result type for reencode core operations
pub type CoreResult<T> = Result<T, CoreError>;

pub(crate) fn command_start_error(cmd: impl Into<String>, err: io::Error) -> CoreError {
    CoreError::CommandStart(cmd.into(), err)
}

pub(crate) fn command_wait_error(cmd: impl Into<String>, err: io::Error) -> CoreError {
    CoreError::CommandWait(cmd.into(), err)
}
