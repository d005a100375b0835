// ============================================================================
// reencode-cli/src/error.rs
// ============================================================================
//
// CLI ERROR HANDLING: Exit Codes for Startup Errors
//
// Anything that stops the tool before the first file is processed surfaces
// as an `anyhow::Error`. Core errors keep their type inside it so the exit
// code can be picked from the variant. A finished batch always exits 0, even
// when individual files failed.

use reencode_core::CoreError;

/// The batch ran (completed, interrupted or stopped by the stop file).
pub const EXIT_SUCCESS: i32 = 0;

/// Startup failed: logging, profile, filter or file list problems.
pub const EXIT_STARTUP_ERROR: i32 = 1;

/// The input path is neither a file nor a directory.
pub const EXIT_INVALID_PATH: i32 = 2;

/// A single input file has an extension outside the whitelist.
pub const EXIT_UNSUPPORTED_EXTENSION: i32 = 3;

/// Maps a startup error to the process exit code.
pub fn exit_code(err: &anyhow::Error) -> i32 {
    match err.downcast_ref::<CoreError>() {
        Some(CoreError::InvalidInputPath(_)) => EXIT_INVALID_PATH,
        Some(CoreError::UnsupportedExtension(_)) => EXIT_UNSUPPORTED_EXTENSION,
        _ => EXIT_STARTUP_ERROR,
    }
}
