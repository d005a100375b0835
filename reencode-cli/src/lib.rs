// reencode-cli/src/lib.rs
//
// Library portion of the reencode CLI application.
// Contains argument definitions, logging and signal setup, and command logic.

pub mod cli;
pub mod commands;
pub mod error;
pub mod logging;
pub mod signals;

// Re-export items needed by the binary or integration tests
pub use cli::Cli;
pub use commands::encode::run_encode;
