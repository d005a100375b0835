//! Command implementations for the CLI.

/// The batch re-encoding run driven by the top-level arguments.
pub mod encode;
