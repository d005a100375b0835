//! Configuration structures and constants for the reencode-core library.
//!
//! This module holds the target media profile, the per-run worker flags and
//! the encoder invocation settings. All of them are built once by the CLI and
//! stay immutable for the whole batch.

mod builder;
mod profile;

pub use builder::WorkerOptionsBuilder;
pub use profile::{AudioProfile, MediaProfile, Resolution, VideoProfile};

// Default constants

/// File extensions (lowercase, without the dot) accepted as inputs.
pub const EXT_WHITELIST: [&str; 5] = ["avi", "mp4", "mov", "mkv", "wmv"];

/// Suffix appended to the input stem when no explicit output is given.
pub const DEFAULT_OUTPUT_SUFFIX: &str = "_reencoded";

/// Container extension used for derived output paths.
pub const DEFAULT_OUTPUT_EXTENSION: &str = "mp4";

/// Name of the stop file looked up in the log directory by default.
pub const DEFAULT_STOP_FILE_NAME: &str = "reencode.stop";

/// Progress is logged to file once per this many percent of completion.
pub const PROGRESS_LOG_INTERVAL_PERCENT: u8 = 10;

/// How long the supervision loop waits for encoder output before
/// re-checking the interruption flag, in milliseconds.
pub const SUPERVISION_POLL_INTERVAL_MS: u64 = 100;

/// Default ffmpeg binary name.
pub const DEFAULT_FFMPEG_PROGRAM: &str = "ffmpeg";

/// Default ffprobe binary name.
pub const DEFAULT_FFPROBE_PROGRAM: &str = "ffprobe";

/// Policy flags read by the worker at construction time.
///
/// `replace` takes precedence over `remove` when both are set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkerOptions {
    /// Probe, decide and synthesize, but never spawn or touch files
    pub dry_run: bool,
    /// Delete the original input after a successful encode
    pub remove: bool,
    /// Substitute the new output for the original input after success
    pub replace: bool,
    /// Allow writing over an output file that already exists
    pub overwrite: bool,
    /// Delete the partial output when the encoder fails
    pub clean_on_error: bool,
}

impl WorkerOptions {
    pub fn builder() -> WorkerOptionsBuilder {
        WorkerOptionsBuilder::new()
    }
}

/// How the external tools are invoked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncoderSettings {
    /// Program used for encoding
    pub ffmpeg_program: String,
    /// Program used for probing
    pub ffprobe_program: String,
    /// Optional hardware acceleration method passed as `-hwaccel`
    /// and `-hwaccel_output_format` (e.g. "cuda")
    pub hwaccel: Option<String>,
}

impl Default for EncoderSettings {
    fn default() -> Self {
        Self {
            ffmpeg_program: DEFAULT_FFMPEG_PROGRAM.to_string(),
            ffprobe_program: DEFAULT_FFPROBE_PROGRAM.to_string(),
            hwaccel: None,
        }
    }
}
