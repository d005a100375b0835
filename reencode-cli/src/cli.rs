// reencode-cli/src/cli.rs
//
// Defines the command-line argument structures using clap.

use clap::Parser;
use reencode_core::WorkerOptions;
use std::path::PathBuf;

// --- CLI Argument Definition ---

#[derive(Parser, Debug)]
#[command(
    author,
    version, // Reads from Cargo.toml via "cargo" feature in clap
    about = "Reencode: batch video re-encoder",
    long_about = "Probes video files with ffprobe and re-encodes, with ffmpeg, only the \
                  streams that do not match the target profile."
)]
pub struct Cli {
    /// Video file, directory or file list to process
    #[arg(value_name = "PATH")]
    pub path: PathBuf,

    /// Output file (single input), output root (directory input) or
    /// switch to input/output line pairs (file list input)
    #[arg(short, long, value_name = "OUTPUT")]
    pub output: Option<PathBuf>,

    /// Perform a trial run without changes made
    #[arg(short, long)]
    pub dry_run: bool,

    /// Remove original content after processing
    #[arg(long)]
    pub remove: bool,

    /// Replace original content with the processed one
    #[arg(long)]
    pub replace: bool,

    /// Overwrite output files that already exist
    #[arg(long)]
    pub overwrite: bool,

    /// Remove processed content if an error occurs
    #[arg(long)]
    pub clean_on_error: bool,

    /// Treat PATH as a text file listing one path per line
    #[arg(long)]
    pub filelist: bool,

    /// Only process directory entries whose relative path matches this regex
    #[arg(long, value_name = "REGEX")]
    pub filter: Option<String>,

    /// TOML profile replacing the built-in target profile
    #[arg(long, value_name = "FILE", env = "REENCODE_PROFILE")]
    pub profile: Option<PathBuf>,

    /// Directory for log files
    #[arg(long, value_name = "DIR", env = "REENCODE_LOG_DIR", default_value = "logs")]
    pub log_dir: PathBuf,

    /// Stop the batch before the next file once this file exists
    /// (defaults to LOG_DIR/reencode.stop)
    #[arg(long, value_name = "FILE")]
    pub stop_file: Option<PathBuf>,

    /// Hardware acceleration method passed to ffmpeg (e.g. cuda)
    #[arg(long, value_name = "NAME")]
    pub hwaccel: Option<String>,

    /// Log debug messages to the console too
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Per-file policy flags for the worker.
    pub fn worker_options(&self) -> WorkerOptions {
        WorkerOptions::builder()
            .dry_run(self.dry_run)
            .remove(self.remove)
            .replace(self.replace)
            .overwrite(self.overwrite)
            .clean_on_error(self.clean_on_error)
            .build()
    }

    pub fn stop_file(&self) -> PathBuf {
        self.stop_file
            .clone()
            .unwrap_or_else(|| self.log_dir.join(reencode_core::config::DEFAULT_STOP_FILE_NAME))
    }
}
