// ============================================================================
// reencode-cli/src/logging.rs
// ============================================================================
//
// LOGGING SETUP: log4rs Console and File Appenders
//
// The core crate only talks to the `log` facade. This module installs the
// backend once at startup:
// - console (stdout) at Info, or Debug with --verbose, level-highlighted
// - one file per run at Debug in the log directory, named after the start time

use anyhow::{Context, Result};
use log::LevelFilter;
use log4rs::{
    append::{
        console::{ConsoleAppender, Target},
        file::FileAppender,
    },
    config::{Appender, Config, Root},
    encode::pattern::PatternEncoder,
    filter::threshold::ThresholdFilter,
};
use std::path::{Path, PathBuf};

const CONSOLE_PATTERN: &str = "{h([{l}]):{d(%Y-%m-%d %H:%M:%S)} {m}}{n}";
const FILE_PATTERN: &str = "[{l}]:{d(%Y-%m-%d %H:%M:%S)} {m}{n}";

/// Log file name format, one file per run.
pub const LOG_FILE_FORMAT: &str = "%Y-%m-%d_%H-%M-%S.log";

/// Returns the current local timestamp formatted as a log file name.
pub fn log_file_name() -> String {
    chrono::Local::now().format(LOG_FILE_FORMAT).to_string()
}

/// Installs the global logger and returns the path of this run's log file.
pub fn setup_logging(log_dir: &Path, verbose: bool) -> Result<PathBuf> {
    std::fs::create_dir_all(log_dir)
        .with_context(|| format!("Failed to create log directory '{}'", log_dir.display()))?;
    let log_file = log_dir.join(log_file_name());

    let console_level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    let console = ConsoleAppender::builder()
        .target(Target::Stdout)
        .encoder(Box::new(PatternEncoder::new(CONSOLE_PATTERN)))
        .build();

    let file = FileAppender::builder()
        .encoder(Box::new(PatternEncoder::new(FILE_PATTERN)))
        .build(&log_file)
        .with_context(|| format!("Failed to open log file '{}'", log_file.display()))?;

    let config = Config::builder()
        .appender(
            Appender::builder()
                .filter(Box::new(ThresholdFilter::new(console_level)))
                .build("console", Box::new(console)),
        )
        .appender(Appender::builder().build("file", Box::new(file)))
        .build(
            Root::builder()
                .appender("console")
                .appender("file")
                .build(LevelFilter::Debug),
        )
        .context("Invalid logging configuration")?;

    log4rs::init_config(config).context("Logger already initialized")?;
    Ok(log_file)
}
