// reencode-cli/src/main.rs
//
// Entry point for the `reencode` binary.
//
// Order matters here: logging comes first so every later startup error is
// recorded in the run's log file, then the signal listener, then the batch.

use clap::Parser;
use reencode_cli::error::{EXIT_STARTUP_ERROR, EXIT_SUCCESS, exit_code};
use reencode_cli::{Cli, logging, run_encode, signals};
use std::process;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

fn main() {
    let cli = Cli::parse();

    let log_file = match logging::setup_logging(&cli.log_dir, cli.verbose) {
        Ok(path) => path,
        Err(e) => {
            eprintln!("Error: {e:#}");
            process::exit(EXIT_STARTUP_ERROR);
        }
    };
    log::info!("Starting new job, logging to \"{}\"", log_file.display());
    log::debug!("Parameters: {cli:?}");

    let interrupted = Arc::new(AtomicBool::new(false));
    if let Err(e) = signals::spawn_signal_listener(Arc::clone(&interrupted)) {
        log::error!("{e:#}");
        process::exit(EXIT_STARTUP_ERROR);
    }

    match run_encode(&cli, interrupted) {
        Ok(summary) => {
            if summary.failed > 0 {
                log::warn!(
                    "{} file(s) failed, see \"{}\" for details",
                    summary.failed,
                    log_file.display()
                );
            }
            process::exit(EXIT_SUCCESS);
        }
        Err(e) => {
            log::error!("{e:#}");
            process::exit(exit_code(&e));
        }
    }
}
