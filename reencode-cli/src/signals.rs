//! Interruption signal listener.
//!
//! A background thread drives a current-thread tokio runtime that waits for
//! Ctrl-C (and SIGTERM on unix). Every signal raises the shared flag; the
//! worker and the job driver poll it and wind down on their own.

use anyhow::{Context, Result};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Starts the listener thread. The thread lives until the process exits.
pub fn spawn_signal_listener(interrupted: Arc<AtomicBool>) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to build signal runtime")?;

    std::thread::Builder::new()
        .name("signal-listener".to_string())
        .spawn(move || {
            runtime.block_on(async move {
                loop {
                    let Some(name) = wait_for_signal().await else {
                        break;
                    };
                    log::warn!("Interrupted by signal {name}");
                    interrupted.store(true, Ordering::SeqCst);
                }
            });
        })
        .context("Failed to spawn signal listener thread")?;

    Ok(())
}

/// Waits for the next interruption signal and returns its name, or `None`
/// when no handler could be registered.
#[cfg(unix)]
async fn wait_for_signal() -> Option<&'static str> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut terminate = match signal(SignalKind::terminate()) {
        Ok(stream) => stream,
        Err(e) => {
            log::error!("Could not listen for SIGTERM: {e}");
            return wait_for_ctrl_c().await;
        }
    };

    tokio::select! {
        result = tokio::signal::ctrl_c() => match result {
            Ok(()) => Some("SIGINT"),
            Err(e) => {
                log::error!("Could not listen for SIGINT: {e}");
                terminate.recv().await.map(|()| "SIGTERM")
            }
        },
        received = terminate.recv() => received.map(|()| "SIGTERM"),
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() -> Option<&'static str> {
    wait_for_ctrl_c().await
}

async fn wait_for_ctrl_c() -> Option<&'static str> {
    match tokio::signal::ctrl_c().await {
        Ok(()) => Some("Ctrl-C"),
        Err(e) => {
            log::error!("Could not listen for Ctrl-C: {e}");
            None
        }
    }
}
