// ============================================================================
// reencode-core/src/external/ffmpeg_executor.rs
// ============================================================================
//
// FFMPEG EXECUTOR: Encoder Process Management and Abstraction
//
// This module defines the traits the worker uses to launch and supervise the
// encoder, and the concrete implementation built on ffmpeg-sidecar.
//
// KEY COMPONENTS:
// - EncoderProcess: Trait representing a running encoder
// - EncoderSpawner: Trait for launching an EncodeCommand
// - SidecarSpawner: Concrete implementation using ffmpeg-sidecar
//
// OUTPUT HANDLING:
// ffmpeg-sidecar parses the encoder's stderr into events. A reader thread
// walks the event iterator and forwards the ones the worker cares about over
// a channel, so the supervision loop can wait on it with a timeout and still
// notice interruptions promptly.

use crate::error::{CoreError, CoreResult, command_start_error, command_wait_error};
use crate::external::ffmpeg::EncodeCommand;
use crate::utils::parse_ffmpeg_time;
use ffmpeg_sidecar::child::FfmpegChild;
use ffmpeg_sidecar::command::FfmpegCommand;
use ffmpeg_sidecar::event::FfmpegEvent;
use std::process::ExitStatus;
use std::sync::mpsc::{self, Receiver};
use std::thread;

/// Encoder output reduced to what supervision needs.
#[derive(Debug, Clone, PartialEq)]
pub enum EncoderEvent {
    /// Total input duration in seconds, as announced by the encoder
    Duration(f64),
    /// Current output position in seconds
    Progress(f64),
    Log(String),
    Error(String),
}

impl EncoderEvent {
    /// Converts a sidecar event. Events without a use here map to `None`.
    pub fn from_sidecar(event: FfmpegEvent) -> Option<Self> {
        match event {
            FfmpegEvent::ParsedDuration(duration) => Some(Self::Duration(duration.duration)),
            FfmpegEvent::Progress(progress) => {
                parse_ffmpeg_time(&progress.time).map(Self::Progress)
            }
            FfmpegEvent::Log(_, message) => Some(Self::Log(message)),
            FfmpegEvent::Error(error) => Some(Self::Error(error)),
            _ => None,
        }
    }
}

// --- Encoder Execution Abstraction ---

/// Trait representing a running encoder instance.
pub trait EncoderProcess {
    /// Hands out the encoder event stream. Returns `None` once taken.
    fn take_events(&mut self) -> Option<Receiver<EncoderEvent>>;

    /// Asks the encoder to finish early. Cooperative: ffmpeg flushes and
    /// closes its output before exiting.
    fn request_termination(&mut self) -> CoreResult<()>;

    /// Returns the exit status if the encoder has already exited.
    fn try_wait(&mut self) -> CoreResult<Option<ExitStatus>>;
}

/// Trait representing something that can launch an encoder.
pub trait EncoderSpawner {
    type Process: EncoderProcess;

    fn spawn(&self, cmd: &EncodeCommand) -> CoreResult<Self::Process>;
}

// --- Concrete Implementation using ffmpeg-sidecar ---

/// Wrapper around `ffmpeg_sidecar::child::FfmpegChild` implementing `EncoderProcess`.
pub struct SidecarProcess {
    child: FfmpegChild,
    events: Option<Receiver<EncoderEvent>>,
}

impl EncoderProcess for SidecarProcess {
    fn take_events(&mut self) -> Option<Receiver<EncoderEvent>> {
        self.events.take()
    }

    fn request_termination(&mut self) -> CoreResult<()> {
        self.child.quit().map_err(|e| {
            CoreError::OperationFailed(format!("Failed to send quit to ffmpeg: {e}"))
        })
    }

    fn try_wait(&mut self) -> CoreResult<Option<ExitStatus>> {
        self.child
            .as_inner_mut()
            .try_wait()
            .map_err(|e| command_wait_error("ffmpeg (sidecar)", e))
    }
}

/// Concrete implementation of `EncoderSpawner` using `ffmpeg-sidecar`.
#[derive(Debug, Clone, Default)]
pub struct SidecarSpawner;

impl EncoderSpawner for SidecarSpawner {
    type Process = SidecarProcess;

    fn spawn(&self, cmd: &EncodeCommand) -> CoreResult<Self::Process> {
        let mut command = FfmpegCommand::new_with_path(cmd.program());
        command.args(cmd.args());

        let mut child = command
            .spawn()
            .map_err(|e| command_start_error(cmd.program(), e))?;

        let events = match child.iter() {
            Ok(events) => events,
            Err(e) => {
                let _ = child.kill();
                return Err(CoreError::OperationFailed(format!(
                    "Failed to get ffmpeg event iterator: {e}"
                )));
            }
        };

        let (tx, rx) = mpsc::channel();
        thread::Builder::new()
            .name("encoder-events".to_string())
            .spawn(move || {
                for event in events.filter_map(EncoderEvent::from_sidecar) {
                    if tx.send(event).is_err() {
                        break;
                    }
                }
            })
            .map_err(|e| command_start_error("encoder event reader", e))?;

        Ok(SidecarProcess {
            child,
            events: Some(rx),
        })
    }
}
