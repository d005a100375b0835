// ============================================================================
// reencode-core/src/processing/worker.rs
// ============================================================================
//
// WORKER: Per-file State Machine
//
// One Worker handles one input/output pair:
//
//   Idle -> Probed -> Decided -> Running -> Finished(Outcome)
//
// Any step may jump straight to Finished (probe failure, existing output,
// compliant file, dry run). Each step consumes the current state and returns
// the next one, and the current state is always available through
// `Worker::state()`.
//
// Per-file problems never escape as errors: they become an Outcome.

use crate::config::{MediaProfile, SUPERVISION_POLL_INTERVAL_MS, WorkerOptions};
use crate::criteria::{ViolationSet, evaluate};
use crate::external::{
    CommandSynthesizer, EncodeCommand, EncoderEvent, EncoderProcess, EncoderSpawner,
};
use crate::media::{MediaProber, ProbedMetadata};
use crate::processing::policy::{PolicyAction, apply_policy};
use crate::progress::ProgressTracker;
use crate::utils::{bytes_saved, file_size_or_zero, format_bytes, format_ratio, size_ratio};
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::ExitStatus;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::time::Duration;

/// Why a file was left alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SkipReason {
    ProbeFailed,
    OutputExists,
    Compliant,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SkipReason::ProbeFailed => "could not be probed",
            SkipReason::OutputExists => "output already exists",
            SkipReason::Compliant => "already compliant",
        })
    }
}

/// Terminal result of one worker run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Skipped(SkipReason),
    Succeeded,
    Failed,
    Interrupted,
}

/// How the output path will be written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Skip(SkipReason),
    /// An existing output is written over
    Overwrite,
    /// The output will take the input's place after success
    ReplaceInPlace,
    /// The output does not exist yet
    Fresh,
}

/// Explicit worker state.
#[derive(Debug, Clone)]
pub enum WorkerState {
    Idle,
    Probed(ProbedMetadata),
    Decided {
        metadata: ProbedMetadata,
        decision: Decision,
    },
    Running {
        metadata: ProbedMetadata,
        decision: Decision,
        violations: ViolationSet,
        command: EncodeCommand,
    },
    Finished(Outcome),
}

impl WorkerState {
    pub fn outcome(&self) -> Option<Outcome> {
        match self {
            WorkerState::Finished(outcome) => Some(*outcome),
            _ => None,
        }
    }
}

/// Collaborators and settings shared by every worker of a batch.
pub struct WorkerContext<'a, P, S> {
    pub prober: &'a P,
    pub spawner: &'a S,
    pub synthesizer: &'a CommandSynthesizer,
    pub profile: &'a MediaProfile,
    pub options: WorkerOptions,
    pub interrupted: Arc<AtomicBool>,
}

impl<P, S> Clone for WorkerContext<'_, P, S> {
    fn clone(&self) -> Self {
        Self {
            prober: self.prober,
            spawner: self.spawner,
            synthesizer: self.synthesizer,
            profile: self.profile,
            options: self.options,
            interrupted: Arc::clone(&self.interrupted),
        }
    }
}

/// How the encoder run ended, before bookkeeping. `status` is `None` when
/// the process could no longer be waited on.
struct RunExit {
    status: Option<ExitStatus>,
    terminated: bool,
}

pub struct Worker<'a, P, S> {
    ctx: WorkerContext<'a, P, S>,
    input: PathBuf,
    output: PathBuf,
    state: WorkerState,
    violations: Option<ViolationSet>,
    policy_action: Option<PolicyAction>,
}

impl<'a, P, S> Worker<'a, P, S>
where
    P: MediaProber,
    S: EncoderSpawner,
{
    pub fn new(ctx: WorkerContext<'a, P, S>, input: impl Into<PathBuf>, output: impl Into<PathBuf>) -> Self {
        Self {
            ctx,
            input: input.into(),
            output: output.into(),
            state: WorkerState::Idle,
            violations: None,
            policy_action: None,
        }
    }

    pub fn state(&self) -> &WorkerState {
        &self.state
    }

    pub fn input(&self) -> &Path {
        &self.input
    }

    pub fn output(&self) -> &Path {
        &self.output
    }

    /// Violations found by the evaluator, once evaluation has run.
    pub fn violations(&self) -> Option<ViolationSet> {
        self.violations
    }

    /// What the post-success policy did, if it ran.
    pub fn policy_action(&self) -> Option<PolicyAction> {
        self.policy_action
    }

    /// Drives the state machine to a terminal outcome.
    pub fn work(&mut self) -> Outcome {
        loop {
            if let Some(outcome) = self.state.outcome() {
                return outcome;
            }
            self.step();
        }
    }

    /// Advances by exactly one transition.
    pub fn step(&mut self) {
        let current = std::mem::replace(&mut self.state, WorkerState::Idle);
        self.state = match current {
            WorkerState::Idle => self.probe(),
            WorkerState::Probed(metadata) => self.decide(metadata),
            WorkerState::Decided { metadata, decision } => self.prepare(metadata, decision),
            WorkerState::Running {
                metadata,
                decision,
                violations,
                command,
            } => self.supervise(&metadata, decision, violations, &command),
            finished @ WorkerState::Finished(_) => finished,
        };
    }

    fn probe(&mut self) -> WorkerState {
        match self.ctx.prober.probe(&self.input) {
            Ok(metadata) => {
                log::debug!("{metadata:?}");
                WorkerState::Probed(metadata)
            }
            Err(failure) => {
                log::warn!("Unable to probe \"{}\": {}, skipping", self.input.display(), failure);
                WorkerState::Finished(Outcome::Skipped(SkipReason::ProbeFailed))
            }
        }
    }

    fn decide(&mut self, metadata: ProbedMetadata) -> WorkerState {
        let options = &self.ctx.options;
        let exists = self.output.exists();

        if exists && !options.overwrite {
            log::warn!(
                "Output file \"{}\" already exists, skipping",
                self.output.display()
            );
            return WorkerState::Decided {
                metadata,
                decision: Decision::Skip(SkipReason::OutputExists),
            };
        }
        if exists {
            log::warn!("Output file \"{}\" will be overwritten", self.output.display());
        }

        let decision = if options.replace {
            Decision::ReplaceInPlace
        } else if exists {
            Decision::Overwrite
        } else {
            Decision::Fresh
        };

        if !options.dry_run {
            if let Some(parent) = self.output.parent().filter(|p| !p.as_os_str().is_empty()) {
                if let Err(e) = std::fs::create_dir_all(parent) {
                    log::error!(
                        "Could not create output directory \"{}\": {}",
                        parent.display(),
                        e
                    );
                    return WorkerState::Finished(Outcome::Failed);
                }
            }
        }

        WorkerState::Decided { metadata, decision }
    }

    fn prepare(&mut self, metadata: ProbedMetadata, decision: Decision) -> WorkerState {
        if let Decision::Skip(reason) = decision {
            return WorkerState::Finished(Outcome::Skipped(reason));
        }

        let violations = evaluate(&metadata, self.ctx.profile);
        self.violations = Some(violations);
        log::info!("Violations: {violations}");

        let command = self.ctx.synthesizer.synthesize(
            &self.input,
            &self.output,
            &metadata,
            violations,
            self.ctx.profile,
        );
        log::debug!("{command}");

        if violations.is_empty() {
            log::info!("Video matches expectations, skipping");
            return WorkerState::Finished(Outcome::Skipped(SkipReason::Compliant));
        }

        if self.ctx.options.dry_run {
            log::info!("Dry run: not encoding \"{}\"", self.input.display());
            self.policy_action = Some(apply_policy(&self.input, &self.output, &self.ctx.options));
            return WorkerState::Finished(Outcome::Succeeded);
        }

        WorkerState::Running {
            metadata,
            decision,
            violations,
            command,
        }
    }

    fn supervise(
        &mut self,
        metadata: &ProbedMetadata,
        decision: Decision,
        violations: ViolationSet,
        command: &EncodeCommand,
    ) -> WorkerState {
        log::info!(
            "Encoding \"{}\" -> \"{}\" ({:?}, {})",
            self.input.display(),
            self.output.display(),
            decision,
            violations
        );

        let mut process = match self.ctx.spawner.spawn(command) {
            Ok(process) => process,
            Err(e) => {
                log::error!("Failed to start encoder for \"{}\": {}", self.input.display(), e);
                return WorkerState::Finished(Outcome::Failed);
            }
        };

        let run = self.run_to_exit(&mut process);

        if run.terminated {
            log::info!("Interrupted while encoding \"{}\"", self.input.display());
            if let Some(status) = run.status.filter(|s| !s.success()) {
                self.handle_failure(status);
            }
            return WorkerState::Finished(Outcome::Interrupted);
        }

        match run.status {
            Some(status) if status.success() => {}
            Some(status) => {
                self.handle_failure(status);
                return WorkerState::Finished(Outcome::Failed);
            }
            None => {
                log::error!(
                    "Failed to process \"{}\": encoder exit status unknown, leaving output in place",
                    self.input.display()
                );
                return WorkerState::Finished(Outcome::Failed);
            }
        }

        self.report_sizes(metadata);
        self.policy_action = Some(apply_policy(&self.input, &self.output, &self.ctx.options));
        WorkerState::Finished(Outcome::Succeeded)
    }

    /// Pumps encoder events until the process exits, requesting termination
    /// once if the interruption flag is raised.
    fn run_to_exit(&self, process: &mut S::Process) -> RunExit {
        let poll = Duration::from_millis(SUPERVISION_POLL_INTERVAL_MS);
        let events = process.take_events();
        let mut tracker = ProgressTracker::new();
        let mut terminated = false;
        let mut streams_open = events.is_some();

        let status = loop {
            if !terminated && self.ctx.interrupted.load(Ordering::SeqCst) {
                log::info!("Interruption requested, asking encoder to stop");
                // Not fatal: the exit status still decides the outcome.
                if let Err(e) = process.request_termination() {
                    log::warn!("Termination request for \"{}\" failed: {}", self.input.display(), e);
                }
                terminated = true;
            }

            match (&events, streams_open) {
                (Some(rx), true) => match rx.recv_timeout(poll) {
                    Ok(event) => tracker.handle_event(&event),
                    Err(RecvTimeoutError::Timeout) => {}
                    Err(RecvTimeoutError::Disconnected) => streams_open = false,
                },
                _ => std::thread::sleep(poll),
            }

            match process.try_wait() {
                Ok(Some(status)) => break Some(status),
                Ok(None) => {}
                Err(e) => {
                    log::error!("Lost track of encoder for \"{}\": {}", self.input.display(), e);
                    break None;
                }
            }
        };

        // Once the encoder has exited its event stream is finite.
        if let (Some(rx), Some(_)) = (&events, status) {
            drain(rx, &mut tracker);
        }
        tracker.finish();

        RunExit { status, terminated }
    }

    /// Bookkeeping for a non-zero encoder exit.
    fn handle_failure(&self, status: ExitStatus) {
        match status.code() {
            Some(code) => log::error!(
                "Failed to process \"{}\": return code was {}",
                self.input.display(),
                code
            ),
            None => log::error!("Failed to process \"{}\": {}", self.input.display(), status),
        }

        if self.ctx.options.clean_on_error && self.output.exists() {
            log::info!("Removing failed \"{}\"", self.output.display());
            if let Err(e) = std::fs::remove_file(&self.output) {
                log::error!("Could not remove \"{}\": {}", self.output.display(), e);
            }
        }
    }

    fn report_sizes(&self, metadata: &ProbedMetadata) {
        let in_size = if metadata.file_size > 0 {
            metadata.file_size
        } else {
            file_size_or_zero(&self.input)
        };
        let out_size = file_size_or_zero(&self.output);

        log::info!(
            "{} -> {} (ratio: {}) (saved: {})",
            format_bytes(i128::from(in_size)),
            format_bytes(i128::from(out_size)),
            format_ratio(size_ratio(in_size, out_size)),
            format_bytes(i128::from(bytes_saved(in_size, out_size)))
        );
    }
}

fn drain(rx: &Receiver<EncoderEvent>, tracker: &mut ProgressTracker) {
    for event in rx.iter() {
        tracker.handle_event(&event);
    }
}
