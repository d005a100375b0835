//! Sequential batch driver.
//!
//! Runs one [`Worker`] per file job, strictly one after another. Between
//! files it checks the interruption flag and the stop file; a single file's
//! failure never stops the batch.

use super::worker::{Outcome, SkipReason, Worker, WorkerContext};
use crate::external::EncoderSpawner;
use crate::media::MediaProber;
use std::fmt;
use std::path::PathBuf;
use std::sync::atomic::Ordering;
use std::time::Instant;

/// One input/output pair to process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileJob {
    pub input: PathBuf,
    pub output: PathBuf,
}

impl FileJob {
    pub fn new(input: impl Into<PathBuf>, output: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            output: output.into(),
        }
    }
}

/// Why the batch ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// Every job was attempted
    Completed,
    /// The interruption flag was raised
    Interrupted,
    /// The stop file appeared between two files
    StoppedByFile,
}

/// Per-reason skip tally.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SkipCounts {
    pub probe_failed: usize,
    pub output_exists: usize,
    pub compliant: usize,
}

impl SkipCounts {
    pub fn total(&self) -> usize {
        self.probe_failed + self.output_exists + self.compliant
    }

    fn record(&mut self, reason: SkipReason) {
        match reason {
            SkipReason::ProbeFailed => self.probe_failed += 1,
            SkipReason::OutputExists => self.output_exists += 1,
            SkipReason::Compliant => self.compliant += 1,
        }
    }
}

/// Tally of one batch run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchSummary {
    /// Jobs handed to a worker, including the one that was interrupted
    pub processed: usize,
    pub succeeded: usize,
    pub skipped: SkipCounts,
    pub failed: usize,
    pub stop_reason: StopReason,
}

impl fmt::Display for BatchSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} processed, {} succeeded, {} skipped ({} compliant, {} existing output, {} unprobeable), {} failed",
            self.processed,
            self.succeeded,
            self.skipped.total(),
            self.skipped.compliant,
            self.skipped.output_exists,
            self.skipped.probe_failed,
            self.failed
        )
    }
}

pub struct JobDriver<'a, P, S> {
    ctx: WorkerContext<'a, P, S>,
    stop_file: Option<PathBuf>,
}

impl<'a, P, S> JobDriver<'a, P, S>
where
    P: MediaProber,
    S: EncoderSpawner,
{
    pub fn new(ctx: WorkerContext<'a, P, S>, stop_file: Option<PathBuf>) -> Self {
        Self { ctx, stop_file }
    }

    /// Processes `jobs` in order and returns the tally.
    pub fn run(&self, jobs: &[FileJob]) -> BatchSummary {
        let started = Instant::now();
        let mut summary = BatchSummary {
            processed: 0,
            succeeded: 0,
            skipped: SkipCounts::default(),
            failed: 0,
            stop_reason: StopReason::Completed,
        };

        for (i, job) in jobs.iter().enumerate() {
            if self.ctx.interrupted.load(Ordering::SeqCst) {
                log::info!("Interrupted, not starting remaining files");
                summary.stop_reason = StopReason::Interrupted;
                break;
            }
            if let Some(stop_file) = self.stop_file.as_ref().filter(|p| p.exists()) {
                log::info!("Stop file \"{}\" found, stopping", stop_file.display());
                summary.stop_reason = StopReason::StoppedByFile;
                break;
            }

            log::info!(
                "[{}/{}] Processing \"{}\"",
                i + 1,
                jobs.len(),
                job.input.display()
            );

            let mut worker = Worker::new(self.ctx.clone(), &job.input, &job.output);
            let outcome = worker.work();
            summary.processed += 1;

            match outcome {
                Outcome::Succeeded => summary.succeeded += 1,
                Outcome::Skipped(reason) => {
                    log::info!("Skipped \"{}\": {}", job.input.display(), reason);
                    summary.skipped.record(reason);
                }
                Outcome::Failed => summary.failed += 1,
                Outcome::Interrupted => {
                    summary.stop_reason = StopReason::Interrupted;
                    break;
                }
            }
        }

        log::info!(
            "Batch finished in {} ({:?}): {}",
            crate::utils::format_duration(started.elapsed().as_secs_f64()),
            summary.stop_reason,
            summary
        );
        summary
    }
}
