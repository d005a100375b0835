// reencode-core/src/external/mocks.rs

// --- Mocking Infrastructure (for testing) ---

// Compiled for this crate's own tests and for dependents enabling "test-mocks".
#![cfg(any(test, feature = "test-mocks"))]

use super::ffmpeg::EncodeCommand;
use super::ffmpeg_executor::{EncoderEvent, EncoderProcess, EncoderSpawner};
use crate::error::{CoreError, CoreResult, command_start_error};
use crate::media::{MediaProber, ProbeFailure, ProbedMetadata};
use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};
use std::os::unix::process::ExitStatusExt;
use std::path::{Path, PathBuf};
use std::process::ExitStatus;
use std::rc::Rc;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver};

fn exit_status(code: i32) -> ExitStatus {
    // Raw wait status: exit code lives in the second byte.
    ExitStatus::from_raw(code << 8)
}

/// How a scripted encoder run ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockExit {
    /// Exits with this code as soon as it is polled.
    Immediately(i32),
    /// Keeps running until a termination request arrives, then exits with this code.
    OnTermination(i32),
    /// Keeps running for `polls` more polls after a termination request,
    /// then exits with `code`.
    AfterTermination { polls: usize, code: i32 },
}

/// One scripted encoder run.
#[derive(Debug, Clone)]
pub struct MockRun {
    pub events: Vec<EncoderEvent>,
    pub exit: MockExit,
    /// Write a placeholder file at the command's output path when spawned
    pub create_output: bool,
    /// Flag raised right after spawning, simulating a signal mid-encode
    pub raise_on_spawn: Option<Arc<AtomicBool>>,
    /// Termination requests are counted but report an error, as when the
    /// encoder has already closed its stdin
    pub failing_termination: bool,
}

impl MockRun {
    pub fn new(events: &[EncoderEvent], exit: MockExit) -> Self {
        Self {
            events: events.to_vec(),
            exit,
            create_output: true,
            raise_on_spawn: None,
            failing_termination: false,
        }
    }

    pub fn without_output(mut self) -> Self {
        self.create_output = false;
        self
    }

    pub fn raising(mut self, flag: Arc<AtomicBool>) -> Self {
        self.raise_on_spawn = Some(flag);
        self
    }

    pub fn failing_termination(mut self) -> Self {
        self.failing_termination = true;
        self
    }
}

enum Scripted {
    Run(MockRun),
    SpawnFailure,
}

/// Mock implementation of EncoderProcess.
pub struct MockEncoderProcess {
    events: Option<Receiver<EncoderEvent>>,
    exit: MockExit,
    terminated: bool,
    polls_since_termination: usize,
    failing_termination: bool,
    termination_requests: Rc<Cell<usize>>,
}

impl EncoderProcess for MockEncoderProcess {
    fn take_events(&mut self) -> Option<Receiver<EncoderEvent>> {
        self.events.take()
    }

    fn request_termination(&mut self) -> CoreResult<()> {
        self.termination_requests
            .set(self.termination_requests.get() + 1);
        if self.failing_termination {
            return Err(CoreError::OperationFailed(
                "Failed to send quit to ffmpeg: Broken pipe (os error 32)".to_string(),
            ));
        }
        self.terminated = true;
        Ok(())
    }

    fn try_wait(&mut self) -> CoreResult<Option<ExitStatus>> {
        if self.terminated {
            self.polls_since_termination += 1;
        }
        Ok(match self.exit {
            MockExit::Immediately(code) => Some(exit_status(code)),
            MockExit::OnTermination(code) if self.terminated => Some(exit_status(code)),
            MockExit::AfterTermination { polls, code } if self.polls_since_termination > polls => {
                Some(exit_status(code))
            }
            MockExit::OnTermination(_) | MockExit::AfterTermination { .. } => None,
        })
    }
}

/// Mock implementation of EncoderSpawner replaying scripted runs in order.
#[derive(Clone, Default)]
pub struct MockEncoderSpawner {
    script: Rc<RefCell<VecDeque<Scripted>>>,
    received_calls: Rc<RefCell<Vec<Vec<String>>>>,
    termination_requests: Rc<Cell<usize>>,
}

impl MockEncoderSpawner {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn add_run(&self, run: MockRun) {
        self.script.borrow_mut().push_back(Scripted::Run(run));
    }

    pub fn add_success(&self, events: &[EncoderEvent]) {
        self.add_run(MockRun::new(events, MockExit::Immediately(0)));
    }

    pub fn add_failure(&self, events: &[EncoderEvent], exit_code: i32) {
        self.add_run(MockRun::new(events, MockExit::Immediately(exit_code)));
    }

    pub fn add_spawn_failure(&self) {
        self.script.borrow_mut().push_back(Scripted::SpawnFailure);
    }

    /// Argument vectors (program first) of every spawn attempt.
    pub fn get_received_calls(&self) -> Vec<Vec<String>> {
        self.received_calls.borrow().clone()
    }

    pub fn spawn_count(&self) -> usize {
        self.received_calls.borrow().len()
    }

    pub fn termination_requests(&self) -> usize {
        self.termination_requests.get()
    }
}

impl EncoderSpawner for MockEncoderSpawner {
    type Process = MockEncoderProcess;

    fn spawn(&self, cmd: &EncodeCommand) -> CoreResult<Self::Process> {
        self.received_calls.borrow_mut().push(cmd.to_argv());

        let next = self.script.borrow_mut().pop_front();
        let run = match next {
            Some(Scripted::Run(run)) => run,
            Some(Scripted::SpawnFailure) => {
                log::warn!("MockEncoderSpawner simulating spawn error for: {cmd}");
                return Err(command_start_error(
                    cmd.program(),
                    std::io::Error::new(std::io::ErrorKind::NotFound, "mock spawn failure"),
                ));
            }
            None => {
                log::error!("MockEncoderSpawner: No scripted run for command: {cmd}");
                panic!("MockEncoderSpawner: No scripted run for command: {cmd}");
            }
        };

        if run.create_output {
            let output = cmd.output();
            if let Some(parent) = output.parent() {
                if let Err(e) = std::fs::create_dir_all(parent) {
                    log::error!("MockEncoderSpawner failed to create parent dir {parent:?}: {e}");
                }
            }
            match std::fs::write(output, b"partial") {
                Ok(()) => log::info!("MockEncoderSpawner created dummy output file: {output:?}"),
                Err(e) => log::error!("MockEncoderSpawner failed to create {output:?}: {e}"),
            }
        }

        let (tx, rx) = mpsc::channel();
        for event in run.events {
            let _ = tx.send(event);
        }
        drop(tx);

        if let Some(flag) = &run.raise_on_spawn {
            flag.store(true, Ordering::SeqCst);
        }

        Ok(MockEncoderProcess {
            events: Some(rx),
            exit: run.exit,
            terminated: false,
            polls_since_termination: 0,
            failing_termination: run.failing_termination,
            termination_requests: Rc::clone(&self.termination_requests),
        })
    }
}

/// Mock implementation of MediaProber keyed by path.
#[derive(Clone, Default)]
pub struct MockMediaProber {
    results: Rc<RefCell<HashMap<PathBuf, Result<ProbedMetadata, ProbeFailure>>>>,
    probed: Rc<RefCell<Vec<PathBuf>>>,
}

impl MockMediaProber {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn expect(&self, path: &Path, result: Result<ProbedMetadata, ProbeFailure>) {
        self.results
            .borrow_mut()
            .insert(path.to_path_buf(), result);
    }

    pub fn probed_paths(&self) -> Vec<PathBuf> {
        self.probed.borrow().clone()
    }
}

impl MediaProber for MockMediaProber {
    fn probe(&self, path: &Path) -> Result<ProbedMetadata, ProbeFailure> {
        self.probed.borrow_mut().push(path.to_path_buf());
        match self.results.borrow().get(path) {
            Some(result) => result.clone(),
            None => {
                log::error!("MockMediaProber: No expectation set for path: {}", path.display());
                Err(ProbeFailure::FileMissing(path.to_path_buf()))
            }
        }
    }
}
