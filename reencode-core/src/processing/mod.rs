//! Per-file processing and batch orchestration.
//!
//! - `worker`: the per-file state machine
//! - `policy`: what happens to the original after a successful encode
//! - `driver`: runs workers sequentially over a job list

pub mod driver;
pub mod policy;
pub mod worker;

pub use driver::{BatchSummary, FileJob, JobDriver, SkipCounts, StopReason};
pub use policy::{PolicyAction, apply_policy, replacement_path};
pub use worker::{Decision, Outcome, SkipReason, Worker, WorkerContext, WorkerState};
