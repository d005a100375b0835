//! Core library for batch re-encoding of video files with ffmpeg and ffprobe.
//!
//! Every input file is probed, compared against a target [`MediaProfile`],
//! and only re-encoded when something violates it. Streams that already
//! comply are copied instead of transcoded.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use reencode_core::{
//!     CommandSynthesizer, FfprobeProber, JobDriver, MediaProfile, SidecarSpawner,
//!     WorkerContext, WorkerOptions,
//! };
//! use reencode_core::discovery::{DiscoveryRequest, discover};
//! use std::path::PathBuf;
//! use std::sync::Arc;
//! use std::sync::atomic::AtomicBool;
//!
//! let found = discover(&DiscoveryRequest {
//!     input: PathBuf::from("/path/to/videos"),
//!     output: None,
//!     filelist: false,
//!     filter: None,
//! })
//! .unwrap();
//!
//! let prober = FfprobeProber::default();
//! let spawner = SidecarSpawner::default();
//! let synthesizer = CommandSynthesizer::default();
//! let profile = MediaProfile::default();
//! let ctx = WorkerContext {
//!     prober: &prober,
//!     spawner: &spawner,
//!     synthesizer: &synthesizer,
//!     profile: &profile,
//!     options: WorkerOptions::builder().remove(true).build(),
//!     interrupted: Arc::new(AtomicBool::new(false)),
//! };
//!
//! let summary = JobDriver::new(ctx, None).run(&found.jobs);
//! println!("{summary}");
//! ```

pub mod config;
pub mod criteria;
pub mod discovery;
pub mod error;
pub mod external;
pub mod media;
pub mod processing;
pub mod progress;
pub mod utils;

// Re-exports for public API
pub use config::{EncoderSettings, MediaProfile, WorkerOptions};
pub use criteria::{ViolationSet, evaluate};
pub use discovery::{Discovery, DiscoveryRequest, discover};
pub use error::{CoreError, CoreResult};
pub use external::{CommandSynthesizer, EncodeCommand, SidecarSpawner};
pub use media::{FfprobeProber, MediaProber, ProbeFailure, ProbedMetadata};
pub use processing::{BatchSummary, FileJob, JobDriver, Outcome, StopReason, WorkerContext};
pub use utils::{format_bytes, format_duration, parse_ffmpeg_time};
