//! Media information and probing module
//!
//! This module provides the metadata model for one input file and the
//! ffprobe-backed adapter that fills it in.

pub mod metadata;
pub mod probe;

// Re-export commonly used types
pub use metadata::{AudioStream, ProbedMetadata, Tags, VideoStream};
pub use probe::{FfprobeProber, MediaProber, ProbeFailure, parse_ffprobe_output};
