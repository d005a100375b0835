//! External tool integration.
//!
//! Command synthesis and process supervision for ffmpeg. Probing lives in
//! [`crate::media`].

pub mod ffmpeg;
pub mod ffmpeg_executor;
pub mod mocks;

pub use ffmpeg::{CommandSynthesizer, EncodeCommand, parse_tags, synthesize};
pub use ffmpeg_executor::{
    EncoderEvent, EncoderProcess, EncoderSpawner, SidecarProcess, SidecarSpawner,
};
