// ============================================================================
// reencode-core/src/external/ffmpeg.rs
// ============================================================================
//
// FFMPEG COMMAND SYNTHESIS: From Violations to Arguments
//
// Turns a ViolationSet into the exact ffmpeg argument vector for one file.
// Only the streams that violate the profile are re-encoded; the others are
// stream-copied, and a fully compliant set degrades to a plain remux.
//
// ARGUMENT ORDER:
// program, global flags, hardware acceleration, input, audio directives,
// video directives, tag directives, output path.

use crate::config::{EncoderSettings, MediaProfile};
use crate::criteria::ViolationSet;
use crate::media::ProbedMetadata;
use std::fmt;
use std::path::{Path, PathBuf};

/// A fully built encoder invocation. Consumed once by the spawner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodeCommand {
    program: String,
    args: Vec<String>,
    output: PathBuf,
}

impl EncodeCommand {
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Arguments after the program name.
    pub fn args(&self) -> &[String] {
        &self.args
    }

    pub fn output(&self) -> &Path {
        &self.output
    }

    /// Program followed by all arguments.
    pub fn to_argv(&self) -> Vec<String> {
        std::iter::once(self.program.clone())
            .chain(self.args.iter().cloned())
            .collect()
    }
}

impl fmt::Display for EncodeCommand {
    /// Shell-like rendering for logs. Not meant to be pasted into a shell
    /// verbatim; only arguments containing whitespace or quotes are quoted.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            if arg.is_empty() || arg.contains(|c: char| c.is_whitespace() || c == '"' || c == '\'') {
                write!(f, " \"{}\"", arg.replace('"', "\\\""))?;
            } else {
                write!(f, " {arg}")?;
            }
        }
        Ok(())
    }
}

/// Splits a file stem of the form `Author - Title` on the first separator.
///
/// Returns `None` when there is no separator or the title part is empty.
pub fn parse_tags(stem: &str) -> Option<(String, String)> {
    let (author, title) = stem.split_once(" - ")?;
    let title = title.trim();
    if title.is_empty() {
        return None;
    }
    Some((author.trim().to_string(), title.to_string()))
}

/// Builds encoder commands for one encoder configuration.
#[derive(Debug, Clone, Default)]
pub struct CommandSynthesizer {
    settings: EncoderSettings,
}

impl CommandSynthesizer {
    pub fn new(settings: EncoderSettings) -> Self {
        Self { settings }
    }

    pub fn synthesize(
        &self,
        input: &Path,
        output: &Path,
        metadata: &ProbedMetadata,
        violations: ViolationSet,
        profile: &MediaProfile,
    ) -> EncodeCommand {
        let mut args = vec!["-hide_banner".to_string(), "-y".to_string()];

        if let Some(hwaccel) = &self.settings.hwaccel {
            push_pair(&mut args, "-hwaccel", hwaccel.as_str());
            push_pair(&mut args, "-hwaccel_output_format", hwaccel.as_str());
        }

        push_pair(&mut args, "-i", input.to_string_lossy());

        if violations.is_empty() {
            push_pair(&mut args, "-c", "copy");
        } else {
            push_audio_args(&mut args, metadata, violations, profile);
            push_video_args(&mut args, metadata, violations, profile);
        }

        if let Some((author, title)) = input
            .file_stem()
            .map(|s| s.to_string_lossy())
            .and_then(|stem| parse_tags(&stem))
        {
            push_pair(&mut args, "-metadata", format!("artist={author}"));
            push_pair(&mut args, "-metadata", format!("title={title}"));
        }

        args.push(output.to_string_lossy().into_owned());

        EncodeCommand {
            program: self.settings.ffmpeg_program.clone(),
            args,
            output: output.to_path_buf(),
        }
    }
}

/// Builds the encoder command with the default encoder settings.
pub fn synthesize(
    input: &Path,
    output: &Path,
    metadata: &ProbedMetadata,
    violations: ViolationSet,
    profile: &MediaProfile,
) -> EncodeCommand {
    CommandSynthesizer::default().synthesize(input, output, metadata, violations, profile)
}

fn push_pair(args: &mut Vec<String>, flag: &str, value: impl Into<String>) {
    args.push(flag.to_string());
    args.push(value.into());
}

fn push_audio_args(
    args: &mut Vec<String>,
    metadata: &ProbedMetadata,
    violations: ViolationSet,
    profile: &MediaProfile,
) {
    if !violations.intersects(ViolationSet::ANY_AUDIO) {
        push_pair(args, "-c:a", "copy");
        return;
    }

    let audio = &profile.audio;
    if violations.contains(ViolationSet::AUDIO_CODEC) {
        let codec = audio.codec.as_deref().unwrap_or(&metadata.audio.codec);
        push_pair(args, "-c:a", codec.to_string());
    }
    if violations.contains(ViolationSet::AUDIO_SAMPLE_RATE) {
        if let Some(rate) = audio.sample_rate {
            push_pair(args, "-ar", rate.to_string());
        }
    }
    if violations.contains(ViolationSet::AUDIO_CHANNELS) {
        if let Some(channels) = audio.channels {
            push_pair(args, "-ac", channels.to_string());
        }
    }
    if violations.contains(ViolationSet::AUDIO_BITRATE) {
        if let Some(bitrate) = audio.bitrate_target.or(audio.bitrate_threshold) {
            push_pair(args, "-b:a", bitrate.to_string());
        }
    }
}

fn push_video_args(
    args: &mut Vec<String>,
    metadata: &ProbedMetadata,
    violations: ViolationSet,
    profile: &MediaProfile,
) {
    if !violations.intersects(ViolationSet::ANY_VIDEO) {
        push_pair(args, "-c:v", "copy");
        return;
    }

    let video = &profile.video;
    if violations.contains(ViolationSet::VIDEO_CODEC) {
        let encoder = video
            .encoder_name
            .as_deref()
            .or(video.codec.as_deref())
            .unwrap_or(&metadata.video.codec);
        push_pair(args, "-c:v", encoder.to_string());
    }
    if violations.contains(ViolationSet::VIDEO_RESOLUTION) {
        if let Some(target) = video.resolution {
            let target = if metadata.video.is_portrait() {
                target.swapped()
            } else {
                target
            };
            push_pair(args, "-vf", format!("scale={}:{}", target.width, target.height));
        }
    }
    if violations.contains(ViolationSet::VIDEO_FPS) {
        if let Some(fps) = video.fps {
            push_pair(args, "-r", fps.to_string());
        }
    }
    if violations.contains(ViolationSet::VIDEO_BITRATE) {
        if let Some(bitrate) = video.bitrate_target.or(video.bitrate_threshold) {
            push_pair(args, "-b:v", bitrate.to_string());
        }
    }
}
