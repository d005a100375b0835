//! FFprobe integration for media analysis.
//!
//! Runs `ffprobe -v error -print_format json -show_format -show_streams` and
//! maps the first audio and first video stream into [`ProbedMetadata`].
//! Numeric fields that are missing or malformed default to zero; ffprobe
//! reports most of them as strings.

use super::metadata::{AudioStream, ProbedMetadata, Tags, VideoStream, calc_aspect_ratio, parse_frame_rate};
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::process::Command;
use thiserror::Error;

/// Why a file could not be probed. Any of these makes the worker skip the file.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProbeFailure {
    #[error("File not found: {0}")]
    FileMissing(PathBuf),

    #[error("No audio stream found")]
    NoAudioStream,

    #[error("No video stream found")]
    NoVideoStream,

    #[error("ffprobe failed: {0}")]
    ProbeProcess(String),
}

/// Trait for anything that can turn a path into stream metadata.
pub trait MediaProber {
    fn probe(&self, path: &Path) -> Result<ProbedMetadata, ProbeFailure>;
}

/// Concrete implementation of `MediaProber` that shells out to ffprobe.
#[derive(Debug, Clone)]
pub struct FfprobeProber {
    program: String,
}

impl FfprobeProber {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for FfprobeProber {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_FFPROBE_PROGRAM)
    }
}

impl MediaProber for FfprobeProber {
    fn probe(&self, path: &Path) -> Result<ProbedMetadata, ProbeFailure> {
        if !path.is_file() {
            return Err(ProbeFailure::FileMissing(path.to_path_buf()));
        }

        log::debug!("Running {} on: {}", self.program, path.display());
        let output = Command::new(&self.program)
            .args([
                "-v",
                "error",
                "-print_format",
                "json",
                "-show_format",
                "-show_streams",
            ])
            .arg(path)
            .output()
            .map_err(|e| ProbeFailure::ProbeProcess(format!("failed to start {}: {e}", self.program)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ProbeFailure::ProbeProcess(format!(
                "{} exited with {}: {}",
                self.program,
                output.status,
                stderr.trim()
            )));
        }

        parse_ffprobe_output(path, &String::from_utf8_lossy(&output.stdout))
    }
}

// --- Raw ffprobe JSON ---

#[derive(Debug, Default, Deserialize)]
struct FfprobeOutput {
    #[serde(default)]
    streams: Vec<FfprobeStream>,
    #[serde(default)]
    format: FfprobeFormat,
}

#[derive(Debug, Default, Deserialize)]
struct FfprobeFormat {
    #[serde(default, deserialize_with = "lenient_f64")]
    duration: f64,
    #[serde(default, deserialize_with = "lenient_u64")]
    size: u64,
    #[serde(default)]
    tags: Tags,
}

#[derive(Debug, Default, Deserialize)]
struct FfprobeStream {
    #[serde(default)]
    codec_type: String,
    #[serde(default)]
    codec_name: String,
    #[serde(default, deserialize_with = "lenient_u64")]
    width: u64,
    #[serde(default, deserialize_with = "lenient_u64")]
    height: u64,
    #[serde(default)]
    r_frame_rate: String,
    #[serde(default, deserialize_with = "lenient_u64")]
    sample_rate: u64,
    #[serde(default, deserialize_with = "lenient_u64")]
    channels: u64,
    #[serde(default, deserialize_with = "lenient_u64")]
    bit_rate: u64,
    #[serde(default)]
    tags: Tags,
}

fn lenient_f64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => s.trim().parse().unwrap_or(0.0),
        _ => 0.0,
    })
}

fn lenient_u64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    let value = lenient_f64(deserializer)?;
    if value.is_finite() && value > 0.0 {
        Ok(value as u64)
    } else {
        Ok(0)
    }
}

fn to_u32(value: u64) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}

/// Parses ffprobe JSON into metadata for `path`.
pub fn parse_ffprobe_output(path: &Path, json: &str) -> Result<ProbedMetadata, ProbeFailure> {
    let output: FfprobeOutput = serde_json::from_str(json)
        .map_err(|e| ProbeFailure::ProbeProcess(format!("invalid ffprobe JSON: {e}")))?;

    let mut audio = None;
    let mut video = None;
    for stream in output.streams {
        match stream.codec_type.as_str() {
            "audio" if audio.is_none() => audio = Some(stream),
            "video" if video.is_none() => video = Some(stream),
            _ => {}
        }
        if audio.is_some() && video.is_some() {
            break;
        }
    }

    let video = video.ok_or(ProbeFailure::NoVideoStream)?;
    let audio = audio.ok_or(ProbeFailure::NoAudioStream)?;

    let width = to_u32(video.width);
    let height = to_u32(video.height);

    Ok(ProbedMetadata {
        path: path.to_path_buf(),
        file_size: output.format.size,
        duration: output.format.duration,
        audio: AudioStream {
            codec: audio.codec_name,
            sample_rate: to_u32(audio.sample_rate),
            channels: to_u32(audio.channels),
            bitrate: audio.bit_rate,
            tags: audio.tags,
        },
        video: VideoStream {
            codec: video.codec_name,
            width,
            height,
            aspect_ratio: calc_aspect_ratio(width, height),
            frame_rate: parse_frame_rate(&video.r_frame_rate).unwrap_or(0.0),
            bitrate: video.bit_rate,
            tags: video.tags,
        },
        tags: output.format.tags,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "streams": [
            {"index": 0, "codec_type": "video", "codec_name": "h264", "width": 1920, "height": 1080,
             "r_frame_rate": "30000/1001", "bit_rate": "4500000", "tags": {"language": "und"}},
            {"index": 1, "codec_type": "audio", "codec_name": "aac", "sample_rate": "48000",
             "channels": 2, "bit_rate": "192000"},
            {"index": 2, "codec_type": "audio", "codec_name": "ac3", "sample_rate": "48000", "channels": 6}
        ],
        "format": {"filename": "clip.mkv", "duration": "61.500000", "size": "1048576",
                   "tags": {"title": "Clip"}}
    }"#;

    #[test]
    fn test_parse_picks_first_streams() {
        let meta = parse_ffprobe_output(Path::new("clip.mkv"), SAMPLE).unwrap();
        assert_eq!(meta.file_size, 1_048_576);
        assert_eq!(meta.duration, 61.5);
        assert_eq!(meta.audio.codec, "aac");
        assert_eq!(meta.audio.channels, 2);
        assert_eq!(meta.audio.sample_rate, 48_000);
        assert_eq!(meta.audio.bitrate, 192_000);
        assert_eq!(meta.video.codec, "h264");
        assert_eq!(meta.video.aspect_ratio, "16:9");
        assert!((meta.video.frame_rate - 29.97).abs() < 0.01);
        assert_eq!(meta.video.tags.get("language").map(String::as_str), Some("und"));
        assert_eq!(meta.tags.get("title").map(String::as_str), Some("Clip"));
    }

    #[test]
    fn test_missing_numbers_default_to_zero() {
        let json = r#"{"streams": [
            {"codec_type": "video", "codec_name": "hevc", "width": 1280, "height": 720, "bit_rate": "N/A"},
            {"codec_type": "audio", "codec_name": "opus"}
        ], "format": {}}"#;
        let meta = parse_ffprobe_output(Path::new("a.mkv"), json).unwrap();
        assert_eq!(meta.video.bitrate, 0);
        assert_eq!(meta.video.frame_rate, 0.0);
        assert_eq!(meta.audio.sample_rate, 0);
        assert_eq!(meta.audio.bitrate, 0);
        assert_eq!(meta.duration, 0.0);
        assert_eq!(meta.file_size, 0);
    }

    #[test]
    fn test_missing_streams() {
        let video_only = r#"{"streams": [{"codec_type": "video", "codec_name": "h264"}]}"#;
        assert_eq!(
            parse_ffprobe_output(Path::new("v.mkv"), video_only),
            Err(ProbeFailure::NoAudioStream)
        );

        let audio_only = r#"{"streams": [{"codec_type": "audio", "codec_name": "aac"}]}"#;
        assert_eq!(
            parse_ffprobe_output(Path::new("a.mkv"), audio_only),
            Err(ProbeFailure::NoVideoStream)
        );
    }

    #[test]
    fn test_invalid_json() {
        assert!(matches!(
            parse_ffprobe_output(Path::new("x.mkv"), "not json"),
            Err(ProbeFailure::ProbeProcess(_))
        ));
    }

    #[test]
    fn test_missing_file() {
        let prober = FfprobeProber::default();
        let path = Path::new("/definitely/not/here.mkv");
        assert_eq!(
            prober.probe(path),
            Err(ProbeFailure::FileMissing(path.to_path_buf()))
        );
    }
}
