use crate::config::Resolution;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Free-form key/value tags as reported by ffprobe.
pub type Tags = BTreeMap<String, String>;

/// First audio stream of a file.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AudioStream {
    pub codec: String,
    /// Hz
    pub sample_rate: u32,
    pub channels: u32,
    /// bits per second
    pub bitrate: u64,
    pub tags: Tags,
}

/// First video stream of a file.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct VideoStream {
    pub codec: String,
    pub width: u32,
    pub height: u32,
    /// Reduced `W:H` string, e.g. "16:9"
    pub aspect_ratio: String,
    pub frame_rate: f64,
    /// bits per second
    pub bitrate: u64,
    pub tags: Tags,
}

impl VideoStream {
    pub fn new(codec: impl Into<String>, width: u32, height: u32, frame_rate: f64, bitrate: u64) -> Self {
        Self {
            codec: codec.into(),
            width,
            height,
            aspect_ratio: calc_aspect_ratio(width, height),
            frame_rate,
            bitrate,
            tags: Tags::new(),
        }
    }

    pub fn is_portrait(&self) -> bool {
        self.width < self.height
    }

    /// Frame size rotated to landscape orientation.
    pub fn landscape_resolution(&self) -> Resolution {
        let resolution = Resolution::new(self.width, self.height);
        if self.is_portrait() {
            resolution.swapped()
        } else {
            resolution
        }
    }
}

/// Everything the evaluator and synthesizer need to know about one file.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProbedMetadata {
    pub path: PathBuf,
    /// bytes
    pub file_size: u64,
    /// seconds
    pub duration: f64,
    pub audio: AudioStream,
    pub video: VideoStream,
    /// Container level tags
    pub tags: Tags,
}

/// Reduces `width:height` by their greatest common divisor.
pub fn calc_aspect_ratio(width: u32, height: u32) -> String {
    let divisor = gcd(width, height);
    if divisor == 0 {
        return format!("{width}:{height}");
    }
    format!("{}:{}", width / divisor, height / divisor)
}

fn gcd(mut a: u32, mut b: u32) -> u32 {
    while b != 0 {
        let t = a % b;
        a = b;
        b = t;
    }
    a
}

/// Parses ffprobe's rational `r_frame_rate` ("30000/1001") or a plain number.
/// Returns None for malformed input or a zero denominator.
pub fn parse_frame_rate(rate: &str) -> Option<f64> {
    match rate.split_once('/') {
        Some((num, den)) => {
            let num: f64 = num.trim().parse().ok()?;
            let den: f64 = den.trim().parse().ok()?;
            (den != 0.0).then(|| num / den)
        }
        None => rate.trim().parse().ok(),
    }
}
