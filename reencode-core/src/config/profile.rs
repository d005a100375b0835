//! Target media profile.
//!
//! A profile describes the audio and video characteristics a file must meet
//! to be left alone. Every field is optional: `None` means the attribute is
//! unconstrained and can never be reported as a violation.

use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Frame size as (width, height). Written as `[1920, 1080]` in profile files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "(u32, u32)", into = "(u32, u32)")]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Returns the resolution with width and height exchanged.
    pub const fn swapped(self) -> Self {
        Self {
            width: self.height,
            height: self.width,
        }
    }
}

impl From<(u32, u32)> for Resolution {
    fn from((width, height): (u32, u32)) -> Self {
        Self { width, height }
    }
}

impl From<Resolution> for (u32, u32) {
    fn from(resolution: Resolution) -> Self {
        (resolution.width, resolution.height)
    }
}

/// Audio constraints.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AudioProfile {
    /// Required codec name as reported by ffprobe (e.g. "aac")
    pub codec: Option<String>,
    /// Maximum sample rate in Hz
    pub sample_rate: Option<u32>,
    /// Maximum channel count
    pub channels: Option<u32>,
    /// Bitrate requested when re-encoding, in bits per second
    pub bitrate_target: Option<u64>,
    /// Bitrate above which a file is re-encoded, in bits per second
    pub bitrate_threshold: Option<u64>,
}

/// Video constraints.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VideoProfile {
    /// Required codec name as reported by ffprobe (e.g. "hevc")
    pub codec: Option<String>,
    /// Encoder passed to `-c:v` when the codec must change (e.g. "hevc_nvenc").
    /// Falls back to `codec` when unset.
    pub encoder_name: Option<String>,
    /// Maximum frame size in landscape orientation
    pub resolution: Option<Resolution>,
    /// Maximum frame rate
    pub fps: Option<f64>,
    /// Bitrate requested when re-encoding, in bits per second
    pub bitrate_target: Option<u64>,
    /// Bitrate above which a file is re-encoded, in bits per second
    pub bitrate_threshold: Option<u64>,
}

/// Complete target profile for a run.
///
/// `MediaProfile::default()` is the built-in criteria set. Profiles loaded
/// from a file replace it entirely, so a missing table in the file leaves
/// that whole category unconstrained.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MediaProfile {
    #[serde(default)]
    pub audio: AudioProfile,
    #[serde(default)]
    pub video: VideoProfile,
}

impl Default for MediaProfile {
    fn default() -> Self {
        Self {
            audio: AudioProfile {
                codec: Some("aac".to_string()),
                sample_rate: Some(48_000),
                channels: Some(2),
                bitrate_target: Some(192_000),
                bitrate_threshold: Some(192_000),
            },
            video: VideoProfile {
                codec: Some("hevc".to_string()),
                encoder_name: None,
                resolution: Some(Resolution::new(1920, 1080)),
                fps: Some(30.0),
                bitrate_target: None,
                bitrate_threshold: None,
            },
        }
    }
}

impl MediaProfile {
    /// A profile with no constraints at all. Every file evaluates as compliant.
    pub fn unconstrained() -> Self {
        Self {
            audio: AudioProfile::default(),
            video: VideoProfile::default(),
        }
    }

    /// Parses a profile from TOML text.
    pub fn from_toml_str(text: &str) -> CoreResult<Self> {
        let profile: Self =
            toml::from_str(text).map_err(|e| CoreError::Config(e.to_string()))?;
        profile.validate()?;
        Ok(profile)
    }

    /// Loads a profile from a TOML file.
    pub fn load(path: &Path) -> CoreResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            CoreError::Config(format!("Failed to read profile '{}': {e}", path.display()))
        })?;
        Self::from_toml_str(&text)
    }

    /// Rejects values that could never be met or encoded.
    pub fn validate(&self) -> CoreResult<()> {
        if let Some(resolution) = self.video.resolution {
            if resolution.width == 0 || resolution.height == 0 {
                return Err(CoreError::Config(format!(
                    "video resolution must be non-zero, got {}x{}",
                    resolution.width, resolution.height
                )));
            }
        }
        if let Some(fps) = self.video.fps {
            if !fps.is_finite() || fps <= 0.0 {
                return Err(CoreError::Config(format!(
                    "video fps must be positive, got {fps}"
                )));
            }
        }
        if self.audio.channels == Some(0) {
            return Err(CoreError::Config("audio channels must be non-zero".to_string()));
        }
        if self.audio.sample_rate == Some(0) {
            return Err(CoreError::Config("audio sample_rate must be non-zero".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_profile_matches_builtin_criteria() {
        let profile = MediaProfile::default();
        assert_eq!(profile.audio.codec.as_deref(), Some("aac"));
        assert_eq!(profile.audio.sample_rate, Some(48_000));
        assert_eq!(profile.audio.channels, Some(2));
        assert_eq!(profile.audio.bitrate_threshold, Some(192_000));
        assert_eq!(profile.video.codec.as_deref(), Some("hevc"));
        assert_eq!(profile.video.resolution, Some(Resolution::new(1920, 1080)));
        assert_eq!(profile.video.fps, Some(30.0));
        assert_eq!(profile.video.bitrate_threshold, None);
    }

    #[test]
    fn test_profile_from_toml() {
        let text = r#"
[audio]
codec = "opus"
bitrate_target = 128000
bitrate_threshold = 160000

[video]
codec = "hevc"
encoder_name = "hevc_nvenc"
resolution = [1280, 720]
"#;
        let profile = MediaProfile::from_toml_str(text).unwrap();
        assert_eq!(profile.audio.codec.as_deref(), Some("opus"));
        assert_eq!(profile.audio.sample_rate, None);
        assert_eq!(profile.audio.bitrate_target, Some(128_000));
        assert_eq!(profile.video.encoder_name.as_deref(), Some("hevc_nvenc"));
        assert_eq!(profile.video.resolution, Some(Resolution::new(1280, 720)));
        assert_eq!(profile.video.fps, None);
    }

    #[test]
    fn test_missing_table_is_unconstrained() {
        let profile = MediaProfile::from_toml_str("[video]\nfps = 25.0\n").unwrap();
        assert_eq!(profile.audio, AudioProfile::default());
        assert_eq!(profile.video.fps, Some(25.0));
    }

    #[test]
    fn test_invalid_profiles_rejected() {
        assert!(MediaProfile::from_toml_str("[video]\nresolution = [0, 1080]\n").is_err());
        assert!(MediaProfile::from_toml_str("[video]\nfps = -1.0\n").is_err());
        assert!(MediaProfile::from_toml_str("[audio]\nchannels = 0\n").is_err());
        assert!(MediaProfile::from_toml_str("[audio]\nvolume = 3\n").is_err());
    }
}
