// ============================================================================
// reencode-core/src/criteria.rs
// ============================================================================
//
// CRITERIA EVALUATION: Profile Compliance Checks
//
// Compares probed stream metadata against the target MediaProfile and
// reports every failed attribute as one bit of a ViolationSet. The
// evaluator is pure: the same metadata and profile always give the same
// set, and nothing is read from disk.

use crate::config::MediaProfile;
use crate::media::ProbedMetadata;
use std::fmt;
use std::ops::{BitAnd, BitOr, BitOrAssign, Not};

/// Bitmask of the ways a file fails its profile.
///
/// Only the leaf kinds are ever set by [`evaluate`]. The `ANY_*` groupings
/// exist for intersection tests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ViolationSet(u8);

impl ViolationSet {
    pub const NONE: Self = Self(0);

    pub const AUDIO_CODEC: Self = Self(1 << 0);
    pub const AUDIO_SAMPLE_RATE: Self = Self(1 << 1);
    pub const AUDIO_CHANNELS: Self = Self(1 << 2);
    pub const AUDIO_BITRATE: Self = Self(1 << 3);
    pub const VIDEO_CODEC: Self = Self(1 << 4);
    pub const VIDEO_RESOLUTION: Self = Self(1 << 5);
    pub const VIDEO_FPS: Self = Self(1 << 6);
    pub const VIDEO_BITRATE: Self = Self(1 << 7);

    pub const ANY_AUDIO: Self = Self(
        Self::AUDIO_CODEC.0 | Self::AUDIO_SAMPLE_RATE.0 | Self::AUDIO_CHANNELS.0 | Self::AUDIO_BITRATE.0,
    );
    pub const ANY_VIDEO: Self = Self(
        Self::VIDEO_CODEC.0 | Self::VIDEO_RESOLUTION.0 | Self::VIDEO_FPS.0 | Self::VIDEO_BITRATE.0,
    );
    pub const ANY: Self = Self(Self::ANY_AUDIO.0 | Self::ANY_VIDEO.0);

    const LEAVES: [(Self, &'static str); 8] = [
        (Self::AUDIO_CODEC, "AUDIO_CODEC"),
        (Self::AUDIO_SAMPLE_RATE, "AUDIO_SAMPLE_RATE"),
        (Self::AUDIO_CHANNELS, "AUDIO_CHANNELS"),
        (Self::AUDIO_BITRATE, "AUDIO_BITRATE"),
        (Self::VIDEO_CODEC, "VIDEO_CODEC"),
        (Self::VIDEO_RESOLUTION, "VIDEO_RESOLUTION"),
        (Self::VIDEO_FPS, "VIDEO_FPS"),
        (Self::VIDEO_BITRATE, "VIDEO_BITRATE"),
    ];

    pub const fn bits(self) -> u8 {
        self.0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// True when every bit of `other` is set in `self`.
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// True when `self` and `other` share at least one bit.
    pub const fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    /// Names of the leaf kinds set in `self`, in declaration order.
    pub fn leaf_names(self) -> impl Iterator<Item = &'static str> {
        Self::LEAVES
            .into_iter()
            .filter(move |(leaf, _)| self.contains(*leaf))
            .map(|(_, name)| name)
    }
}

impl BitOr for ViolationSet {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for ViolationSet {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for ViolationSet {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self {
        Self(self.0 & rhs.0)
    }
}

impl Not for ViolationSet {
    type Output = Self;

    fn not(self) -> Self {
        Self(!self.0)
    }
}

impl fmt::Display for ViolationSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("NONE");
        }
        let names: Vec<&str> = self.leaf_names().collect();
        f.write_str(&names.join("|"))
    }
}

/// Checks `metadata` against every configured field of `profile`.
///
/// Codecs must match exactly. Sample rate, channels, fps and bitrate fail
/// when strictly greater than the limit; bitrate is compared against the
/// threshold, never the target. Resolution is compared in landscape
/// orientation so portrait sources are not penalised for being tall.
pub fn evaluate(metadata: &ProbedMetadata, profile: &MediaProfile) -> ViolationSet {
    let mut violations = ViolationSet::NONE;
    let audio = &metadata.audio;
    let video = &metadata.video;

    if let Some(codec) = &profile.audio.codec {
        if audio.codec != *codec {
            violations |= ViolationSet::AUDIO_CODEC;
        }
    }
    if let Some(sample_rate) = profile.audio.sample_rate {
        if audio.sample_rate > sample_rate {
            violations |= ViolationSet::AUDIO_SAMPLE_RATE;
        }
    }
    if let Some(channels) = profile.audio.channels {
        if audio.channels > channels {
            violations |= ViolationSet::AUDIO_CHANNELS;
        }
    }
    if let Some(threshold) = profile.audio.bitrate_threshold {
        if audio.bitrate > threshold {
            violations |= ViolationSet::AUDIO_BITRATE;
        }
    }

    if let Some(codec) = &profile.video.codec {
        if video.codec != *codec {
            violations |= ViolationSet::VIDEO_CODEC;
        }
    }
    if let Some(limit) = profile.video.resolution {
        let actual = video.landscape_resolution();
        if actual.width > limit.width || actual.height > limit.height {
            violations |= ViolationSet::VIDEO_RESOLUTION;
        }
    }
    if let Some(fps) = profile.video.fps {
        if video.frame_rate > fps {
            violations |= ViolationSet::VIDEO_FPS;
        }
    }
    if let Some(threshold) = profile.video.bitrate_threshold {
        if video.bitrate > threshold {
            violations |= ViolationSet::VIDEO_BITRATE;
        }
    }

    log::debug!(
        "Evaluated {}: {}",
        metadata.path.display(),
        violations
    );
    violations
}
