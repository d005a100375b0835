//! Utility functions for formatting and file operations.
//!
//! This module provides general-purpose helpers used throughout the
//! reencode-core library: duration and byte formatting, encoder timestamp
//! parsing and size comparison.

use std::path::Path;

const BYTE_UNITS: [&str; 9] = ["B", "KiB", "MiB", "GiB", "TiB", "PiB", "EiB", "ZiB", "YiB"];

/// Formats seconds as HH:MM:SS (e.g., 3725.0 -> "01:02:05"). Returns "??:??:??" for invalid inputs.
#[must_use]
pub fn format_duration(seconds: f64) -> String {
    if seconds < 0.0 || !seconds.is_finite() {
        return "??:??:??".to_string();
    }

    let total_seconds = seconds as u64;
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let secs = total_seconds % 60;
    format!("{hours:02}:{minutes:02}:{secs:02}")
}

/// Formats a signed byte count with binary prefixes.
///
/// The largest unit keeping the magnitude at or above 1 is used. Three
/// significant-ish digits are kept: no decimals from 100 up, one decimal from
/// 10 up, two below that. Takes `i128` so sizes past the exbibyte range still
/// reach ZiB and YiB; anything larger stays in YiB.
#[must_use]
pub fn format_bytes(bytes: i128) -> String {
    let mut value = bytes as f64;
    let mut unit = 0;
    while value.abs() >= 1024.0 && unit < BYTE_UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    let magnitude = value.abs();
    let suffix = BYTE_UNITS[unit];
    if magnitude >= 100.0 {
        format!("{value:.0} {suffix}")
    } else if magnitude >= 10.0 {
        format!("{value:.1} {suffix}")
    } else {
        format!("{value:.2} {suffix}")
    }
}

/// Parses FFmpeg time string (HH:MM:SS.MS) to seconds. Returns None if invalid.
#[must_use]
pub fn parse_ffmpeg_time(time: &str) -> Option<f64> {
    let parts: Vec<&str> = time.split(':').collect();
    if parts.len() == 3 {
        let hours = parts[0].parse::<f64>().ok()?;
        let minutes = parts[1].parse::<f64>().ok()?;
        let seconds = parts[2].parse::<f64>().ok()?;
        Some(hours * 3600.0 + minutes * 60.0 + seconds)
    } else {
        None
    }
}

/// Output size as a multiple of the input size. None when the input is empty.
#[must_use]
pub fn size_ratio(input_size: u64, output_size: u64) -> Option<f64> {
    if input_size == 0 {
        None
    } else {
        Some(output_size as f64 / input_size as f64)
    }
}

/// Bytes saved by the encode; negative when the output grew.
#[must_use]
pub fn bytes_saved(input_size: u64, output_size: u64) -> i64 {
    input_size as i64 - output_size as i64
}

/// Renders a ratio as `0.42x`, or `n/a` when it is undefined.
#[must_use]
pub fn format_ratio(ratio: Option<f64>) -> String {
    match ratio {
        Some(r) => format!("{r:.2}x"),
        None => "n/a".to_string(),
    }
}

/// Size of a file in bytes, or 0 when it cannot be read.
pub fn file_size_or_zero(path: &Path) -> u64 {
    match std::fs::metadata(path) {
        Ok(meta) => meta.len(),
        Err(e) => {
            log::debug!("Could not stat {}: {}", path.display(), e);
            0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(0.0), "00:00:00");
        assert_eq!(format_duration(59.0), "00:00:59");
        assert_eq!(format_duration(3661.0), "01:01:01");
        assert_eq!(format_duration(90061.0), "25:01:01");

        // Fractional seconds truncate
        assert_eq!(format_duration(59.9), "00:00:59");

        assert_eq!(format_duration(-1.0), "??:??:??");
        assert_eq!(format_duration(f64::NAN), "??:??:??");
    }

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(0), "0.00 B");
        assert_eq!(format_bytes(1), "1.00 B");
        assert_eq!(format_bytes(10), "10.0 B");
        assert_eq!(format_bytes(100), "100 B");
        assert_eq!(format_bytes(1023), "1023 B");

        assert_eq!(format_bytes(1024), "1.00 KiB");
        assert_eq!(format_bytes(1536), "1.50 KiB");
        assert_eq!(format_bytes(15 * 1024), "15.0 KiB");
        assert_eq!(format_bytes(150 * 1024), "150 KiB");

        assert_eq!(format_bytes(1024 * 1024), "1.00 MiB");
        assert_eq!(format_bytes(1024 * 1024 * 1024), "1.00 GiB");
        assert_eq!(format_bytes(1 << 40), "1.00 TiB");
        assert_eq!(format_bytes(1 << 60), "1.00 EiB");
        assert_eq!(format_bytes(i128::from(i64::MAX)), "8.00 EiB");
    }

    #[test]
    fn test_format_bytes_largest_units() {
        assert_eq!(format_bytes(1 << 70), "1.00 ZiB");
        assert_eq!(format_bytes(1 << 80), "1.00 YiB");
        assert_eq!(format_bytes(3 << 85), "96.0 YiB");
        assert_eq!(format_bytes(1 << 90), "1024 YiB");
        assert_eq!(format_bytes(-(1 << 90)), "-1024 YiB");
    }

    #[test]
    fn test_format_bytes_negative() {
        assert_eq!(format_bytes(-1024), "-1.00 KiB");
        assert_eq!(format_bytes(-100), "-100 B");
        assert_eq!(format_bytes(-1536), "-1.50 KiB");
        assert_eq!(format_bytes(i128::from(i64::MIN)), "-8.00 EiB");
    }

    #[test]
    fn test_parse_ffmpeg_time() {
        assert_eq!(parse_ffmpeg_time("00:00:00"), Some(0.0));
        assert_eq!(parse_ffmpeg_time("01:02:03"), Some(3723.0));
        assert_eq!(parse_ffmpeg_time("00:00:01.25"), Some(1.25));
        assert_eq!(parse_ffmpeg_time("01:30:45.75"), Some(5445.75));

        assert_eq!(parse_ffmpeg_time(""), None);
        assert_eq!(parse_ffmpeg_time("00:00"), None);
        assert_eq!(parse_ffmpeg_time("00:00:00:00"), None);
        assert_eq!(parse_ffmpeg_time("aa:bb:cc"), None);
    }

    #[test]
    fn test_size_comparison() {
        assert_eq!(size_ratio(1000, 250), Some(0.25));
        assert_eq!(size_ratio(0, 250), None);
        assert_eq!(format_ratio(size_ratio(1000, 420)), "0.42x");
        assert_eq!(format_ratio(size_ratio(100, 150)), "1.50x");
        assert_eq!(format_ratio(None), "n/a");

        assert_eq!(bytes_saved(1000, 250), 750);
        assert_eq!(bytes_saved(100, 150), -50);
    }

    #[test]
    fn test_file_size_or_zero() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clip.mkv");
        std::fs::write(&path, vec![0u8; 2048]).unwrap();

        assert_eq!(file_size_or_zero(&path), 2048);
        assert_eq!(file_size_or_zero(&dir.path().join("missing.mkv")), 0);
    }
}
