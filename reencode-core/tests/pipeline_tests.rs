// reencode-core/tests/pipeline_tests.rs
//
// ffprobe JSON -> evaluate -> synthesize, without spawning anything.

use reencode_core::config::{MediaProfile, Resolution};
use reencode_core::criteria::{ViolationSet, evaluate};
use reencode_core::external::synthesize;
use reencode_core::media::{ProbeFailure, parse_ffprobe_output};
use std::path::Path;

fn ffprobe_json(audio: &str, video: &str) -> String {
    format!(
        r#"{{
            "streams": [
                {{"index": 0, "codec_type": "video", {video}}},
                {{"index": 1, "codec_type": "audio", {audio}}}
            ],
            "format": {{
                "filename": "in.mkv",
                "duration": "1325.440000",
                "size": "734003200",
                "tags": {{"title": "Example"}}
            }}
        }}"#
    )
}

const STEREO_AAC: &str =
    r#""codec_name": "aac", "sample_rate": "48000", "channels": 2, "bit_rate": "128000""#;
const HEVC_1080P: &str = r#""codec_name": "hevc", "width": 1920, "height": 1080, "r_frame_rate": "24000/1001", "bit_rate": "4000000""#;

fn args_after_input(argv: &[String]) -> Vec<&str> {
    let start = argv.iter().position(|a| a == "-i").unwrap() + 2;
    argv[start..argv.len() - 1].iter().map(String::as_str).collect()
}

#[test]
fn test_compliant_file_is_copied() {
    let input = Path::new("/videos/in.mkv");
    let metadata = parse_ffprobe_output(input, &ffprobe_json(STEREO_AAC, HEVC_1080P)).unwrap();
    assert_eq!(metadata.file_size, 734_003_200);
    assert!((metadata.video.frame_rate - 23.976).abs() < 0.001);

    let profile = MediaProfile::default();
    let violations = evaluate(&metadata, &profile);
    assert!(violations.is_empty());

    let cmd = synthesize(input, Path::new("/out/in.mp4"), &metadata, violations, &profile);
    assert_eq!(args_after_input(cmd.args()), vec!["-c", "copy"]);
    assert_eq!(cmd.args().last().map(String::as_str), Some("/out/in.mp4"));
}

#[test]
fn test_surround_h264_is_reencoded() {
    let audio = r#""codec_name": "ac3", "sample_rate": "48000", "channels": 6, "bit_rate": "448000""#;
    let video = r#""codec_name": "h264", "width": 3840, "height": 2160, "r_frame_rate": "60/1", "bit_rate": "20000000""#;
    let input = Path::new("/videos/in.mkv");
    let metadata = parse_ffprobe_output(input, &ffprobe_json(audio, video)).unwrap();

    let profile = MediaProfile::default();
    let violations = evaluate(&metadata, &profile);
    assert_eq!(
        violations,
        ViolationSet::AUDIO_CODEC
            | ViolationSet::AUDIO_CHANNELS
            | ViolationSet::AUDIO_BITRATE
            | ViolationSet::VIDEO_CODEC
            | ViolationSet::VIDEO_RESOLUTION
            | ViolationSet::VIDEO_FPS
    );

    let cmd = synthesize(input, Path::new("/out/in.mp4"), &metadata, violations, &profile);
    assert_eq!(
        args_after_input(cmd.args()),
        vec![
            "-c:a", "aac", "-ac", "2", "-b:a", "192000", "-c:v", "hevc", "-vf",
            "scale=1920:1080", "-r", "30",
        ]
    );
}

const LEAVES: [ViolationSet; 8] = [
    ViolationSet::AUDIO_CODEC,
    ViolationSet::AUDIO_SAMPLE_RATE,
    ViolationSet::AUDIO_CHANNELS,
    ViolationSet::AUDIO_BITRATE,
    ViolationSet::VIDEO_CODEC,
    ViolationSet::VIDEO_RESOLUTION,
    ViolationSet::VIDEO_FPS,
    ViolationSet::VIDEO_BITRATE,
];

const AUDIO_FLAGS: [&str; 4] = ["-c:a", "-ar", "-ac", "-b:a"];
const VIDEO_FLAGS: [&str; 4] = ["-c:v", "-vf", "-r", "-b:v"];

/// A profile where every leaf violation produces a directive.
fn full_profile() -> MediaProfile {
    let mut profile = MediaProfile::default();
    profile.video.resolution = Some(Resolution::new(1280, 720));
    profile.video.bitrate_target = Some(2_500_000);
    profile
}

/// Builds the set whose bit `i` is leaf `i`.
fn set_from_index(n: u8) -> ViolationSet {
    LEAVES
        .iter()
        .enumerate()
        .filter(|(i, _)| n & (1 << i) != 0)
        .fold(ViolationSet::NONE, |set, (_, leaf)| set | *leaf)
}

fn has_pair(args: &[&str], flag: &str, value: &str) -> bool {
    args.windows(2).any(|w| w[0] == flag && w[1] == value)
}

/// Flags from `category` that appear in `args`, in order.
fn flags_in<'a>(args: &[&'a str], category: &[&str]) -> Vec<&'a str> {
    args.iter().copied().filter(|a| category.contains(a)).collect()
}

#[test]
fn test_streams_are_copied_exactly_when_untouched() {
    let input = Path::new("/videos/in.mkv");
    let metadata = parse_ffprobe_output(input, &ffprobe_json(STEREO_AAC, HEVC_1080P)).unwrap();
    let profile = full_profile();

    for n in 0..=u8::MAX {
        let set = set_from_index(n);
        assert_eq!(set.bits(), n);

        let cmd = synthesize(input, Path::new("/out/in.mp4"), &metadata, set, &profile);
        let args = args_after_input(cmd.args());
        let plain_copy = has_pair(&args, "-c", "copy");
        assert_eq!(plain_copy, set.is_empty(), "set {set}: {args:?}");

        let audio_copied = plain_copy || has_pair(&args, "-c:a", "copy");
        let video_copied = plain_copy || has_pair(&args, "-c:v", "copy");
        assert_eq!(audio_copied, !set.intersects(ViolationSet::ANY_AUDIO), "set {set}: {args:?}");
        assert_eq!(video_copied, !set.intersects(ViolationSet::ANY_VIDEO), "set {set}: {args:?}");
    }
}

#[test]
fn test_each_leaf_adds_one_directive() {
    let input = Path::new("/videos/in.mkv");
    let metadata = parse_ffprobe_output(input, &ffprobe_json(STEREO_AAC, HEVC_1080P)).unwrap();
    let profile = full_profile();

    let expected = [
        ("-c:a", "aac"),
        ("-ar", "48000"),
        ("-ac", "2"),
        ("-b:a", "192000"),
        ("-c:v", "hevc"),
        ("-vf", "scale=1280:720"),
        ("-r", "30"),
        ("-b:v", "2500000"),
    ];

    for (leaf, (flag, value)) in LEAVES.into_iter().zip(expected) {
        let cmd = synthesize(input, Path::new("/out/in.mp4"), &metadata, leaf, &profile);
        let args = args_after_input(cmd.args());

        let (own, other) = if leaf.intersects(ViolationSet::ANY_AUDIO) {
            (&AUDIO_FLAGS, &VIDEO_FLAGS)
        } else {
            (&VIDEO_FLAGS, &AUDIO_FLAGS)
        };
        assert_eq!(flags_in(&args, own), vec![flag], "{leaf}: {args:?}");
        assert!(has_pair(&args, flag, value), "{leaf}: {args:?}");

        let copy_flag = if own == &AUDIO_FLAGS { "-c:v" } else { "-c:a" };
        assert_eq!(flags_in(&args, other), vec![copy_flag], "{leaf}: {args:?}");
        assert!(has_pair(&args, copy_flag, "copy"), "{leaf}: {args:?}");
    }
}

#[test]
fn test_tags_from_file_name() {
    let input = Path::new("/videos/Some Author - Some Title.mkv");
    let metadata = parse_ffprobe_output(input, &ffprobe_json(STEREO_AAC, HEVC_1080P)).unwrap();
    let profile = MediaProfile::default();

    let cmd = synthesize(input, Path::new("/out/x.mp4"), &metadata, ViolationSet::NONE, &profile);
    assert_eq!(
        args_after_input(cmd.args()),
        vec![
            "-c",
            "copy",
            "-metadata",
            "artist=Some Author",
            "-metadata",
            "title=Some Title",
        ]
    );
}

#[test]
fn test_missing_streams_are_probe_failures() {
    let only_video = r#"{"streams": [{"codec_type": "video", "codec_name": "hevc"}], "format": {}}"#;
    assert_eq!(
        parse_ffprobe_output(Path::new("a.mkv"), only_video),
        Err(ProbeFailure::NoAudioStream)
    );

    let only_audio = r#"{"streams": [{"codec_type": "audio", "codec_name": "aac"}], "format": {}}"#;
    assert_eq!(
        parse_ffprobe_output(Path::new("a.mkv"), only_audio),
        Err(ProbeFailure::NoVideoStream)
    );

    assert!(matches!(
        parse_ffprobe_output(Path::new("a.mkv"), "not json"),
        Err(ProbeFailure::ProbeProcess(_))
    ));
}
