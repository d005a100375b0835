//! Implementation of the encode run.
//!
//! Loads the profile, discovers the files and hands them to the core job
//! driver with the real ffprobe/ffmpeg adapters.

use crate::cli::Cli;

use reencode_core::config::EncoderSettings;
use reencode_core::discovery::{DiscoveryRequest, compile_filter, discover};
use reencode_core::{
    BatchSummary, CommandSynthesizer, FfprobeProber, JobDriver, MediaProfile, SidecarSpawner,
    WorkerContext,
};

use anyhow::{Context, Result};
use log::{debug, info};
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

/// Loads the profile from `--profile`, or the built-in one.
pub fn load_profile(cli: &Cli) -> Result<MediaProfile> {
    match &cli.profile {
        Some(path) => {
            let profile = MediaProfile::load(path)
                .with_context(|| format!("Failed to load profile '{}'", path.display()))?;
            info!("Using profile \"{}\"", path.display());
            Ok(profile)
        }
        None => Ok(MediaProfile::default()),
    }
}

/// Turns the command line into a discovery request.
pub fn discovery_request(cli: &Cli) -> Result<DiscoveryRequest> {
    let filter = cli
        .filter
        .as_deref()
        .map(compile_filter)
        .transpose()
        .context("Invalid --filter expression")?;

    Ok(DiscoveryRequest {
        input: cli.path.clone(),
        output: cli.output.clone(),
        filelist: cli.filelist,
        filter,
    })
}

/// Runs the whole batch. Errors are startup errors only; per-file failures
/// are counted in the returned summary.
pub fn run_encode(cli: &Cli, interrupted: Arc<AtomicBool>) -> Result<BatchSummary> {
    let options = cli.worker_options();
    if options.dry_run {
        info!("Dry run enabled");
    }
    if options.replace && options.remove {
        info!("--replace takes precedence over --remove");
    }

    let profile = load_profile(cli)?;
    debug!("Target profile: {profile:?}");

    let found = discover(&discovery_request(cli)?)?;
    info!("Found {} file(s) to process", found.jobs.len());

    let settings = EncoderSettings {
        hwaccel: cli.hwaccel.clone(),
        ..Default::default()
    };
    let prober = FfprobeProber::new(settings.ffprobe_program.clone());
    let synthesizer = CommandSynthesizer::new(settings);
    let spawner = SidecarSpawner;

    let ctx = WorkerContext {
        prober: &prober,
        spawner: &spawner,
        synthesizer: &synthesizer,
        profile: &profile,
        options,
        interrupted,
    };

    let stop_file = cli.stop_file();
    debug!("Stop file: \"{}\"", stop_file.display());

    Ok(JobDriver::new(ctx, Some(stop_file)).run(&found.jobs))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use reencode_core::CoreError;

    #[test]
    fn test_load_profile_default_and_file() {
        let cli = Cli::parse_from(["reencode", "videos"]);
        assert_eq!(load_profile(&cli).unwrap(), MediaProfile::default());

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("profile.toml");
        std::fs::write(&path, "[video]\ncodec = \"av1\"\n").unwrap();
        let cli = Cli::parse_from(["reencode", "videos", "--profile", path.to_str().unwrap()]);
        let profile = load_profile(&cli).unwrap();
        assert_eq!(profile.video.codec.as_deref(), Some("av1"));
        assert_eq!(profile.audio.codec, None);
    }

    #[test]
    fn test_load_profile_missing_file() {
        let cli = Cli::parse_from(["reencode", "videos", "--profile", "/no/such/profile.toml"]);
        let err = load_profile(&cli).unwrap_err();
        assert!(matches!(err.downcast_ref::<CoreError>(), Some(CoreError::Config(_))));
    }

    #[test]
    fn test_discovery_request_filter() {
        let cli = Cli::parse_from(["reencode", "videos", "--filter", "^a"]);
        let request = discovery_request(&cli).unwrap();
        assert!(request.filter.unwrap().is_match("a/b.mkv"));

        let cli = Cli::parse_from(["reencode", "videos", "--filter", "("]);
        assert!(discovery_request(&cli).is_err());
    }
}
