//! Post-success file management.
//!
//! After an encode succeeds the original input is either replaced by the new
//! file, removed, or left alone. Filesystem errors are logged and never abort
//! the batch: permission problems at warn, anything else at error.

use crate::config::WorkerOptions;
use std::io;
use std::path::{Path, PathBuf};

/// What the post-success policy did to the original input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyAction {
    /// The output now lives at the input's location (with the output's extension)
    Replaced,
    /// The input was deleted; the output stays where it was written
    Removed,
    /// Both files were left in place
    Kept,
    /// Nothing was touched because the run is a dry run
    DryRun,
}

/// Where the output ends up when it replaces `input`.
pub fn replacement_path(input: &Path, output: &Path) -> PathBuf {
    match output.extension() {
        Some(ext) => input.with_extension(ext),
        None => input.with_extension(""),
    }
}

/// Applies the replace/remove/keep policy for one finished file.
///
/// `replace` wins over `remove` when both are set.
pub fn apply_policy(input: &Path, output: &Path, options: &WorkerOptions) -> PolicyAction {
    if options.replace {
        let target = replacement_path(input, output);
        if options.dry_run {
            log::info!(
                "Dry run: would replace \"{}\" with \"{}\"",
                input.display(),
                target.display()
            );
            return PolicyAction::DryRun;
        }
        replace(input, output, &target)
    } else if options.remove {
        if options.dry_run {
            log::info!("Dry run: would remove \"{}\"", input.display());
            return PolicyAction::DryRun;
        }
        log::info!("Removing \"{}\"", input.display());
        match std::fs::remove_file(input) {
            Ok(()) => PolicyAction::Removed,
            Err(e) => {
                log_fs_error("remove", input, &e);
                PolicyAction::Kept
            }
        }
    } else if options.dry_run {
        PolicyAction::DryRun
    } else {
        PolicyAction::Kept
    }
}

fn replace(input: &Path, output: &Path, target: &Path) -> PolicyAction {
    log::info!("Replacing \"{}\"", input.display());
    if let Err(e) = std::fs::rename(output, target) {
        log_fs_error("rename", output, &e);
        return PolicyAction::Kept;
    }
    if target != input {
        if let Err(e) = std::fs::remove_file(input) {
            log_fs_error("remove", input, &e);
        }
    }
    PolicyAction::Replaced
}

fn log_fs_error(operation: &str, path: &Path, err: &io::Error) {
    if err.kind() == io::ErrorKind::PermissionDenied {
        log::warn!("Permission denied, could not {} \"{}\"", operation, path.display());
    } else {
        log::error!(
            "Could not {} \"{}\": {} ({:?})",
            operation,
            path.display(),
            err,
            err.kind()
        );
    }
}
