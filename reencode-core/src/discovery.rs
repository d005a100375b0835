//! File discovery module for finding video files to process.
//!
//! Turns the command line's input path into an ordered list of
//! [`FileJob`]s. Three shapes of input are supported:
//!
//! - a single video file
//! - a directory, walked recursively and sorted
//! - a file list, one path per line (or alternating input/output lines when
//!   an output path was given)
//!
//! Files whose extension is not whitelisted are tallied and logged as a
//! summary, most common first.

use crate::config::{DEFAULT_OUTPUT_EXTENSION, DEFAULT_OUTPUT_SUFFIX, EXT_WHITELIST};
use crate::error::{CoreError, CoreResult};
use crate::processing::FileJob;
use regex::Regex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// How the input path should be interpreted.
#[derive(Debug, Clone)]
pub struct DiscoveryRequest {
    pub input: PathBuf,
    /// Explicit output file (single file), output root (directory) or
    /// switch to paired lines (file list)
    pub output: Option<PathBuf>,
    /// Treat `input` as a list of paths
    pub filelist: bool,
    /// Only keep directory entries whose relative path matches
    pub filter: Option<Regex>,
}

/// Jobs found plus the tally of rejected extensions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Discovery {
    pub jobs: Vec<FileJob>,
    /// (extension, count), most common first
    pub skipped_extensions: Vec<(String, usize)>,
}

/// Compiles a `--filter` expression.
pub fn compile_filter(pattern: &str) -> CoreResult<Regex> {
    Ok(Regex::new(pattern)?)
}

/// Checks the extension of `path` against the whitelist (case-insensitive).
///
/// Returns whether it is accepted together with the extension as written,
/// including the leading dot, or an empty string when there is none.
pub fn check_file_ext(path: &Path) -> (bool, String) {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => {
            let valid = EXT_WHITELIST
                .iter()
                .any(|allowed| allowed.eq_ignore_ascii_case(ext));
            (valid, format!(".{ext}"))
        }
        None => (false, String::new()),
    }
}

/// `<parent>/<stem>_reencoded.mp4`
pub fn default_output_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = format!("{stem}{DEFAULT_OUTPUT_SUFFIX}.{DEFAULT_OUTPUT_EXTENSION}");
    match input.parent() {
        Some(parent) => parent.join(name),
        None => PathBuf::from(name),
    }
}

/// Resolves `request` into jobs.
///
/// Errors with [`CoreError::InvalidInputPath`] when the input is neither a
/// file nor a directory and with [`CoreError::UnsupportedExtension`] when a
/// single input file is not whitelisted.
pub fn discover(request: &DiscoveryRequest) -> CoreResult<Discovery> {
    let input = &request.input;
    if input.is_file() && request.filelist {
        log::debug!("File list detected");
        read_filelist(input, request.output.is_some())
    } else if input.is_file() {
        log::debug!("File detected");
        single_file(input, request.output.as_deref())
    } else if input.is_dir() {
        log::debug!("Directory detected");
        scan_directory(input, request.output.as_deref(), request.filter.as_ref())
    } else {
        Err(CoreError::InvalidInputPath(input.clone()))
    }
}

fn single_file(input: &Path, output: Option<&Path>) -> CoreResult<Discovery> {
    let (valid, ext) = check_file_ext(input);
    if !valid {
        return Err(CoreError::UnsupportedExtension(ext));
    }
    let output = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| default_output_path(input));
    Ok(Discovery {
        jobs: vec![FileJob::new(input, output)],
        skipped_extensions: Vec::new(),
    })
}

/// Walks `root` recursively. With `output_root`, outputs mirror the
/// directory layout under it; otherwise they sit next to their inputs.
pub fn scan_directory(
    root: &Path,
    output_root: Option<&Path>,
    filter: Option<&Regex>,
) -> CoreResult<Discovery> {
    let mut tally = ExtensionTally::default();
    let mut jobs = Vec::new();
    let mut directories = 0usize;
    let mut files = 0usize;

    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry?;
        if entry.file_type().is_dir() {
            directories += 1;
            continue;
        }
        files += 1;

        let path = entry.path();
        let relative = path.strip_prefix(root).unwrap_or(path);
        if let Some(filter) = filter {
            if !filter.is_match(&relative.to_string_lossy()) {
                continue;
            }
        }

        let (valid, ext) = check_file_ext(path);
        if !valid {
            tally.add(ext);
            continue;
        }

        let output = match output_root {
            Some(out) => out.join(relative),
            None => default_output_path(path),
        };
        jobs.push(FileJob::new(path, output));
    }

    log::debug!("Scanned {directories} directories and {files} files");
    jobs.sort_by(|a, b| a.input.cmp(&b.input));

    Ok(Discovery {
        jobs,
        skipped_extensions: tally.finish(),
    })
}

/// Reads a file list. With `paired`, lines alternate input and output;
/// otherwise every line is an input written next to itself.
pub fn read_filelist(list: &Path, paired: bool) -> CoreResult<Discovery> {
    let text = std::fs::read_to_string(list).map_err(|e| {
        CoreError::PathError(format!("Failed to read file list '{}': {e}", list.display()))
    })?;
    Ok(parse_filelist(&text, paired))
}

/// Parses file list text. Missing inputs are warned about and dropped
/// together with their paired output line.
pub fn parse_filelist(text: &str, paired: bool) -> Discovery {
    let mut tally = ExtensionTally::default();
    let mut jobs = Vec::new();
    let mut lines = text.lines().map(str::trim).filter(|l| !l.is_empty());

    while let Some(line) = lines.next() {
        let input = PathBuf::from(line);
        let output = if paired {
            match lines.next() {
                Some(out) => PathBuf::from(out),
                None => {
                    log::warn!("File list input \"{}\" has no output line", input.display());
                    break;
                }
            }
        } else {
            default_output_path(&input)
        };

        if !input.exists() {
            log::warn!("File \"{}\" does not exist", input.display());
            continue;
        }
        let (valid, ext) = check_file_ext(&input);
        if !valid {
            tally.add(ext);
            continue;
        }
        jobs.push(FileJob::new(input, output));
    }

    Discovery {
        jobs,
        skipped_extensions: tally.finish(),
    }
}

#[derive(Default)]
struct ExtensionTally(HashMap<String, usize>);

impl ExtensionTally {
    fn add(&mut self, ext: String) {
        *self.0.entry(ext).or_insert(0) += 1;
    }

    fn finish(self) -> Vec<(String, usize)> {
        let mut counts: Vec<(String, usize)> = self.0.into_iter().collect();
        counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        if !counts.is_empty() {
            let lines: Vec<String> = counts
                .iter()
                .map(|(ext, n)| {
                    let ext = if ext.is_empty() { "(none)" } else { ext.as_str() };
                    format!("{ext} -> {n}")
                })
                .collect();
            log::info!("Skipped extensions:\n{}", lines.join("\n"));
        }
        counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_check_file_ext() {
        assert_eq!(check_file_ext(Path::new("a/b.mkv")), (true, ".mkv".to_string()));
        assert_eq!(check_file_ext(Path::new("B.MP4")), (true, ".MP4".to_string()));
        assert_eq!(check_file_ext(Path::new("c.wmv")), (true, ".wmv".to_string()));
        assert_eq!(check_file_ext(Path::new("notes.txt")), (false, ".txt".to_string()));
        assert_eq!(check_file_ext(Path::new("README")), (false, String::new()));
    }

    #[test]
    fn test_default_output_path() {
        assert_eq!(
            default_output_path(Path::new("/media/show/ep1.mkv")),
            PathBuf::from("/media/show/ep1_reencoded.mp4")
        );
        assert_eq!(
            default_output_path(Path::new("clip.avi")),
            PathBuf::from("clip_reencoded.mp4")
        );
    }

    #[test]
    fn test_directory_walk_sorted_with_summary() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("season1")).unwrap();
        fs::write(root.join("season1/b.mkv"), b"").unwrap();
        fs::write(root.join("season1/a.mp4"), b"").unwrap();
        fs::write(root.join("z.avi"), b"").unwrap();
        fs::write(root.join("cover.jpg"), b"").unwrap();
        fs::write(root.join("info.txt"), b"").unwrap();
        fs::write(root.join("notes.txt"), b"").unwrap();

        let found = scan_directory(root, None, None).unwrap();
        let inputs: Vec<_> = found.jobs.iter().map(|j| j.input.clone()).collect();
        assert_eq!(
            inputs,
            vec![root.join("season1/a.mp4"), root.join("season1/b.mkv"), root.join("z.avi")]
        );
        assert_eq!(found.jobs[0].output, root.join("season1/a_reencoded.mp4"));
        assert_eq!(
            found.skipped_extensions,
            vec![(".txt".to_string(), 2), (".jpg".to_string(), 1)]
        );
    }

    #[test]
    fn test_directory_mirrors_into_output_root() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("in");
        fs::create_dir_all(root.join("sub")).unwrap();
        fs::write(root.join("sub/clip.mkv"), b"").unwrap();
        let out = dir.path().join("out");

        let found = scan_directory(&root, Some(&out), None).unwrap();
        assert_eq!(found.jobs, vec![FileJob::new(root.join("sub/clip.mkv"), out.join("sub/clip.mkv"))]);
    }

    #[test]
    fn test_directory_filter_matches_relative_path() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("keep")).unwrap();
        fs::create_dir_all(root.join("drop")).unwrap();
        fs::write(root.join("keep/a.mkv"), b"").unwrap();
        fs::write(root.join("drop/b.mkv"), b"").unwrap();

        let filter = Regex::new(r"^keep/").unwrap();
        let found = scan_directory(root, None, Some(&filter)).unwrap();
        assert_eq!(found.jobs.len(), 1);
        assert_eq!(found.jobs[0].input, root.join("keep/a.mkv"));
    }

    #[test]
    fn test_compile_filter_rejects_bad_pattern() {
        assert!(compile_filter(r"season\d+/").is_ok());
        assert!(matches!(compile_filter("(unclosed"), Err(CoreError::Filter(_))));
    }

    #[test]
    fn test_single_file() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("movie.mov");
        fs::write(&input, b"").unwrap();

        let request = DiscoveryRequest {
            input: input.clone(),
            output: None,
            filelist: false,
            filter: None,
        };
        let found = discover(&request).unwrap();
        assert_eq!(found.jobs, vec![FileJob::new(&input, dir.path().join("movie_reencoded.mp4"))]);

        let request = DiscoveryRequest {
            output: Some(dir.path().join("custom.mp4")),
            ..request
        };
        let found = discover(&request).unwrap();
        assert_eq!(found.jobs[0].output, dir.path().join("custom.mp4"));
    }

    #[test]
    fn test_single_file_bad_extension() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("song.flac");
        fs::write(&input, b"").unwrap();

        let request = DiscoveryRequest {
            input,
            output: None,
            filelist: false,
            filter: None,
        };
        assert!(matches!(
            discover(&request),
            Err(CoreError::UnsupportedExtension(ext)) if ext == ".flac"
        ));
    }

    #[test]
    fn test_missing_input_path() {
        let request = DiscoveryRequest {
            input: PathBuf::from("/no/such/path"),
            output: None,
            filelist: false,
            filter: None,
        };
        assert!(matches!(discover(&request), Err(CoreError::InvalidInputPath(_))));
    }

    #[test]
    fn test_filelist_inputs_only() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.mkv");
        let b = dir.path().join("b.srt");
        fs::write(&a, b"").unwrap();
        fs::write(&b, b"").unwrap();
        let missing = dir.path().join("missing.mkv");

        let text = format!("{}\n\n{}\n{}\n", a.display(), missing.display(), b.display());
        let found = parse_filelist(&text, false);
        assert_eq!(found.jobs, vec![FileJob::new(&a, dir.path().join("a_reencoded.mp4"))]);
        assert_eq!(found.skipped_extensions, vec![(".srt".to_string(), 1)]);
    }

    #[test]
    fn test_filelist_paired() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.mkv");
        let c = dir.path().join("c.avi");
        fs::write(&a, b"").unwrap();
        fs::write(&c, b"").unwrap();
        let missing = dir.path().join("missing.mkv");

        let text = format!(
            "{}\n/out/a.mp4\n{}\n/out/missing.mp4\n{}\n/out/c.mp4\n",
            a.display(),
            missing.display(),
            c.display()
        );
        let list = dir.path().join("list.txt");
        fs::write(&list, text).unwrap();

        let request = DiscoveryRequest {
            input: list,
            output: Some(PathBuf::from("/out")),
            filelist: true,
            filter: None,
        };
        let found = discover(&request).unwrap();
        assert_eq!(
            found.jobs,
            vec![
                FileJob::new(&a, "/out/a.mp4"),
                FileJob::new(&c, "/out/c.mp4"),
            ]
        );
    }
}
