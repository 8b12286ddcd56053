//! Source concatenation: walk a root directory, collect files by extension,
//! and write them into a single output file, optionally with a banner line
//! before each file's content.
//!
//! Collection order is deterministic (walkdir sorted by file name), and the
//! output file is skipped if it lives under the root, so re-running the
//! same command does not fold the previous output into the new one.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, info};
use walkdir::WalkDir;

use fbox_core::{FboxError, FboxResult};

/// Progress callback type (files_done, files_total, message)
pub type ProgressFn = Box<dyn Fn(u64, u64, &str) + Send + Sync>;

#[derive(Debug, Clone)]
pub struct ConcatOptions {
    pub root: PathBuf,
    pub output: PathBuf,
    /// Extensions to collect, without leading dots; empty collects all files.
    pub extensions: Vec<String>,
    /// Emit `// ── {relative path} ──` before each file's content.
    pub banner: bool,
}

#[derive(Debug)]
pub struct ConcatReport {
    pub output: PathBuf,
    pub files: usize,
    /// Total bytes written to the output, banners included.
    pub bytes: u64,
}

/// Concatenate the selected files under `root` into `output`.
///
/// An empty selection produces an empty output and a zero-file report, not
/// an error. The output is created or overwritten.
pub fn concat_sources(
    opts: &ConcatOptions,
    progress: Option<&ProgressFn>,
) -> FboxResult<ConcatReport> {
    if !opts.root.exists() {
        return Err(FboxError::NotFound(opts.root.clone()));
    }
    if !opts.root.is_dir() {
        return Err(FboxError::InvalidInput(format!(
            "not a directory: {}",
            opts.root.display()
        )));
    }

    let files = collect_files(&opts.root, &opts.extensions)?;
    info!(
        root = %opts.root.display(),
        files = files.len(),
        output = %opts.output.display(),
        "concatenating"
    );

    let mut writer = BufWriter::new(File::create(&opts.output)?);
    let output_canonical = opts.output.canonicalize().ok();

    let total = files.len() as u64;
    let mut written: u64 = 0;
    let mut count: usize = 0;

    for path in &files {
        // The output itself may have been collected when it sits under the
        // root (e.g. a previous run's result).
        if let Some(ref target) = output_canonical {
            if path.canonicalize().map(|p| &p == target).unwrap_or(false) {
                continue;
            }
        }

        let rel = path.strip_prefix(&opts.root).unwrap_or(path);
        debug!(path = %rel.display(), "appending source");

        if opts.banner {
            let banner = format!("// ── {} ──\n", rel.display());
            writer.write_all(banner.as_bytes())?;
            written += banner.len() as u64;
        }

        let content = fs::read(path)?;
        writer.write_all(&content)?;
        written += content.len() as u64;

        if opts.banner && !content.ends_with(b"\n") && !content.is_empty() {
            writer.write_all(b"\n")?;
            written += 1;
        }

        count += 1;
        if let Some(cb) = progress {
            cb(count as u64, total, &rel.to_string_lossy());
        }
    }

    writer.flush()?;

    Ok(ConcatReport {
        output: opts.output.clone(),
        files: count,
        bytes: written,
    })
}

/// Walk `root` in sorted order and keep regular files matching the
/// extension filter.
fn collect_files(root: &Path, extensions: &[String]) -> FboxResult<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.map_err(|e| {
            FboxError::InvalidInput(format!("walking {}: {e}", root.display()))
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        if matches_extension(entry.path(), extensions) {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

fn matches_extension(path: &Path, extensions: &[String]) -> bool {
    if extensions.is_empty() {
        return true;
    }
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => extensions.iter().any(|want| want.eq_ignore_ascii_case(ext)),
        None => false,
    }
}
