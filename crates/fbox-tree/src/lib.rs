//! Directory-tree rendering: recursive traversal with glob exclusion,
//! depth limiting, and plain-text branch connectors.
//!
//! Output mirrors the classic `tree` layout — directories first, then
//! files, both name-sorted — with a trailing `{n} directories, {m} files`
//! summary. Unreadable subdirectories render an error marker and the walk
//! continues; only the root itself must be readable. No color, no ANSI.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use glob::Pattern;
use tracing::debug;

use fbox_core::{FboxError, FboxResult};

#[derive(Debug, Clone)]
pub struct TreeOptions {
    /// Levels to descend below the root; `Some(0)` prints only the root
    /// line, `None` is unlimited.
    pub max_depth: Option<usize>,
    /// Glob patterns matched against entry names and root-relative paths.
    pub exclude_patterns: Vec<String>,
    /// Include dot-prefixed entries.
    pub show_hidden: bool,
    /// List directories only.
    pub dirs_only: bool,
}

impl Default for TreeOptions {
    fn default() -> Self {
        Self {
            max_depth: None,
            exclude_patterns: Vec::new(),
            show_hidden: false,
            dirs_only: false,
        }
    }
}

/// Counts of what was actually rendered (excluded entries are not counted).
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TreeSummary {
    pub directories: u64,
    pub files: u64,
}

struct Entry {
    name: String,
    path: PathBuf,
    is_dir: bool,
}

/// Render the tree rooted at `root` into `out`, returning the counts.
///
/// The root line is the path as given; the summary line is printed after a
/// blank separator, like the classic `tree` output.
pub fn render_tree(
    root: &Path,
    opts: &TreeOptions,
    out: &mut impl Write,
) -> FboxResult<TreeSummary> {
    if !root.exists() {
        return Err(FboxError::NotFound(root.to_path_buf()));
    }
    if !root.is_dir() {
        return Err(FboxError::InvalidInput(format!(
            "not a directory: {}",
            root.display()
        )));
    }

    let patterns = compile_patterns(&opts.exclude_patterns)?;
    debug!(root = %root.display(), excludes = patterns.len(), "rendering tree");

    writeln!(out, "{}", root.display())?;

    let mut walk = Walk {
        root,
        opts,
        patterns: &patterns,
        summary: TreeSummary::default(),
    };
    if opts.max_depth != Some(0) {
        // Root listing failures are real errors; deeper ones degrade to
        // inline markers in render_level.
        let entries = list_entries(root, root, opts, &patterns)?;
        walk.render_level(&entries, "", 1, out)?;
    }
    let summary = walk.summary;

    writeln!(out)?;
    writeln!(
        out,
        "{} directories, {} files",
        summary.directories, summary.files
    )?;

    Ok(summary)
}

fn compile_patterns(raw: &[String]) -> FboxResult<Vec<Pattern>> {
    raw.iter()
        .map(|p| {
            Pattern::new(p).map_err(|e| {
                FboxError::InvalidInput(format!("bad exclude pattern '{p}': {e}"))
            })
        })
        .collect()
}

fn list_entries(
    dir: &Path,
    root: &Path,
    opts: &TreeOptions,
    patterns: &[Pattern],
) -> std::io::Result<Vec<Entry>> {
    let mut entries = Vec::new();
    for result in fs::read_dir(dir)? {
        let entry = result?;
        let name = entry.file_name().to_string_lossy().into_owned();
        let path = entry.path();
        let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);

        if !opts.show_hidden && name.starts_with('.') {
            continue;
        }
        if is_excluded(&name, &path, root, patterns) {
            continue;
        }
        if opts.dirs_only && !is_dir {
            continue;
        }
        entries.push(Entry { name, path, is_dir });
    }

    // Directories first, then files, each name-sorted.
    entries.sort_by(|a, b| b.is_dir.cmp(&a.is_dir).then_with(|| a.name.cmp(&b.name)));
    Ok(entries)
}

fn is_excluded(name: &str, path: &Path, root: &Path, patterns: &[Pattern]) -> bool {
    patterns.iter().any(|pattern| {
        pattern.matches(name)
            || path
                .strip_prefix(root)
                .map(|rel| pattern.matches(&rel.to_string_lossy()))
                .unwrap_or(false)
    })
}

/// Traversal state shared down the recursion.
struct Walk<'a> {
    root: &'a Path,
    opts: &'a TreeOptions,
    patterns: &'a [Pattern],
    summary: TreeSummary,
}

impl Walk<'_> {
    fn render_level(
        &mut self,
        entries: &[Entry],
        prefix: &str,
        depth: usize,
        out: &mut impl Write,
    ) -> FboxResult<()> {
        let last_index = entries.len().saturating_sub(1);

        for (i, entry) in entries.iter().enumerate() {
            let last = i == last_index;
            let connector = if last { "└── " } else { "├── " };
            writeln!(out, "{prefix}{connector}{}", entry.name)?;

            if entry.is_dir {
                self.summary.directories += 1;

                let descend = self
                    .opts
                    .max_depth
                    .map(|max| depth + 1 <= max)
                    .unwrap_or(true);
                if descend {
                    let child_prefix =
                        format!("{prefix}{}", if last { "    " } else { "│   " });
                    match list_entries(&entry.path, self.root, self.opts, self.patterns) {
                        Ok(children) => {
                            self.render_level(&children, &child_prefix, depth + 1, out)?
                        }
                        Err(e) => writeln!(out, "{child_prefix}└── [error: {e}]")?,
                    }
                }
            } else {
                self.summary.files += 1;
            }
        }

        Ok(())
    }
}
