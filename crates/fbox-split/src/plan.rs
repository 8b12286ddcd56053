//! Split strategies, option resolution, and the chunk naming convention
//!
//! Chunk files are named `{base}_{mode}_part{index:04}{extension}` where
//! `mode` is `size`, `part`, or `char`, and `index` is 1-based and gap-free.
//! `parse_chunk_name` inverts the convention so a family can be rediscovered
//! from any one of its members without a sidecar manifest.

use std::path::{Path, PathBuf};

use fbox_core::{FboxError, FboxResult};

/// One of the three mutually exclusive splitting strategies.
///
/// Exclusivity is structural: a caller picks exactly one variant, so the
/// "exactly one parameter" rule is enforced by the type. The numeric
/// parameter must be positive; `validate` rejects zero before any I/O.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitStrategy {
    /// Fixed number of bytes per chunk.
    Bytes(u64),
    /// Fixed number of output parts. The per-chunk byte size is
    /// `ceil(total / parts)`; because of the ceiling, a run can produce
    /// fewer files than requested when the division is not exact — the
    /// short remainder folds into the preceding full-size chunks.
    Parts(u32),
    /// Fixed number of decoded characters per chunk. Text-aware: a
    /// multi-byte character is never split across chunk boundaries.
    Chars(u64),
}

impl SplitStrategy {
    /// Mode label embedded in chunk file names.
    pub fn label(&self) -> &'static str {
        match self {
            SplitStrategy::Bytes(_) => "size",
            SplitStrategy::Parts(_) => "part",
            SplitStrategy::Chars(_) => "char",
        }
    }

    pub(crate) fn validate(&self) -> FboxResult<()> {
        let param = match *self {
            SplitStrategy::Bytes(n) => n,
            SplitStrategy::Parts(n) => n as u64,
            SplitStrategy::Chars(n) => n,
        };
        if param == 0 {
            return Err(FboxError::InvalidInput(format!(
                "--{} parameter must be greater than zero",
                match self {
                    SplitStrategy::Bytes(_) => "chunk-size",
                    SplitStrategy::Parts(_) => "part-count",
                    SplitStrategy::Chars(_) => "char-count",
                }
            )));
        }
        Ok(())
    }
}

/// Inputs to a split operation. Destination and base name are optional and
/// resolved against the source at validation time.
#[derive(Debug, Clone)]
pub struct SplitOptions {
    pub source: PathBuf,
    /// Must exist and be a directory if set; defaults to the source's parent.
    pub destination: Option<PathBuf>,
    /// Defaults to the source file name without its extension.
    pub base_name: Option<String>,
    pub strategy: SplitStrategy,
}

impl SplitOptions {
    pub fn new(source: impl Into<PathBuf>, strategy: SplitStrategy) -> Self {
        Self {
            source: source.into(),
            destination: None,
            base_name: None,
            strategy,
        }
    }

    pub fn destination(mut self, dir: impl Into<PathBuf>) -> Self {
        self.destination = Some(dir.into());
        self
    }

    pub fn base_name(mut self, name: impl Into<String>) -> Self {
        self.base_name = Some(name.into());
        self
    }
}

/// A validated split: source checked, destination and naming resolved.
/// All `InvalidInput`/`NotFound` conditions are raised here, before any
/// output is written.
#[derive(Debug)]
pub(crate) struct ResolvedSplit {
    pub source: PathBuf,
    pub dest_dir: PathBuf,
    pub base: String,
    /// Original extension including the leading dot, or empty.
    pub extension: String,
    pub strategy: SplitStrategy,
}

impl ResolvedSplit {
    pub fn chunk_path(&self, index: u32) -> PathBuf {
        self.dest_dir
            .join(chunk_file_name(&self.base, self.strategy.label(), index, &self.extension))
    }
}

pub(crate) fn resolve(opts: &SplitOptions) -> FboxResult<ResolvedSplit> {
    opts.strategy.validate()?;

    let source = &opts.source;
    if !source.exists() {
        return Err(FboxError::NotFound(source.clone()));
    }
    if !source.is_file() {
        return Err(FboxError::InvalidInput(format!(
            "not a regular file: {}",
            source.display()
        )));
    }

    let dest_dir = match &opts.destination {
        Some(dir) => {
            if !dir.is_dir() {
                return Err(FboxError::InvalidInput(format!(
                    "destination is not an existing directory: {}",
                    dir.display()
                )));
            }
            dir.clone()
        }
        None => source
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(".")),
    };

    let base = match &opts.base_name {
        Some(name) => name.clone(),
        None => source
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .ok_or_else(|| {
                FboxError::InvalidInput(format!("source has no file name: {}", source.display()))
            })?,
    };

    let extension = source
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();

    Ok(ResolvedSplit {
        source: source.clone(),
        dest_dir,
        base,
        extension,
        strategy: opts.strategy,
    })
}

// ── Naming convention ─────────────────────────────────────────────────────────

/// Format a chunk file name: `{base}_{mode}_part{index:04}{extension}`.
pub fn chunk_file_name(base: &str, mode: &str, index: u32, extension: &str) -> String {
    format!("{base}_{mode}_part{index:04}{extension}")
}

/// Parsed form of a chunk file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkName {
    pub base: String,
    /// `size`, `part`, or `char`
    pub mode: String,
    /// 1-based sequence index
    pub index: u32,
    /// Original extension including the leading dot, or empty
    pub extension: String,
}

/// Parse a file name produced by `chunk_file_name`. Returns `None` for
/// names that don't follow the convention (wrong marker, index 0, fewer
/// than 4 index digits).
///
/// The base may itself contain underscores and dots, so the scan anchors on
/// the rightmost `_part` marker that is followed by the index digits and
/// preceded by a mode label.
pub fn parse_chunk_name(name: &str) -> Option<ChunkName> {
    let mut search_end = name.len();
    while let Some(pos) = name[..search_end].rfind("_part") {
        let digits_start = pos + "_part".len();
        let rest = &name[digits_start..];
        let digit_len = rest.chars().take_while(|c| c.is_ascii_digit()).count();

        if digit_len >= 4 {
            let (digits, extension) = rest.split_at(digit_len);
            if extension.is_empty() || extension.starts_with('.') {
                let head = &name[..pos];
                for mode in ["size", "part", "char"] {
                    let marker = format!("_{mode}");
                    if let Some(base) = head.strip_suffix(marker.as_str()) {
                        if base.is_empty() {
                            continue;
                        }
                        let index: u32 = digits.parse().ok()?;
                        if index == 0 {
                            return None;
                        }
                        return Some(ChunkName {
                            base: base.to_string(),
                            mode: (*mode).to_string(),
                            index,
                            extension: extension.to_string(),
                        });
                    }
                }
            }
        }
        search_end = pos;
    }
    None
}

// ── Size parsing ──────────────────────────────────────────────────────────────

/// Parse a byte count with an optional binary unit suffix.
///
/// Accepted suffixes (case-insensitive): `B`, `KB`/`K` (1024), `MB`/`M`
/// (1024²), `GB`/`G` (1024³). A bare integer is plain bytes. Usable
/// directly as a clap value parser.
pub fn parse_byte_size(input: &str) -> Result<u64, String> {
    let s = input.trim();
    let digit_end = s
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(s.len());
    let (digits, suffix) = s.split_at(digit_end);

    if digits.is_empty() {
        return Err(format!("invalid size: '{input}'"));
    }
    let value: u64 = digits
        .parse()
        .map_err(|_| format!("invalid size: '{input}'"))?;

    let multiplier: u64 = match suffix.trim().to_ascii_uppercase().as_str() {
        "" | "B" => 1,
        "KB" | "K" => 1024,
        "MB" | "M" => 1024 * 1024,
        "GB" | "G" => 1024 * 1024 * 1024,
        other => return Err(format!("unknown size suffix '{other}' in '{input}'")),
    };

    value
        .checked_mul(multiplier)
        .ok_or_else(|| format!("size out of range: '{input}'"))
}
