//! The split loops and the report model
//!
//! Byte-oriented chunks stream through a fixed copy buffer, so memory use
//! is independent of both file size and chunk size. Output files are
//! created lazily on the first non-empty read: an empty source produces no
//! chunks at all. Handles are released on every exit path by drop; chunks
//! written before an I/O failure stay on disk (no rollback).

use std::fs::File;
use std::io::{BufWriter, ErrorKind, Read, Write};
use std::path::PathBuf;

use serde::Serialize;
use tracing::{debug, info};

use fbox_core::FboxResult;

use crate::plan::{resolve, ResolvedSplit, SplitOptions, SplitStrategy};
use crate::text;

/// Progress callback type (units_done, units_total, message)
pub type ProgressFn = Box<dyn Fn(u64, u64, &str) + Send + Sync>;

/// Copy buffer for byte-oriented splits.
const COPY_BUF_BYTES: usize = 64 * 1024;

/// One output file produced by a split. Produced in sequence, never mutated.
#[derive(Debug, Clone, Serialize)]
pub struct ChunkFile {
    pub path: PathBuf,
    /// 1-based, gap-free sequence index
    pub index: u32,
    /// Bytes written for byte-oriented modes, characters for char mode
    pub written: u64,
}

/// Result of a completed split: every chunk in write order.
#[derive(Debug, Serialize)]
pub struct SplitReport {
    pub source: PathBuf,
    pub destination: PathBuf,
    /// Mode label: `size`, `part`, or `char`
    pub mode: String,
    pub chunks: Vec<ChunkFile>,
    /// Sum of per-chunk `written` counts
    pub total_written: u64,
}

impl SplitReport {
    pub fn part_count(&self) -> usize {
        self.chunks.len()
    }
}

/// Split one source file into an ordered sequence of smaller files.
///
/// Validation (source exists and is a regular file, destination is an
/// existing directory, strategy parameter is positive) happens before any
/// output is written. The source is never modified; existing chunk files
/// with colliding names are overwritten.
pub fn split_file(opts: &SplitOptions, progress: Option<&ProgressFn>) -> FboxResult<SplitReport> {
    let plan = resolve(opts)?;

    info!(
        source = %plan.source.display(),
        dest = %plan.dest_dir.display(),
        mode = plan.strategy.label(),
        "splitting"
    );

    let chunks = match plan.strategy {
        SplitStrategy::Bytes(per_chunk) => split_bytes(&plan, per_chunk, progress)?,
        SplitStrategy::Parts(parts) => {
            let total = std::fs::metadata(&plan.source)?.len();
            if total == 0 {
                Vec::new()
            } else {
                // Ceiling division: the remainder folds into full-size
                // chunks, so fewer than `parts` files can come out.
                let per_chunk = total.div_ceil(parts as u64);
                split_bytes(&plan, per_chunk, progress)?
            }
        }
        SplitStrategy::Chars(per_chunk) => text::split_chars(&plan, per_chunk, progress)?,
    };

    let total_written = chunks.iter().map(|c| c.written).sum();
    info!(parts = chunks.len(), total_written, "split complete");

    Ok(SplitReport {
        source: plan.source,
        destination: plan.dest_dir,
        mode: plan.strategy.label().to_string(),
        chunks,
        total_written,
    })
}

fn split_bytes(
    plan: &ResolvedSplit,
    chunk_size: u64,
    progress: Option<&ProgressFn>,
) -> FboxResult<Vec<ChunkFile>> {
    let total = std::fs::metadata(&plan.source)?.len();
    let mut reader = File::open(&plan.source)?;
    let mut buf = vec![0u8; COPY_BUF_BYTES];

    let mut chunks: Vec<ChunkFile> = Vec::new();
    let mut done: u64 = 0;

    loop {
        let index = chunks.len() as u32 + 1;
        let mut remaining = chunk_size;

        // The first read decides whether this chunk exists at all.
        let want = remaining.min(buf.len() as u64) as usize;
        let first = read_up_to(&mut reader, &mut buf[..want])?;
        if first == 0 {
            break;
        }

        let path = plan.chunk_path(index);
        debug!(path = %path.display(), "writing chunk");
        let mut writer = BufWriter::new(File::create(&path)?);
        writer.write_all(&buf[..first])?;
        let mut written = first as u64;
        remaining -= first as u64;

        while remaining > 0 {
            let want = remaining.min(buf.len() as u64) as usize;
            let n = read_up_to(&mut reader, &mut buf[..want])?;
            if n == 0 {
                break;
            }
            writer.write_all(&buf[..n])?;
            written += n as u64;
            remaining -= n as u64;
        }

        // Flush before drop so write errors surface as Io instead of being
        // swallowed by BufWriter's drop.
        writer.flush()?;

        done += written;
        chunks.push(ChunkFile { path, index, written });
        if let Some(cb) = progress {
            cb(done, total, &format!("part {index:04}"));
        }
    }

    Ok(chunks)
}

/// Read until `buf` is full or the reader is exhausted.
pub(crate) fn read_up_to(reader: &mut impl Read, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
