//! Reassemble a split family back into one file
//!
//! There is no manifest: the family is rediscovered from the naming
//! convention alone, given any single chunk path. Byte-mode families are
//! concatenated raw and are byte-exact. Character-mode families are decoded
//! per chunk (each chunk carries its own BOM) and re-encoded once, so the
//! output holds a single leading BOM and the original text content.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use fbox_core::{FboxError, FboxResult};

use crate::plan::parse_chunk_name;
use crate::text::TextEncoding;

#[derive(Debug)]
pub struct JoinReport {
    pub output: PathBuf,
    pub parts: usize,
    /// Bytes written to the output file
    pub bytes: u64,
}

/// Reassemble the whole family that `chunk` belongs to.
///
/// The default output is `{base}{extension}` next to the chunks; an
/// existing file there is overwritten, mirroring the split side-effect
/// contract. Fails with `InvalidInput` if the family's indices are not
/// exactly `1..=n`.
pub fn join_chunks(chunk: &Path, output: Option<&Path>) -> FboxResult<JoinReport> {
    if !chunk.exists() {
        return Err(FboxError::NotFound(chunk.to_path_buf()));
    }
    let file_name = chunk
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| {
            FboxError::InvalidInput(format!("not a valid chunk path: {}", chunk.display()))
        })?;
    let name = parse_chunk_name(file_name).ok_or_else(|| {
        FboxError::InvalidInput(format!("not a chunk file name: {file_name}"))
    })?;

    let dir = chunk
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));

    // Collect the whole family: same base, mode, and extension.
    let mut family: Vec<(u32, PathBuf)> = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let candidate = entry.file_name();
        let Some(candidate) = candidate.to_str() else {
            continue;
        };
        let Some(parsed) = parse_chunk_name(candidate) else {
            continue;
        };
        if parsed.base == name.base && parsed.mode == name.mode && parsed.extension == name.extension
        {
            family.push((parsed.index, entry.path()));
        }
    }
    family.sort_by_key(|(index, _)| *index);

    // Indices must be exactly 1..=n; a gap means a missing chunk and a
    // silently corrupt output, so refuse before writing anything.
    for (position, (index, _)) in family.iter().enumerate() {
        let expected = position as u32 + 1;
        if *index != expected {
            return Err(FboxError::InvalidInput(format!(
                "chunk sequence has a gap: expected part {expected:04}, found part {index:04}"
            )));
        }
    }

    let out_path = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| dir.join(format!("{}{}", name.base, name.extension)));

    info!(
        parts = family.len(),
        mode = %name.mode,
        output = %out_path.display(),
        "joining chunks"
    );

    let bytes = if name.mode == "char" {
        join_text(&family, &out_path)?
    } else {
        join_bytes(&family, &out_path)?
    };

    Ok(JoinReport {
        output: out_path,
        parts: family.len(),
        bytes,
    })
}

fn join_bytes(family: &[(u32, PathBuf)], out_path: &Path) -> FboxResult<u64> {
    let mut writer = BufWriter::new(File::create(out_path)?);
    let mut bytes: u64 = 0;
    for (index, path) in family {
        debug!(part = *index, path = %path.display(), "appending");
        let mut reader = File::open(path)?;
        bytes += io::copy(&mut reader, &mut writer)?;
    }
    writer.flush()?;
    Ok(bytes)
}

/// Character-mode chunks each carry a BOM; decode them individually and
/// encode the concatenation once so only a single leading BOM survives.
fn join_text(family: &[(u32, PathBuf)], out_path: &Path) -> FboxResult<u64> {
    let mut text = String::new();
    let mut out_encoding = TextEncoding::Utf8 { bom: false };

    for (position, (index, path)) in family.iter().enumerate() {
        debug!(part = *index, path = %path.display(), "decoding");
        let raw = fs::read(path)?;
        let (encoding, _) = TextEncoding::detect(&raw);
        if position == 0 {
            out_encoding = encoding;
        }
        // decode() BOM-sniffs per chunk and strips the BOM it finds;
        // BOM-less chunks fall back to UTF-8.
        let (decoded, _, _) = encoding_rs::UTF_8.decode(&raw);
        text.push_str(&decoded);
    }

    let data = out_encoding.encode(&text, out_encoding.has_bom());
    fs::write(out_path, &data)?;
    Ok(data.len() as u64)
}
