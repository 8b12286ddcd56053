//! Text encoding detection and the character-oriented split
//!
//! The character strategy counts decoded Unicode scalar values, not bytes,
//! so a multi-byte character can never straddle a chunk boundary. The
//! source encoding is sniffed from the BOM at open time (UTF-8, UTF-16 LE,
//! UTF-16 BE; no BOM means UTF-8) and every chunk is written back in that
//! encoding, BOM included, so each chunk is a standalone readable text
//! file. Malformed sequences decode to U+FFFD, matching the replacement
//! behavior of the usual text readers.

use std::fs::File;
use std::io::BufReader;

use encoding_rs::{CoderResult, Decoder, Encoding, UTF_16BE, UTF_16LE, UTF_8};
use tracing::debug;

use fbox_core::FboxResult;

use crate::engine::{read_up_to, ChunkFile, ProgressFn};
use crate::plan::ResolvedSplit;

/// Decode buffer for character-oriented splits.
const DECODE_BUF_BYTES: usize = 16 * 1024;

/// Source text encoding, sniffed from the BOM.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextEncoding {
    Utf8 { bom: bool },
    Utf16Le,
    Utf16Be,
}

impl TextEncoding {
    /// Sniff the encoding from the first bytes of a file. Returns the
    /// encoding and the BOM length to skip (0 when there is none).
    pub fn detect(prefix: &[u8]) -> (Self, usize) {
        match Encoding::for_bom(prefix) {
            Some((enc, len)) if enc == UTF_8 => (TextEncoding::Utf8 { bom: true }, len),
            Some((enc, len)) if enc == UTF_16LE => (TextEncoding::Utf16Le, len),
            Some((enc, len)) if enc == UTF_16BE => (TextEncoding::Utf16Be, len),
            _ => (TextEncoding::Utf8 { bom: false }, 0),
        }
    }

    pub fn has_bom(&self) -> bool {
        !matches!(self, TextEncoding::Utf8 { bom: false })
    }

    pub(crate) fn encoding(&self) -> &'static Encoding {
        match self {
            TextEncoding::Utf8 { .. } => UTF_8,
            TextEncoding::Utf16Le => UTF_16LE,
            TextEncoding::Utf16Be => UTF_16BE,
        }
    }

    /// Encode `text` in this encoding, optionally prepending the BOM.
    ///
    /// encoding_rs only encodes to ASCII-compatible encodings, so UTF-16 is
    /// produced by hand from the UTF-16 code units.
    pub fn encode(&self, text: &str, with_bom: bool) -> Vec<u8> {
        let mut out = Vec::with_capacity(text.len() * 2 + 4);
        match self {
            TextEncoding::Utf8 { .. } => {
                if with_bom {
                    out.extend_from_slice(&[0xEF, 0xBB, 0xBF]);
                }
                out.extend_from_slice(text.as_bytes());
            }
            TextEncoding::Utf16Le => {
                if with_bom {
                    out.extend_from_slice(&[0xFF, 0xFE]);
                }
                for unit in text.encode_utf16() {
                    out.extend_from_slice(&unit.to_le_bytes());
                }
            }
            TextEncoding::Utf16Be => {
                if with_bom {
                    out.extend_from_slice(&[0xFE, 0xFF]);
                }
                for unit in text.encode_utf16() {
                    out.extend_from_slice(&unit.to_be_bytes());
                }
            }
        }
        out
    }
}

pub(crate) fn split_chars(
    plan: &ResolvedSplit,
    char_count: u64,
    progress: Option<&ProgressFn>,
) -> FboxResult<Vec<ChunkFile>> {
    let total_bytes = std::fs::metadata(&plan.source)?.len();
    let mut reader = BufReader::new(File::open(&plan.source)?);

    // Sniff the BOM from the first bytes; whatever follows it seeds the
    // decoder below.
    let mut head = [0u8; 3];
    let head_len = read_up_to(&mut reader, &mut head)?;
    let (encoding, bom_len) = TextEncoding::detect(&head[..head_len]);
    debug!(source = %plan.source.display(), ?encoding, "character split");

    let mut decoder = encoding.encoding().new_decoder_without_bom_handling();
    let mut pending = String::new();
    let mut pending_chars: usize = 0;
    let mut chunks: Vec<ChunkFile> = Vec::new();
    let mut consumed = head_len as u64;

    pending_chars += decode_append(&mut decoder, &head[bom_len..head_len], &mut pending, false);

    let per_chunk = char_count as usize;
    let mut buf = vec![0u8; DECODE_BUF_BYTES];
    loop {
        let n = read_up_to(&mut reader, &mut buf)?;
        let last = n == 0;
        pending_chars += decode_append(&mut decoder, &buf[..n], &mut pending, last);
        consumed += n as u64;

        // Drain every complete chunk the decoded backlog can fill.
        while pending_chars >= per_chunk {
            let text = split_off_chars(&mut pending, per_chunk);
            pending_chars -= per_chunk;
            write_chunk(plan, &mut chunks, encoding, &text, per_chunk as u64)?;
            if let Some(cb) = progress {
                cb(consumed, total_bytes, &format!("part {:04}", chunks.len()));
            }
        }

        if last {
            break;
        }
    }

    // Short remainder becomes the final chunk. An empty source (or one
    // holding only a BOM) produces no chunks.
    if !pending.is_empty() {
        let text = std::mem::take(&mut pending);
        write_chunk(plan, &mut chunks, encoding, &text, pending_chars as u64)?;
        if let Some(cb) = progress {
            cb(consumed, total_bytes, &format!("part {:04}", chunks.len()));
        }
    }

    Ok(chunks)
}

/// Decode `src` onto the end of `dst`, returning how many characters were
/// appended. The reservation makes a single decoder call sufficient.
fn decode_append(decoder: &mut Decoder, src: &[u8], dst: &mut String, last: bool) -> usize {
    let needed = decoder
        .max_utf8_buffer_length(src.len())
        .unwrap_or(src.len() * 3 + 16);
    dst.reserve(needed);

    let before = dst.len();
    let (result, read, _had_errors) = decoder.decode_to_string(src, dst, last);
    debug_assert_eq!(result, CoderResult::InputEmpty);
    debug_assert_eq!(read, src.len());
    dst[before..].chars().count()
}

/// Remove and return the first `count` characters of `s` (all of `s` if it
/// is shorter).
fn split_off_chars(s: &mut String, count: usize) -> String {
    let byte_idx = s
        .char_indices()
        .nth(count)
        .map(|(i, _)| i)
        .unwrap_or(s.len());
    let rest = s.split_off(byte_idx);
    std::mem::replace(s, rest)
}

fn write_chunk(
    plan: &ResolvedSplit,
    chunks: &mut Vec<ChunkFile>,
    encoding: TextEncoding,
    text: &str,
    written: u64,
) -> FboxResult<()> {
    let index = chunks.len() as u32 + 1;
    let path = plan.chunk_path(index);
    debug!(path = %path.display(), chars = written, "writing text chunk");
    std::fs::write(&path, encoding.encode(text, encoding.has_bom()))?;
    chunks.push(ChunkFile { path, index, written });
    Ok(())
}
