//! Integration tests: split → join round-trips and the documented
//! chunk-arithmetic edge cases, against real files in temp directories.

use std::path::{Path, PathBuf};

use tempfile::TempDir;

use fbox_split::{join_chunks, split_file, SplitOptions, SplitStrategy};

fn write_test_file(dir: &Path, name: &str, content: &[u8]) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, content).expect("write test file");
    path
}

fn chunk_sizes(report: &fbox_split::SplitReport) -> Vec<u64> {
    report.chunks.iter().map(|c| c.written).collect()
}

#[test]
fn byte_split_25_bytes_at_10() {
    let tmp = TempDir::new().unwrap();
    let src = write_test_file(tmp.path(), "notes.txt", &[0xAB; 25]);

    let report = split_file(&SplitOptions::new(&src, SplitStrategy::Bytes(10)), None).unwrap();

    assert_eq!(report.part_count(), 3);
    assert_eq!(chunk_sizes(&report), vec![10, 10, 5]);
    assert_eq!(report.total_written, 25);

    let names: Vec<String> = report
        .chunks
        .iter()
        .map(|c| c.path.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(
        names,
        vec![
            "notes_size_part0001.txt",
            "notes_size_part0002.txt",
            "notes_size_part0003.txt",
        ]
    );
}

#[test]
fn byte_split_round_trips() {
    let tmp = TempDir::new().unwrap();
    let original: Vec<u8> = (0u64..10_000)
        .map(|i| (i.wrapping_mul(7) ^ (i >> 3)) as u8)
        .collect();
    let src = write_test_file(tmp.path(), "data.bin", &original);

    let report = split_file(&SplitOptions::new(&src, SplitStrategy::Bytes(777)), None).unwrap();
    assert_eq!(report.part_count(), 13); // ceil(10000 / 777)

    // Join back via the first chunk and compare bytes.
    std::fs::remove_file(&src).unwrap();
    let joined = join_chunks(&report.chunks[0].path, None).unwrap();
    assert_eq!(joined.parts, 13);
    assert_eq!(joined.output, tmp.path().join("data.bin"));

    let rebuilt = std::fs::read(&joined.output).unwrap();
    assert_eq!(rebuilt, original, "byte round-trip must be exact");
}

#[test]
fn exact_multiple_produces_no_empty_tail_chunk() {
    let tmp = TempDir::new().unwrap();
    let src = write_test_file(tmp.path(), "even.bin", &[1; 20]);

    let report = split_file(&SplitOptions::new(&src, SplitStrategy::Bytes(10)), None).unwrap();
    assert_eq!(chunk_sizes(&report), vec![10, 10]);
}

#[test]
fn part_count_10_bytes_3_parts() {
    let tmp = TempDir::new().unwrap();
    let src = write_test_file(tmp.path(), "ten.dat", &[9; 10]);

    let report = split_file(&SplitOptions::new(&src, SplitStrategy::Parts(3)), None).unwrap();

    // ceil(10/3) = 4 bytes per chunk: 4, 4, 2
    assert_eq!(chunk_sizes(&report), vec![4, 4, 2]);
    assert_eq!(report.mode, "part");
}

#[test]
fn part_count_rounding_can_absorb_a_part() {
    let tmp = TempDir::new().unwrap();
    let src = write_test_file(tmp.path(), "nine.dat", &[7; 9]);

    let report = split_file(&SplitOptions::new(&src, SplitStrategy::Parts(4)), None).unwrap();

    // ceil(9/4) = 3 bytes per chunk: three full chunks, not four.
    assert_eq!(chunk_sizes(&report), vec![3, 3, 3]);
    assert_eq!(report.part_count(), 3);
}

#[test]
fn empty_file_produces_zero_chunks() {
    let tmp = TempDir::new().unwrap();
    let src = write_test_file(tmp.path(), "empty.txt", b"");

    for strategy in [
        SplitStrategy::Bytes(10),
        SplitStrategy::Parts(3),
        SplitStrategy::Chars(5),
    ] {
        let report = split_file(&SplitOptions::new(&src, strategy), None).unwrap();
        assert_eq!(report.part_count(), 0, "{strategy:?}");
        assert_eq!(report.total_written, 0);
    }
    // No stray chunk files either.
    let leftovers: Vec<_> = std::fs::read_dir(tmp.path())
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_name() != "empty.txt")
        .collect();
    assert!(leftovers.is_empty(), "no chunk files expected: {leftovers:?}");
}

#[test]
fn destination_and_base_name_overrides() {
    let tmp = TempDir::new().unwrap();
    let dest = tmp.path().join("out");
    std::fs::create_dir(&dest).unwrap();
    let src = write_test_file(tmp.path(), "src.log", &[3; 12]);

    let opts = SplitOptions::new(&src, SplitStrategy::Bytes(5))
        .destination(&dest)
        .base_name("archive");
    let report = split_file(&opts, None).unwrap();

    assert_eq!(report.destination, dest);
    assert_eq!(
        report.chunks[0].path,
        dest.join("archive_size_part0001.log")
    );
}

#[test]
fn char_split_keeps_multibyte_chars_intact() {
    let tmp = TempDir::new().unwrap();
    // 8 characters, mixing 1-, 2-, and 3-byte encodings.
    let text = "aébc✓déf";
    let src = write_test_file(tmp.path(), "text.txt", text.as_bytes());

    let report = split_file(&SplitOptions::new(&src, SplitStrategy::Chars(3)), None).unwrap();

    assert_eq!(chunk_sizes(&report), vec![3, 3, 2]); // characters, not bytes
    for chunk in &report.chunks {
        let content = std::fs::read(&chunk.path).unwrap();
        assert!(
            std::str::from_utf8(&content).is_ok(),
            "chunk must not split a multi-byte character"
        );
    }

    // Concatenating the chunk text reproduces the original.
    let mut rebuilt = String::new();
    for chunk in &report.chunks {
        rebuilt.push_str(&String::from_utf8(std::fs::read(&chunk.path).unwrap()).unwrap());
    }
    assert_eq!(rebuilt, text);
}

#[test]
fn char_split_round_trips_via_join() {
    let tmp = TempDir::new().unwrap();
    let text = "naïve — résumé ✓ with\nnewlines and 漢字";
    let src = write_test_file(tmp.path(), "prose.md", text.as_bytes());

    let report = split_file(&SplitOptions::new(&src, SplitStrategy::Chars(7)), None).unwrap();
    std::fs::remove_file(&src).unwrap();

    let joined = join_chunks(&report.chunks[0].path, None).unwrap();
    let rebuilt = std::fs::read_to_string(&joined.output).unwrap();
    assert_eq!(rebuilt, text, "character round-trip must preserve text");
}

#[test]
fn utf8_bom_is_preserved_per_chunk_and_deduplicated_on_join() {
    let tmp = TempDir::new().unwrap();
    let mut raw = vec![0xEF, 0xBB, 0xBF];
    raw.extend_from_slice("hello world".as_bytes());
    let src = write_test_file(tmp.path(), "bom.txt", &raw);

    let report = split_file(&SplitOptions::new(&src, SplitStrategy::Chars(4)), None).unwrap();

    // BOM is not counted as content; every chunk carries its own.
    assert_eq!(chunk_sizes(&report), vec![4, 4, 3]);
    for chunk in &report.chunks {
        let content = std::fs::read(&chunk.path).unwrap();
        assert_eq!(&content[..3], &[0xEF, 0xBB, 0xBF]);
    }

    // Joining restores the original bytes: one BOM, same text.
    std::fs::remove_file(&src).unwrap();
    let joined = join_chunks(&report.chunks[1].path, None).unwrap();
    assert_eq!(std::fs::read(&joined.output).unwrap(), raw);
}

#[test]
fn utf16le_round_trips_text_content() {
    let tmp = TempDir::new().unwrap();
    let text = "wide chars: ✓é漢";
    let mut raw = vec![0xFF, 0xFE];
    for unit in text.encode_utf16() {
        raw.extend_from_slice(&unit.to_le_bytes());
    }
    let src = write_test_file(tmp.path(), "wide.txt", &raw);

    let report = split_file(&SplitOptions::new(&src, SplitStrategy::Chars(5)), None).unwrap();
    assert_eq!(report.total_written, text.chars().count() as u64);

    std::fs::remove_file(&src).unwrap();
    let joined = join_chunks(&report.chunks[0].path, None).unwrap();
    assert_eq!(
        std::fs::read(&joined.output).unwrap(),
        raw,
        "UTF-16 join must restore encoding, BOM, and content"
    );
}

#[test]
fn join_refuses_a_gapped_family() {
    let tmp = TempDir::new().unwrap();
    let src = write_test_file(tmp.path(), "gap.bin", &[5; 30]);

    let report = split_file(&SplitOptions::new(&src, SplitStrategy::Bytes(10)), None).unwrap();
    assert_eq!(report.part_count(), 3);

    std::fs::remove_file(&report.chunks[1].path).unwrap();
    let err = join_chunks(&report.chunks[0].path, None).unwrap_err();
    assert!(matches!(err, fbox_core::FboxError::InvalidInput(_)), "{err}");
}

#[test]
fn join_honors_explicit_output_path() {
    let tmp = TempDir::new().unwrap();
    let src = write_test_file(tmp.path(), "out.bin", &[8; 7]);

    let report = split_file(&SplitOptions::new(&src, SplitStrategy::Bytes(3)), None).unwrap();
    let target = tmp.path().join("rebuilt.bin");
    let joined = join_chunks(&report.chunks[0].path, Some(&target)).unwrap();

    assert_eq!(joined.output, target);
    assert_eq!(std::fs::read(&target).unwrap(), vec![8; 7]);
}

#[test]
fn missing_source_is_not_found() {
    let tmp = TempDir::new().unwrap();
    let err = split_file(
        &SplitOptions::new(tmp.path().join("nope.txt"), SplitStrategy::Bytes(1)),
        None,
    )
    .unwrap_err();
    assert!(matches!(err, fbox_core::FboxError::NotFound(_)), "{err}");
}

#[test]
fn directory_source_is_invalid_input() {
    let tmp = TempDir::new().unwrap();
    let err = split_file(
        &SplitOptions::new(tmp.path(), SplitStrategy::Bytes(1)),
        None,
    )
    .unwrap_err();
    assert!(matches!(err, fbox_core::FboxError::InvalidInput(_)), "{err}");
}

#[test]
fn missing_destination_is_invalid_input_and_writes_nothing() {
    let tmp = TempDir::new().unwrap();
    let src = write_test_file(tmp.path(), "src.txt", &[1; 10]);

    let opts = SplitOptions::new(&src, SplitStrategy::Bytes(2))
        .destination(tmp.path().join("missing"));
    let err = split_file(&opts, None).unwrap_err();
    assert!(matches!(err, fbox_core::FboxError::InvalidInput(_)), "{err}");

    let entries: Vec<_> = std::fs::read_dir(tmp.path())
        .unwrap()
        .filter_map(|e| e.ok())
        .collect();
    assert_eq!(entries.len(), 1, "validation failure must be a no-op");
}

#[test]
fn zero_parameter_is_invalid_input() {
    let tmp = TempDir::new().unwrap();
    let src = write_test_file(tmp.path(), "z.txt", &[1; 4]);

    for strategy in [
        SplitStrategy::Bytes(0),
        SplitStrategy::Parts(0),
        SplitStrategy::Chars(0),
    ] {
        let err = split_file(&SplitOptions::new(&src, strategy), None).unwrap_err();
        assert!(matches!(err, fbox_core::FboxError::InvalidInput(_)), "{strategy:?}");
    }
}

#[test]
fn progress_callback_sees_monotonic_totals() {
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Arc;

    let tmp = TempDir::new().unwrap();
    let src = write_test_file(tmp.path(), "p.bin", &[2; 100]);

    let high_water = Arc::new(AtomicU64::new(0));
    let hw = Arc::clone(&high_water);
    let progress: fbox_split::ProgressFn = Box::new(move |done, total, _msg| {
        assert!(done <= total);
        let prev = hw.swap(done, Ordering::SeqCst);
        assert!(done >= prev, "progress must be monotonic");
    });

    split_file(
        &SplitOptions::new(&src, SplitStrategy::Bytes(30)),
        Some(&progress),
    )
    .unwrap();
    assert_eq!(high_water.load(Ordering::SeqCst), 100);
}

mod properties {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(48))]

        /// Concatenating all chunks in index order reproduces the source
        /// bytes for any chunk size ≥ 1 and any file size.
        #[test]
        fn byte_split_concatenation_is_identity(
            data in proptest::collection::vec(any::<u8>(), 0..=2048),
            chunk_size in 1u64..=257,
        ) {
            let tmp = TempDir::new().unwrap();
            let src = write_test_file(tmp.path(), "prop.bin", &data);

            let report =
                split_file(&SplitOptions::new(&src, SplitStrategy::Bytes(chunk_size)), None)
                    .unwrap();

            let mut rebuilt = Vec::new();
            for chunk in &report.chunks {
                rebuilt.extend_from_slice(&std::fs::read(&chunk.path).unwrap());
            }
            prop_assert_eq!(rebuilt, data);
        }

        /// The part-count bound: `ceil(s / ceil(s/k))` chunks, never more
        /// than requested, and the documented last-chunk size.
        #[test]
        fn part_count_bound_holds(
            size in 1usize..=1500,
            parts in 1u32..=20,
        ) {
            let tmp = TempDir::new().unwrap();
            let data = vec![0x5A; size];
            let src = write_test_file(tmp.path(), "bound.bin", &data);

            let report =
                split_file(&SplitOptions::new(&src, SplitStrategy::Parts(parts)), None).unwrap();

            let s = size as u64;
            let per_chunk = s.div_ceil(parts as u64);
            let expected_count = s.div_ceil(per_chunk);
            prop_assert_eq!(report.part_count() as u64, expected_count);
            prop_assert!(expected_count <= parts as u64);

            let expected_last = if s % per_chunk == 0 { per_chunk } else { s % per_chunk };
            let last = report.chunks.last().unwrap();
            prop_assert_eq!(last.written, expected_last);

            // Naming monotonicity: indices 1..=n, no gaps.
            for (i, chunk) in report.chunks.iter().enumerate() {
                prop_assert_eq!(chunk.index, i as u32 + 1);
            }
        }
    }
}
