//! Edge case tests for DEFLATE decompression.
//!
//! Streams are produced by flate2 (zlib/miniz) so the decoder is checked
//! against an independent encoder.

use flate2::Compression;
use flate2::write::DeflateEncoder;
use gzseek_core::{BitReader, GzError};
use gzseek_deflate::{Inflater, inflate};
use std::io::Write;

fn deflate(data: &[u8], level: u32) -> Vec<u8> {
    let mut encoder = DeflateEncoder::new(Vec::new(), Compression::new(level));
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

fn pseudo_random(size: usize, mut seed: u32) -> Vec<u8> {
    (0..size)
        .map(|_| {
            seed ^= seed << 13;
            seed ^= seed >> 17;
            seed ^= seed << 5;
            seed as u8
        })
        .collect()
}

#[test]
fn test_empty_input() {
    for level in [0, 6] {
        let compressed = deflate(b"", level);
        assert!(inflate(&compressed).unwrap().is_empty());
    }
}

#[test]
fn test_single_byte() {
    let compressed = deflate(b"A", 6);
    assert_eq!(inflate(&compressed).unwrap(), b"A");
}

#[test]
fn test_all_zeros() {
    let input = vec![0u8; 100_000];
    let compressed = deflate(&input, 9);
    assert!(compressed.len() < input.len() / 100);
    assert_eq!(inflate(&compressed).unwrap(), input);
}

#[test]
fn test_max_match_length() {
    let mut input = Vec::new();
    for i in 0..10u8 {
        input.extend_from_slice(&[i; 258]);
    }
    let compressed = deflate(&input, 9);
    assert_eq!(inflate(&compressed).unwrap(), input);
}

#[test]
fn test_max_distance() {
    // A block repeated exactly one window later.
    let block = pseudo_random(1000, 7);
    let mut input = block.clone();
    input.extend(pseudo_random(32768 - 1000, 99));
    input.extend_from_slice(&block);

    let compressed = deflate(&input, 9);
    assert_eq!(inflate(&compressed).unwrap(), input);
}

#[test]
fn test_stored_blocks_over_64k() {
    // Level 0 splits into several stored blocks.
    let input = pseudo_random(200_000, 1);
    let compressed = deflate(&input, 0);
    assert_eq!(inflate(&compressed).unwrap(), input);
}

#[test]
fn test_dynamic_blocks() {
    let text = b"It was the best of times, it was the worst of times. ".repeat(4000);
    for level in [1, 6, 9] {
        let compressed = deflate(&text, level);
        assert_eq!(inflate(&compressed).unwrap(), text, "level {}", level);
    }
}

#[test]
fn test_random_data_all_levels() {
    let input = pseudo_random(70_000, 0xDEAD_BEEF);
    for level in 0..=9 {
        let compressed = deflate(&input, level);
        assert_eq!(inflate(&compressed).unwrap(), input, "level {}", level);
    }
}

#[test]
fn test_one_byte_output_buffer() {
    let input = b"abcabcabcabcabcabc-xyzxyzxyz".repeat(50);
    let compressed = deflate(&input, 9);

    let mut bits = BitReader::new(&compressed[..]);
    let mut inflater = Inflater::new();
    let mut output = Vec::new();
    let mut buf = [0u8; 1];
    while !inflater.is_finished() {
        let n = inflater.read(&mut bits, &mut buf).unwrap();
        output.extend_from_slice(&buf[..n]);
    }
    assert_eq!(output, input);
}

#[test]
fn test_every_truncation_fails() {
    let input = b"hello hello hello, truncated world".repeat(20);
    let compressed = deflate(&input, 6);

    for cut in 0..compressed.len() {
        let err = inflate(&compressed[..cut]).unwrap_err();
        assert!(
            err.is_truncation(),
            "cut at {} gave {:?} instead of truncation",
            cut,
            err
        );
    }
}

#[test]
fn test_trailing_bytes_left_unread() {
    let mut compressed = deflate(b"payload", 6);
    let end = compressed.len();
    compressed.extend_from_slice(b"TRAILER!");

    let mut bits = BitReader::new(&compressed[..]);
    let output = Inflater::new().read_to_end(&mut bits).unwrap();
    assert_eq!(output, b"payload");

    // The decoder stops inside the last byte of the stream.
    assert_eq!(bits.byte_position(), end as u64);
}

#[test]
fn test_resume_from_every_boundary() {
    let input = pseudo_random(40_000, 3)
        .into_iter()
        .chain(b"repeat me ".repeat(5000))
        .collect::<Vec<_>>();
    // Small stored blocks give many boundaries.
    let compressed = deflate(&input, 0);

    let mut bits = BitReader::new(&compressed[..]);
    let mut inflater = Inflater::new();
    let mut produced = 0usize;
    let mut boundaries = Vec::new();
    let mut buf = vec![0u8; 4096];

    while !inflater.is_finished() {
        if let Some(snapshot) = inflater.snapshot() {
            boundaries.push((bits.bit_position(), produced, snapshot));
        }
        produced += inflater.read(&mut bits, &mut buf).unwrap();
    }
    assert_eq!(produced, input.len());
    assert!(boundaries.len() > 1);

    for (bit_offset, offset, snapshot) in boundaries {
        let mut bits = BitReader::new(&compressed[..]);
        // Skip to the recorded position.
        let mut remaining = bit_offset;
        while remaining > 0 {
            let step = remaining.min(32) as u8;
            bits.skip_bits(step).unwrap();
            remaining -= step as u64;
        }
        let tail = Inflater::restore(&snapshot).read_to_end(&mut bits).unwrap();
        assert_eq!(tail, &input[offset..]);
    }
}

#[test]
fn test_corrupted_stream_is_reported() {
    let mut compressed = deflate(&b"some text to corrupt ".repeat(100), 9);
    compressed[2] ^= 0xFF;
    compressed[3] ^= 0x55;

    match inflate(&compressed) {
        Ok(output) => assert_ne!(output, b"some text to corrupt ".repeat(100)),
        Err(e) => assert!(e.is_corruption() || e.is_truncation(), "{:?}", e),
    }
}

#[test]
fn test_invalid_back_reference_kind() {
    // Fixed block: length 3, distance 1, with nothing decoded yet.
    let err = inflate(&[0x03, 0x02, 0x00]).unwrap_err();
    assert!(matches!(err, GzError::InvalidBackReference { .. }));
}
