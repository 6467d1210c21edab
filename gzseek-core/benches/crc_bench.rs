//! Benchmarks for the CRC-32 and bit reader hot paths.
//!
//! - CRC-32 throughput across data sizes (bytewise vs slicing-by-8 threshold)
//! - Incremental updates in decoder-sized chunks, as the gzip reader does
//! - Variable-width bit reads as issued by the Huffman decoder

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use gzseek_core::bitstream::BitReader;
use gzseek_core::crc::Crc32;
use std::hint::black_box;
use std::io::Cursor;

/// Reproducible pseudo-random bytes.
fn random(size: usize) -> Vec<u8> {
    let mut data = Vec::with_capacity(size);
    let mut seed: u64 = 0x123456789ABCDEF0;
    for _ in 0..size {
        seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1);
        data.push((seed >> 32) as u8);
    }
    data
}

fn bench_crc32_sizes(c: &mut Criterion) {
    let mut group = c.benchmark_group("crc32_sizes");

    for (name, size) in [
        ("15B", 15),
        ("16B", 16),
        ("4KB", 4 * 1024),
        ("64KB", 64 * 1024),
        ("1MB", 1024 * 1024),
    ] {
        let data = random(size);
        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(name), &data, |b, data| {
            b.iter(|| Crc32::compute(black_box(data)))
        });
    }

    group.finish();
}

fn bench_crc32_incremental(c: &mut Criterion) {
    let mut group = c.benchmark_group("crc32_incremental");
    let data = random(1024 * 1024);
    group.throughput(Throughput::Bytes(data.len() as u64));

    for chunk in [64usize, 4096, 32768] {
        group.bench_with_input(BenchmarkId::new("chunk", chunk), &chunk, |b, &chunk| {
            b.iter(|| {
                let mut crc = Crc32::new();
                for piece in data.chunks(chunk) {
                    crc.update(black_box(piece));
                }
                crc.value()
            })
        });
    }

    group.finish();
}

fn bench_bit_reads(c: &mut Criterion) {
    let mut group = c.benchmark_group("bit_reads");
    let data = random(64 * 1024);
    group.throughput(Throughput::Bytes(data.len() as u64));

    group.bench_function("mixed_widths", |b| {
        b.iter(|| {
            let mut reader = BitReader::new(Cursor::new(&data));
            let mut sum = 0u64;
            let widths = [1u8, 2, 3, 5, 7, 9, 13];
            let mut i = 0;
            while let Ok(v) = reader.read_bits(widths[i % widths.len()]) {
                sum = sum.wrapping_add(v as u64);
                i += 1;
            }
            sum
        })
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_crc32_sizes,
    bench_crc32_incremental,
    bench_bit_reads
);
criterion_main!(benches);
