//! Benchmarks for DEFLATE decoding throughput.
//!
//! Inputs are compressed with flate2 at several levels so that stored,
//! fixed and dynamic blocks all show up.

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use flate2::Compression;
use flate2::write::DeflateEncoder;
use gzseek_core::BitReader;
use gzseek_deflate::{Inflater, inflate};
use std::hint::black_box;
use std::io::Write;

fn generate_random(size: usize) -> Vec<u8> {
    let mut data = Vec::with_capacity(size);
    let mut seed: u64 = 0x9E3779B97F4A7C15;
    for _ in 0..size {
        seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1);
        data.push((seed >> 33) as u8);
    }
    data
}

fn generate_text_like(size: usize) -> Vec<u8> {
    let words: &[&[u8]] = &[
        b"the ", b"quick ", b"brown ", b"fox ", b"jumps ", b"over ", b"lazy ", b"dog ",
        b"gzip ", b"member ", b"window ", b"\n",
    ];
    let mut data = Vec::with_capacity(size);
    let mut i = 0usize;
    while data.len() < size {
        data.extend_from_slice(words[(i * 7 + i / 3) % words.len()]);
        i += 1;
    }
    data.truncate(size);
    data
}

fn compress(data: &[u8], level: u32) -> Vec<u8> {
    let mut encoder = DeflateEncoder::new(Vec::new(), Compression::new(level));
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

fn bench_inflate(c: &mut Criterion) {
    let mut group = c.benchmark_group("inflate");

    let inputs = [
        ("random_256KB", generate_random(256 * 1024)),
        ("text_1MB", generate_text_like(1024 * 1024)),
        ("zeros_1MB", vec![0u8; 1024 * 1024]),
    ];

    for (name, data) in &inputs {
        group.throughput(Throughput::Bytes(data.len() as u64));
        for level in [0u32, 1, 6, 9] {
            let compressed = compress(data, level);
            group.bench_with_input(
                BenchmarkId::new(*name, format!("level{}", level)),
                &compressed,
                |b, compressed| b.iter(|| inflate(black_box(compressed)).unwrap()),
            );
        }
    }

    group.finish();
}

fn bench_output_buffer_sizes(c: &mut Criterion) {
    let mut group = c.benchmark_group("inflate_buffer_size");
    let data = generate_text_like(1024 * 1024);
    let compressed = compress(&data, 6);
    group.throughput(Throughput::Bytes(data.len() as u64));

    for size in [512usize, 4096, 65536] {
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            let mut buf = vec![0u8; size];
            b.iter(|| {
                let mut bits = BitReader::new(&compressed[..]);
                let mut inflater = Inflater::new();
                let mut total = 0usize;
                while !inflater.is_finished() {
                    total += inflater.read(&mut bits, &mut buf).unwrap();
                }
                total
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_inflate, bench_output_buffer_sizes);
criterion_main!(benches);
