//! In-memory seek index over a gzip stream.
//!
//! A [`Checkpoint`] records everything needed to restart decoding at a
//! DEFLATE block boundary: the absolute bit offset in the source, the
//! decompressed offset, which member it lies in and the 32 KiB of history
//! preceding it. [`SeekIndex`] keeps checkpoints sorted and spaced at least
//! [`IndexConfig::interval`] bytes apart.

use gzseek_core::Crc32;
use gzseek_deflate::InflaterSnapshot;
use tracing::debug;

/// Checkpoint spacing and memory policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexConfig {
    /// Minimum decompressed distance between checkpoints.
    pub interval: u64,
    /// Checkpoints kept before the index is thinned out.
    pub max_checkpoints: usize,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            interval: 1024 * 1024,
            max_checkpoints: 1024,
        }
    }
}

impl IndexConfig {
    /// Set the checkpoint interval in decompressed bytes (at least 1).
    pub fn with_interval(mut self, interval: u64) -> Self {
        self.interval = interval.max(1);
        self
    }

    /// Set the checkpoint cap (at least 2).
    pub fn with_max_checkpoints(mut self, max_checkpoints: usize) -> Self {
        self.max_checkpoints = max_checkpoints.max(2);
        self
    }
}

/// Restartable decoder state at a block boundary.
#[derive(Debug, Clone)]
pub struct Checkpoint {
    /// Absolute bit offset of the next block header in the source.
    pub compressed_bit_offset: u64,
    /// Decompressed offset across all members.
    pub decompressed_offset: u64,
    /// Zero-based index of the member containing the checkpoint.
    pub member_index: usize,
    /// Decompressed offset within that member.
    pub member_offset: u64,
    /// Checksum state of the member data before the checkpoint.
    pub crc: Crc32,
    /// Window contents preceding the checkpoint.
    pub window: InflaterSnapshot,
}

impl Checkpoint {
    /// Heap bytes held by this checkpoint.
    pub fn size_in_bytes(&self) -> usize {
        self.window.size_in_bytes()
    }
}

/// Sorted checkpoints plus what is known about the stream length.
#[derive(Debug, Clone, Default)]
pub struct SeekIndex {
    config: IndexConfig,
    checkpoints: Vec<Checkpoint>,
    total_len: Option<u64>,
}

impl SeekIndex {
    /// Create an empty index.
    pub fn new(config: IndexConfig) -> Self {
        Self {
            config,
            checkpoints: Vec::new(),
            total_len: None,
        }
    }

    /// Current spacing; grows as the index is thinned out.
    pub fn interval(&self) -> u64 {
        self.config.interval
    }

    /// Recorded checkpoints, sorted by decompressed offset.
    pub fn checkpoints(&self) -> &[Checkpoint] {
        &self.checkpoints
    }

    /// Number of checkpoints.
    pub fn len(&self) -> usize {
        self.checkpoints.len()
    }

    /// Whether no checkpoint has been recorded.
    pub fn is_empty(&self) -> bool {
        self.checkpoints.is_empty()
    }

    /// Decompressed length, once the end of the stream has been seen.
    pub fn total_len(&self) -> Option<u64> {
        self.total_len
    }

    /// Record the decompressed length of the whole stream.
    pub fn set_total_len(&mut self, len: u64) {
        if self.total_len.is_none() {
            debug!(len, checkpoints = self.checkpoints.len(), "seek index complete");
        }
        self.total_len = Some(len);
    }

    /// Offset of the last checkpoint, 0 when there is none.
    pub fn frontier(&self) -> u64 {
        self.checkpoints
            .last()
            .map_or(0, |cp| cp.decompressed_offset)
    }

    /// Whether a checkpoint at `offset` would be recorded.
    pub fn wants(&self, offset: u64) -> bool {
        offset >= self.frontier().saturating_add(self.config.interval)
    }

    /// Add a checkpoint beyond the frontier; returns whether it was kept.
    pub fn insert(&mut self, checkpoint: Checkpoint) -> bool {
        if !self.wants(checkpoint.decompressed_offset) {
            return false;
        }
        debug!(
            offset = checkpoint.decompressed_offset,
            bit_offset = checkpoint.compressed_bit_offset,
            member = checkpoint.member_index,
            "checkpoint"
        );
        self.checkpoints.push(checkpoint);

        if self.checkpoints.len() > self.config.max_checkpoints {
            self.compact();
        }
        true
    }

    /// Keep every other checkpoint and double the interval.
    fn compact(&mut self) {
        let mut index = 0;
        self.checkpoints.retain(|_| {
            index += 1;
            index % 2 == 0
        });
        self.config.interval = self.config.interval.saturating_mul(2);
        debug!(
            kept = self.checkpoints.len(),
            interval = self.config.interval,
            "seek index compacted"
        );
    }

    /// The checkpoint with the largest offset not past `target`.
    pub fn nearest(&self, target: u64) -> Option<&Checkpoint> {
        let idx = self
            .checkpoints
            .partition_point(|cp| cp.decompressed_offset <= target);
        idx.checked_sub(1).map(|i| &self.checkpoints[i])
    }

    /// Heap bytes held by all checkpoints.
    pub fn size_in_bytes(&self) -> usize {
        self.checkpoints.iter().map(Checkpoint::size_in_bytes).sum()
    }

    /// Drop all checkpoints.
    pub fn clear(&mut self) {
        self.checkpoints = Vec::new();
    }
}
