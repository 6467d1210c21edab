//! # gzseek core
//!
//! Core building blocks shared by the gzseek decoding stack:
//!
//! - [`bitstream`]: LSB-first bit reader with truncation detection
//! - [`window`]: 32 KiB sliding window for back-references
//! - [`crc`]: CRC-32 for gzip trailers and header checksums
//! - [`error`]: Error types
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │ L3: Container + random access (gzseek-gzip)             │
//! │     member header/trailer, multi-member reader, index   │
//! ├─────────────────────────────────────────────────────────┤
//! │ L2: Codec (gzseek-deflate)                              │
//! │     Huffman tables, block decoder, stream decoder       │
//! ├─────────────────────────────────────────────────────────┤
//! │ L1: Bits (this crate)                                   │
//! │     BitReader, SlidingWindow, CRC-32                    │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust
//! use gzseek_core::bitstream::BitReader;
//! use gzseek_core::crc::Crc32;
//! use std::io::Cursor;
//!
//! let mut reader = BitReader::new(Cursor::new(vec![0xAB, 0xCD]));
//! let bits = reader.read_bits(12).unwrap();
//! assert_eq!(bits, 0xDAB);
//!
//! assert_eq!(Crc32::compute(b"Hello, World!"), 0xEC4AC3D0);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod bitstream;
pub mod crc;
pub mod error;
pub mod window;

// Re-exports for convenience
pub use bitstream::BitReader;
pub use crc::Crc32;
pub use error::{GzError, Result, TrailerField};
pub use window::{DEFLATE_WINDOW_SIZE, SlidingWindow};
