//! # gzseek deflate
//!
//! Streaming decoder for raw DEFLATE data (RFC 1951), the codec inside
//! gzip members.
//!
//! ## Features
//!
//! - All three block types
//!   - Stored (uncompressed) blocks
//!   - Fixed Huffman codes
//!   - Dynamic Huffman codes
//! - Output into caller-sized buffers, resuming mid-block and mid-match
//! - Decoder snapshots at block boundaries for random access
//!
//! ## Example
//!
//! ```rust
//! use gzseek_deflate::inflate;
//!
//! // A single stored block holding "Hello"
//! let data = [0x01, 0x05, 0x00, 0xFA, 0xFF, b'H', b'e', b'l', b'l', b'o'];
//! assert_eq!(inflate(&data).unwrap(), b"Hello");
//! ```
//!
//! ## Streaming
//!
//! ```rust
//! use gzseek_core::BitReader;
//! use gzseek_deflate::Inflater;
//!
//! let data = [0x01, 0x05, 0x00, 0xFA, 0xFF, b'H', b'e', b'l', b'l', b'o'];
//! let mut bits = BitReader::new(&data[..]);
//! let mut inflater = Inflater::new();
//! let mut buf = [0u8; 2];
//! let mut out = Vec::new();
//! while !inflater.is_finished() {
//!     let n = inflater.read(&mut bits, &mut buf).unwrap();
//!     out.extend_from_slice(&buf[..n]);
//! }
//! assert_eq!(out, b"Hello");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod huffman;
pub mod inflate;
pub mod tables;

// Re-exports
pub use huffman::HuffmanTree;
pub use inflate::{BlockType, Inflater, InflaterSnapshot, MAX_DICTIONARY_SIZE, inflate};
