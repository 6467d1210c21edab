//! # gzseek gzip
//!
//! GZIP container support (RFC 1952) on top of the gzseek DEFLATE decoder:
//!
//! - [`header`]: member header parsing, including the optional extra field,
//!   file name, comment and header CRC
//! - [`member`]: member body decoding and trailer verification
//! - [`reader`]: [`GzipReader`], a streaming reader over one or more
//!   concatenated members
//! - [`index`]: the in-memory checkpoint index
//! - [`seekable`]: [`SeekableReader`], random access through the index
//!
//! ## Example
//!
//! ```rust
//! use gzseek_gzip::GzipReader;
//!
//! // An empty source is a valid stream with no members.
//! let mut reader = GzipReader::new(&[][..]).unwrap();
//! assert_eq!(reader.members(), 0);
//! assert!(reader.decompress().unwrap().is_empty());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod header;
pub mod index;
pub mod member;
pub mod reader;
pub mod seekable;

// Re-exports
pub use gzseek_core::{GzError, Result, TrailerField};
pub use header::{CM_DEFLATE, GZIP_MAGIC, MemberHeader};
pub use index::{Checkpoint, IndexConfig, SeekIndex};
pub use member::{MemberDecoder, MemberTrailer};
pub use reader::{GzipReader, decompress};
pub use seekable::{SeekableReader, SharedSeekableReader};
