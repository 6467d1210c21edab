//! Error types for gzseek operations.
//!
//! A single error enum covers every failure of the decoding stack: I/O
//! errors from the byte source, truncation, container format violations,
//! bitstream corruption, and caller misuse of the seekable reader.
//!
//! Truncation ([`GzError::UnexpectedEndOfInput`]) and the empty-source
//! condition ([`GzError::EmptyInput`]) are kept apart so that a reader can
//! tell "nothing was there" from "something was cut short".

use std::io;
use thiserror::Error;

/// The main error type for gzseek operations.
#[derive(Debug, Error)]
pub enum GzError {
    /// I/O error from the underlying byte source.
    #[error("I/O error: {0}")]
    Io(#[source] io::Error),

    /// The source ran out of bytes in the middle of a structure.
    #[error("Unexpected end of input at bit position {bit_position}")]
    UnexpectedEndOfInput {
        /// Absolute bit position at which more input was required, 0 when
        /// the error was converted from an `io::Error` and is unknown.
        bit_position: u64,
    },

    /// The source held no bytes at all where a member header could begin.
    #[error("Empty input: no gzip member present")]
    EmptyInput,

    /// Invalid gzip header (bad magic, reserved flags, trailing garbage).
    #[error("Invalid header: {message}")]
    InvalidHeader {
        /// Description of the header error.
        message: String,
    },

    /// Compression method other than DEFLATE.
    #[error("Unsupported compression method: {method}")]
    UnsupportedMethod {
        /// The method byte found in the header.
        method: u8,
    },

    /// Header CRC16 mismatch.
    #[error("Header checksum mismatch: expected {expected:#06x}, computed {computed:#06x}")]
    HeaderChecksum {
        /// CRC16 stored in the header.
        expected: u16,
        /// CRC16 computed over the header bytes.
        computed: u16,
    },

    /// Trailer CRC-32 or length mismatch.
    #[error("Checksum error in {field}: expected {expected:#x}, computed {computed:#x}")]
    Checksum {
        /// Which trailer field failed to verify.
        field: TrailerField,
        /// Value stored in the trailer.
        expected: u32,
        /// Value computed from the decompressed data.
        computed: u32,
    },

    /// Malformed Huffman code length table.
    #[error("Invalid Huffman table: {message}")]
    InvalidHuffmanTable {
        /// Description of the table error.
        message: String,
    },

    /// No Huffman code matched within the maximum code length.
    #[error("Invalid Huffman code at bit position {bit_position}")]
    InvalidHuffmanCode {
        /// Bit position where the invalid code was found.
        bit_position: u64,
    },

    /// Inconsistent dynamic block header.
    #[error("Invalid dynamic block header: {message}")]
    InvalidDynamicHeader {
        /// Description of the header error.
        message: String,
    },

    /// Stored block LEN does not match the complement of NLEN.
    #[error("Stored block length mismatch: LEN {len:#06x}, NLEN {nlen:#06x}")]
    StoredBlockLengthMismatch {
        /// LEN field.
        len: u16,
        /// NLEN field.
        nlen: u16,
    },

    /// Back-reference reaching before the start of the history.
    #[error("Invalid back-reference distance: {distance} exceeds history size {available}")]
    InvalidBackReference {
        /// The invalid distance value.
        distance: usize,
        /// Bytes of history available.
        available: usize,
    },

    /// Other bitstream corruption.
    #[error("Corrupted data at offset {offset}: {message}")]
    CorruptedData {
        /// Byte offset where corruption was detected.
        offset: u64,
        /// Description of the corruption.
        message: String,
    },

    /// Seek target beyond the end of the decompressed stream.
    #[error("Seek target {target} is beyond the end of the stream ({length} bytes)")]
    SeekOutOfRange {
        /// Requested decompressed offset.
        target: u64,
        /// Total decompressed length.
        length: u64,
    },

    /// Operation on a reader that has been closed.
    #[error("Reader used after close")]
    UseAfterClose,
}

/// Trailer field that failed verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrailerField {
    /// CRC-32 of the decompressed data.
    Crc32,
    /// Decompressed length modulo 2^32.
    Size,
}

impl std::fmt::Display for TrailerField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TrailerField::Crc32 => f.write_str("CRC-32"),
            TrailerField::Size => f.write_str("ISIZE"),
        }
    }
}

/// Result type alias for gzseek operations.
pub type Result<T> = std::result::Result<T, GzError>;

impl From<io::Error> for GzError {
    fn from(err: io::Error) -> Self {
        if err.kind() == io::ErrorKind::UnexpectedEof {
            // A source that reports its own short read is still truncation.
            // The position is not known here; `BitReader` fills it in.
            return Self::unexpected_eof(0);
        }
        Self::Io(err)
    }
}

impl From<GzError> for io::Error {
    fn from(err: GzError) -> Self {
        match err {
            GzError::Io(inner) => inner,
            GzError::UnexpectedEndOfInput { .. } => io::Error::new(io::ErrorKind::UnexpectedEof, err),
            GzError::SeekOutOfRange { .. } => io::Error::new(io::ErrorKind::InvalidInput, err),
            GzError::UseAfterClose => io::Error::other(err),
            other => io::Error::new(io::ErrorKind::InvalidData, other),
        }
    }
}

impl GzError {
    /// Create an unexpected end of input error.
    pub fn unexpected_eof(bit_position: u64) -> Self {
        Self::UnexpectedEndOfInput { bit_position }
    }

    /// Create an invalid header error.
    pub fn invalid_header(message: impl Into<String>) -> Self {
        Self::InvalidHeader {
            message: message.into(),
        }
    }

    /// Create an unsupported method error.
    pub fn unsupported_method(method: u8) -> Self {
        Self::UnsupportedMethod { method }
    }

    /// Create a header checksum error.
    pub fn header_checksum(expected: u16, computed: u16) -> Self {
        Self::HeaderChecksum { expected, computed }
    }

    /// Create a trailer checksum error.
    pub fn checksum(field: TrailerField, expected: u32, computed: u32) -> Self {
        Self::Checksum {
            field,
            expected,
            computed,
        }
    }

    /// Create an invalid Huffman table error.
    pub fn invalid_table(message: impl Into<String>) -> Self {
        Self::InvalidHuffmanTable {
            message: message.into(),
        }
    }

    /// Create an invalid Huffman code error.
    pub fn invalid_huffman(bit_position: u64) -> Self {
        Self::InvalidHuffmanCode { bit_position }
    }

    /// Create an invalid dynamic header error.
    pub fn invalid_dynamic(message: impl Into<String>) -> Self {
        Self::InvalidDynamicHeader {
            message: message.into(),
        }
    }

    /// Create an invalid back-reference error.
    pub fn invalid_distance(distance: usize, available: usize) -> Self {
        Self::InvalidBackReference {
            distance,
            available,
        }
    }

    /// Create a corrupted data error.
    pub fn corrupted(offset: u64, message: impl Into<String>) -> Self {
        Self::CorruptedData {
            offset,
            message: message.into(),
        }
    }

    /// Create a seek out of range error.
    pub fn seek_out_of_range(target: u64, length: u64) -> Self {
        Self::SeekOutOfRange { target, length }
    }

    /// Whether the error means the source was cut short.
    pub fn is_truncation(&self) -> bool {
        matches!(self, Self::UnexpectedEndOfInput { .. })
    }

    /// Whether the error means the compressed data itself is damaged.
    pub fn is_corruption(&self) -> bool {
        matches!(
            self,
            Self::InvalidHeader { .. }
                | Self::HeaderChecksum { .. }
                | Self::Checksum { .. }
                | Self::InvalidHuffmanTable { .. }
                | Self::InvalidHuffmanCode { .. }
                | Self::InvalidDynamicHeader { .. }
                | Self::StoredBlockLengthMismatch { .. }
                | Self::InvalidBackReference { .. }
                | Self::CorruptedData { .. }
        )
    }

    /// Produce an error of the same kind for a reader that already failed.
    ///
    /// Errors are not `Clone` because of the wrapped `io::Error`; a sticky
    /// copy keeps the kind and the message.
    pub fn sticky_copy(&self) -> Self {
        match self {
            Self::Io(e) => Self::Io(io::Error::new(e.kind(), e.to_string())),
            Self::UnexpectedEndOfInput { bit_position } => Self::unexpected_eof(*bit_position),
            Self::EmptyInput => Self::EmptyInput,
            Self::InvalidHeader { message } => Self::invalid_header(message.clone()),
            Self::UnsupportedMethod { method } => Self::unsupported_method(*method),
            Self::HeaderChecksum { expected, computed } => {
                Self::header_checksum(*expected, *computed)
            }
            Self::Checksum {
                field,
                expected,
                computed,
            } => Self::checksum(*field, *expected, *computed),
            Self::InvalidHuffmanTable { message } => Self::invalid_table(message.clone()),
            Self::InvalidHuffmanCode { bit_position } => Self::invalid_huffman(*bit_position),
            Self::InvalidDynamicHeader { message } => Self::invalid_dynamic(message.clone()),
            Self::StoredBlockLengthMismatch { len, nlen } => Self::StoredBlockLengthMismatch {
                len: *len,
                nlen: *nlen,
            },
            Self::InvalidBackReference {
                distance,
                available,
            } => Self::invalid_distance(*distance, *available),
            Self::CorruptedData { offset, message } => Self::corrupted(*offset, message.clone()),
            Self::SeekOutOfRange { target, length } => Self::seek_out_of_range(*target, *length),
            Self::UseAfterClose => Self::UseAfterClose,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = GzError::checksum(TrailerField::Crc32, 0x12345678, 0xDEADBEEF);
        assert!(err.to_string().contains("CRC-32"));

        let err = GzError::unsupported_method(7);
        assert!(err.to_string().contains('7'));

        let err = GzError::header_checksum(0xfd92, 0x0000);
        assert!(err.to_string().contains("0xfd92"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let err: GzError = io_err.into();
        assert!(matches!(err, GzError::Io(_)));

        let io_err = io::Error::from(io::ErrorKind::UnexpectedEof);
        let err: GzError = io_err.into();
        assert!(matches!(err, GzError::UnexpectedEndOfInput { bit_position: 0 }));
    }

    #[test]
    fn test_into_io_error_keeps_kind() {
        let err: io::Error = GzError::unexpected_eof(12).into();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
        let inner = err.get_ref().and_then(|e| e.downcast_ref::<GzError>());
        assert!(matches!(inner, Some(GzError::UnexpectedEndOfInput { .. })));

        let err: io::Error = GzError::checksum(TrailerField::Size, 12, 255).into();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn test_classification() {
        assert!(GzError::invalid_distance(10, 2).is_corruption());
        assert!(!GzError::UseAfterClose.is_corruption());
        assert!(!GzError::EmptyInput.is_truncation());
    }

    #[test]
    fn test_sticky_copy() {
        let err = GzError::StoredBlockLengthMismatch {
            len: 5,
            nlen: 0x1234,
        };
        assert!(matches!(
            err.sticky_copy(),
            GzError::StoredBlockLengthMismatch { len: 5, nlen: 0x1234 }
        ));
    }
}
