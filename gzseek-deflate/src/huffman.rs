//! Canonical Huffman decoding for DEFLATE.
//!
//! DEFLATE transmits only code lengths; codes of the same length are
//! assigned consecutive values in symbol order (RFC 1951 section 3.2.2).
//!
//! # Alphabets
//!
//! - **Literal/Length**: 0-285 (0-255 literals, 256 EOB, 257-285 lengths)
//! - **Distance**: 0-29 (back-reference distances)
//! - **Code Length**: 0-18 (for encoding dynamic Huffman trees)

use gzseek_core::BitReader;
use gzseek_core::error::{GzError, Result};
use std::io::Read;

/// Maximum code length in DEFLATE (15 bits).
pub const MAX_CODE_LENGTH: usize = 15;

/// Size of the literal/length alphabet (0-285).
pub const LITLEN_ALPHABET_SIZE: usize = 286;

/// Size of the distance alphabet (0-29).
pub const DISTANCE_ALPHABET_SIZE: usize = 30;

/// Size of the code length alphabet (0-18).
pub const CODELEN_ALPHABET_SIZE: usize = 19;

/// End of block symbol.
pub const END_OF_BLOCK: u16 = 256;

/// A canonical Huffman code prepared for decoding.
///
/// Codes up to `FAST_BITS` long resolve with one table lookup on peeked
/// bits. Longer codes, and codes read while the source is nearly exhausted,
/// take the canonical walk that consumes one bit at a time.
#[derive(Debug, Clone)]
pub struct HuffmanTree {
    /// Direct lookup: (symbol, code length), length 0 for "not here".
    fast_table: Vec<(u16, u8)>,
    /// Number of bits indexing `fast_table`.
    fast_bits: u8,
    /// Longest code in this tree; 0 for an empty tree.
    max_code_length: u8,
    /// Number of codes of each length.
    counts: [u16; MAX_CODE_LENGTH + 1],
    /// Symbols ordered by (code length, symbol).
    symbols: Vec<u16>,
}

impl HuffmanTree {
    /// Number of bits for fast lookup table.
    const FAST_BITS: u8 = 9;

    /// Build a decoding tree from code lengths.
    ///
    /// `code_lengths[i]` is the bit length of symbol `i`, 0 if unused.
    ///
    /// Over-subscribed and incomplete codes are rejected, with two
    /// exceptions accepted for compatibility with zlib-produced streams:
    /// a table with no codes at all (any decode against it fails) and a
    /// table holding a single code of length 1.
    pub fn from_code_lengths(code_lengths: &[u8]) -> Result<Self> {
        if code_lengths.is_empty() {
            return Err(GzError::invalid_table("empty code length table"));
        }

        let mut counts = [0u16; MAX_CODE_LENGTH + 1];
        let mut max_length = 0u8;

        for &len in code_lengths {
            if len as usize > MAX_CODE_LENGTH {
                return Err(GzError::invalid_table(format!(
                    "code length {} exceeds maximum {}",
                    len, MAX_CODE_LENGTH
                )));
            }
            if len > 0 {
                counts[len as usize] += 1;
                max_length = max_length.max(len);
            }
        }

        if max_length == 0 {
            return Ok(Self {
                fast_table: Vec::new(),
                fast_bits: 0,
                max_code_length: 0,
                counts,
                symbols: Vec::new(),
            });
        }

        // Remaining code space after each length; negative means
        // over-subscribed, positive at the end means incomplete.
        let mut left: i32 = 1;
        for &count in &counts[1..] {
            left <<= 1;
            left -= count as i32;
            if left < 0 {
                return Err(GzError::invalid_table("over-subscribed code lengths"));
            }
        }
        let total: u16 = counts.iter().sum();
        let degenerate = total == 1 && max_length == 1;
        if left > 0 && !degenerate {
            return Err(GzError::invalid_table("incomplete code lengths"));
        }

        // First code and first symbol slot for each length.
        let mut next_code = [0u32; MAX_CODE_LENGTH + 1];
        let mut offsets = [0usize; MAX_CODE_LENGTH + 1];
        let mut code = 0u32;
        for bits in 1..=MAX_CODE_LENGTH {
            code = (code + counts[bits - 1] as u32) << 1;
            next_code[bits] = code;
            offsets[bits] = offsets[bits - 1] + counts[bits - 1] as usize;
        }

        let mut symbols = vec![0u16; total as usize];
        let fast_bits = Self::FAST_BITS.min(max_length);
        let mut fast_table = vec![(0u16, 0u8); 1 << fast_bits];

        for (symbol, &len) in code_lengths.iter().enumerate() {
            if len == 0 {
                continue;
            }
            let l = len as usize;
            symbols[offsets[l]] = symbol as u16;
            offsets[l] += 1;

            let code = next_code[l];
            next_code[l] += 1;

            if len <= fast_bits {
                // The stream carries codes MSB-first inside an LSB-first
                // bit order, so the table is indexed by the reversed code.
                let reversed = Self::reverse_bits(code as u16, len) as usize;
                for fill in 0..(1usize << (fast_bits - len)) {
                    fast_table[reversed | (fill << len)] = (symbol as u16, len);
                }
            }
        }

        Ok(Self {
            fast_table,
            fast_bits,
            max_code_length: max_length,
            counts,
            symbols,
        })
    }

    /// Reverse the low `length` bits of a code.
    fn reverse_bits(code: u16, length: u8) -> u16 {
        code.reverse_bits() >> (16 - length as u32)
    }

    /// Longest code length in this tree.
    pub fn max_code_length(&self) -> u8 {
        self.max_code_length
    }

    /// Whether the tree holds no codes.
    pub fn is_empty(&self) -> bool {
        self.max_code_length == 0
    }

    /// Decode one symbol.
    ///
    /// Fails with `InvalidHuffmanCode` when no code matches within the
    /// longest code length, and with `UnexpectedEndOfInput` when the source
    /// ends inside a code.
    #[inline]
    pub fn decode<R: Read>(&self, reader: &mut BitReader<R>) -> Result<u16> {
        if self.max_code_length == 0 {
            return Err(GzError::invalid_huffman(reader.bit_position()));
        }

        match reader.peek_bits(self.fast_bits) {
            Ok(bits) => {
                let (symbol, len) = self.fast_table[bits as usize];
                if len > 0 {
                    reader.skip_bits(len)?;
                    return Ok(symbol);
                }
                self.decode_slow(reader)
            }
            // Near the end of the input the short code may still be complete.
            Err(GzError::UnexpectedEndOfInput { .. }) => self.decode_slow(reader),
            Err(e) => Err(e),
        }
    }

    /// Canonical bit-by-bit walk.
    fn decode_slow<R: Read>(&self, reader: &mut BitReader<R>) -> Result<u16> {
        let start = reader.bit_position();
        let mut code: i32 = 0;
        let mut first: i32 = 0;
        let mut index: i32 = 0;

        for len in 1..=self.max_code_length as usize {
            code |= reader.read_bits(1)? as i32;
            let count = self.counts[len] as i32;
            if code - first < count {
                return Ok(self.symbols[(index + code - first) as usize]);
            }
            index += count;
            first = (first + count) << 1;
            code <<= 1;
        }

        Err(GzError::invalid_huffman(start))
    }
}
