//! Constant tables of the DEFLATE format (RFC 1951).
//!
//! Fixed Huffman code lengths, length/distance base values with their
//! extra-bit counts, and the transmission order of code length codes.

use crate::huffman::HuffmanTree;
use std::sync::OnceLock;

/// Fixed literal/length code lengths (RFC 1951 Section 3.2.6).
///
/// - Symbols 0-143: 8 bits
/// - Symbols 144-255: 9 bits
/// - Symbols 256-279: 7 bits
/// - Symbols 280-287: 8 bits
pub fn fixed_litlen_lengths() -> [u8; 288] {
    let mut lengths = [8u8; 288];
    lengths[144..256].fill(9);
    lengths[256..280].fill(7);
    lengths
}

/// Fixed distance code lengths: all 30 codes use 5 bits.
///
/// The two unused codes 30 and 31 are part of the fixed code so that it
/// stays complete; the decoder rejects them as symbols.
pub fn fixed_distance_lengths() -> [u8; 32] {
    [5u8; 32]
}

/// The fixed literal/length Huffman tree, built once.
pub fn fixed_litlen_tree() -> &'static HuffmanTree {
    static TREE: OnceLock<HuffmanTree> = OnceLock::new();

    TREE.get_or_init(|| {
        HuffmanTree::from_code_lengths(&fixed_litlen_lengths())
            .expect("Fixed litlen tree construction should never fail")
    })
}

/// The fixed distance Huffman tree, built once.
pub fn fixed_distance_tree() -> &'static HuffmanTree {
    static TREE: OnceLock<HuffmanTree> = OnceLock::new();

    TREE.get_or_init(|| {
        HuffmanTree::from_code_lengths(&fixed_distance_lengths())
            .expect("Fixed distance tree construction should never fail")
    })
}

/// Length code base values (RFC 1951 Section 3.2.5), codes 257-285.
pub const LENGTH_BASE: [u16; 29] = [
    3, 4, 5, 6, 7, 8, 9, 10, // 257-264: 0 extra bits
    11, 13, 15, 17, // 265-268: 1 extra bit
    19, 23, 27, 31, // 269-272: 2 extra bits
    35, 43, 51, 59, // 273-276: 3 extra bits
    67, 83, 99, 115, // 277-280: 4 extra bits
    131, 163, 195, 227, // 281-284: 5 extra bits
    258, // 285: 0 extra bits (special case)
];

/// Number of extra bits for length codes 257-285.
pub const LENGTH_EXTRA_BITS: [u8; 29] = [
    0, 0, 0, 0, 0, 0, 0, 0, // 257-264
    1, 1, 1, 1, // 265-268
    2, 2, 2, 2, // 269-272
    3, 3, 3, 3, // 273-276
    4, 4, 4, 4, // 277-280
    5, 5, 5, 5, // 281-284
    0, // 285
];

/// Distance code base values, codes 0-29.
pub const DISTANCE_BASE: [u16; 30] = [
    1, 2, 3, 4, // 0-3: 0 extra bits
    5, 7, // 4-5: 1 extra bit
    9, 13, // 6-7: 2 extra bits
    17, 25, // 8-9: 3 extra bits
    33, 49, // 10-11: 4 extra bits
    65, 97, // 12-13: 5 extra bits
    129, 193, // 14-15: 6 extra bits
    257, 385, // 16-17: 7 extra bits
    513, 769, // 18-19: 8 extra bits
    1025, 1537, // 20-21: 9 extra bits
    2049, 3073, // 22-23: 10 extra bits
    4097, 6145, // 24-25: 11 extra bits
    8193, 12289, // 26-27: 12 extra bits
    16385, 24577, // 28-29: 13 extra bits
];

/// Number of extra bits for distance codes 0-29.
pub const DISTANCE_EXTRA_BITS: [u8; 30] = [
    0, 0, 0, 0, // 0-3
    1, 1, // 4-5
    2, 2, // 6-7
    3, 3, // 8-9
    4, 4, // 10-11
    5, 5, // 12-13
    6, 6, // 14-15
    7, 7, // 16-17
    8, 8, // 18-19
    9, 9, // 20-21
    10, 10, // 22-23
    11, 11, // 24-25
    12, 12, // 26-27
    13, 13, // 28-29
];

/// Order of code length codes in a dynamic block header (Section 3.2.7).
pub const CODE_LENGTH_ORDER: [usize; 19] = [
    16, 17, 18, 0, 8, 7, 9, 6, 10, 5, 11, 4, 12, 3, 13, 2, 14, 1, 15,
];

/// Decode a length from a length code (257-285) and its extra bits.
pub fn decode_length(code: u16, extra: u16) -> u16 {
    debug_assert!((257..=285).contains(&code), "Invalid length code: {}", code);
    LENGTH_BASE[(code - 257) as usize] + extra
}

/// Decode a distance from a distance code (0-29) and its extra bits.
pub fn decode_distance(code: u16, extra: u16) -> u16 {
    debug_assert!(code < 30, "Invalid distance code: {}", code);
    DISTANCE_BASE[code as usize] + extra
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_litlen_lengths() {
        let lengths = fixed_litlen_lengths();

        assert_eq!(lengths[0], 8);
        assert_eq!(lengths[143], 8);
        assert_eq!(lengths[144], 9);
        assert_eq!(lengths[255], 9);
        assert_eq!(lengths[256], 7); // End of block
        assert_eq!(lengths[279], 7);
        assert_eq!(lengths[280], 8);
        assert_eq!(lengths[287], 8);
    }

    #[test]
    fn test_fixed_trees() {
        assert_eq!(fixed_litlen_tree().max_code_length(), 9);
        assert_eq!(fixed_distance_tree().max_code_length(), 5);
    }

    #[test]
    fn test_length_ranges() {
        assert_eq!(decode_length(257, 0), 3);
        assert_eq!(decode_length(265, 1), 12);
        assert_eq!(decode_length(284, 30), 257);
        assert_eq!(decode_length(285, 0), 258);
    }

    #[test]
    fn test_distance_ranges() {
        assert_eq!(decode_distance(0, 0), 1);
        assert_eq!(decode_distance(4, 1), 6);
        assert_eq!(decode_distance(29, 8191), 32768);
    }

    #[test]
    fn test_bases_are_contiguous() {
        // Each code's range ends right where the next one starts.
        for i in 0..27 {
            let end = LENGTH_BASE[i] + (1 << LENGTH_EXTRA_BITS[i]);
            assert_eq!(end, LENGTH_BASE[i + 1], "length code {}", 257 + i);
        }
        for i in 0..29 {
            let end = DISTANCE_BASE[i] as u32 + (1u32 << DISTANCE_EXTRA_BITS[i]);
            assert_eq!(end, DISTANCE_BASE[i + 1] as u32, "distance code {}", i);
        }
    }
}
