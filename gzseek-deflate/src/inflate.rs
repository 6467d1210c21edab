//! Streaming DEFLATE decompression (inflate).
//!
//! [`Inflater`] decodes a raw DEFLATE stream (RFC 1951) into caller-provided
//! buffers. It supports all three block types:
//! - Type 0: Stored (uncompressed)
//! - Type 1: Fixed Huffman codes
//! - Type 2: Dynamic Huffman codes
//!
//! Each [`Inflater::read`] call stays within one block: it returns early
//! when the current block ends, so the caller can observe every block
//! boundary. At a boundary the decoder state is nothing but the sliding
//! window and the bit position, which is what [`InflaterSnapshot`] captures.

use crate::huffman::{
    CODELEN_ALPHABET_SIZE, DISTANCE_ALPHABET_SIZE, END_OF_BLOCK, HuffmanTree, LITLEN_ALPHABET_SIZE,
};
use crate::tables::{
    CODE_LENGTH_ORDER, DISTANCE_EXTRA_BITS, LENGTH_EXTRA_BITS, decode_distance, decode_length,
    fixed_distance_tree, fixed_litlen_tree,
};
use gzseek_core::error::{GzError, Result};
use gzseek_core::{BitReader, SlidingWindow};
use std::io::Read;
use tracing::trace;

/// Maximum back-reference distance for DEFLATE (32 KiB).
pub const MAX_DICTIONARY_SIZE: usize = gzseek_core::DEFLATE_WINDOW_SIZE;

/// Block type carried in the 2-bit BTYPE field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockType {
    /// BTYPE 00.
    Stored,
    /// BTYPE 01.
    FixedHuffman,
    /// BTYPE 10.
    DynamicHuffman,
}

/// Where the decoder is within the block sequence.
#[derive(Debug)]
enum BlockState {
    /// Next bits are a block header.
    Header,
    /// Inside a stored block.
    Stored { remaining: usize },
    /// Inside a Huffman-coded block.
    Huffman(Codes),
    /// The final block has ended.
    Done,
}

/// Code tables of the current Huffman block.
#[derive(Debug)]
enum Codes {
    Fixed,
    Dynamic(Box<DynamicCodes>),
}

#[derive(Debug)]
struct DynamicCodes {
    litlen: HuffmanTree,
    dist: HuffmanTree,
}

impl Codes {
    fn trees(&self) -> (&HuffmanTree, &HuffmanTree) {
        match self {
            Codes::Fixed => (fixed_litlen_tree(), fixed_distance_tree()),
            Codes::Dynamic(codes) => (&codes.litlen, &codes.dist),
        }
    }
}

/// A back-reference that did not fit the previous output buffer.
#[derive(Debug, Clone, Copy)]
struct PendingCopy {
    distance: usize,
    remaining: usize,
}

/// Decoder state captured at a block boundary.
///
/// An owned copy: the live decoder may keep advancing without affecting it.
#[derive(Debug, Clone)]
pub struct InflaterSnapshot {
    history: Box<[u8]>,
}

impl InflaterSnapshot {
    /// The captured window contents, oldest byte first.
    pub fn history(&self) -> &[u8] {
        &self.history
    }

    /// Heap bytes held by this snapshot.
    pub fn size_in_bytes(&self) -> usize {
        self.history.len()
    }
}

/// Streaming DEFLATE decompressor.
#[derive(Debug)]
pub struct Inflater {
    /// Back-reference history.
    window: SlidingWindow,
    /// Block sequencing state.
    state: BlockState,
    /// Whether the block being decoded carries BFINAL.
    final_block: bool,
    /// Copy interrupted by a full output buffer.
    pending: Option<PendingCopy>,
}

impl Inflater {
    /// Create a new DEFLATE decompressor.
    pub fn new() -> Self {
        Self {
            window: SlidingWindow::deflate(),
            state: BlockState::Header,
            final_block: false,
            pending: None,
        }
    }

    /// Rebuild a decompressor positioned at a block header.
    ///
    /// The bit reader handed to later [`read`](Self::read) calls must be at
    /// the bit position recorded alongside the snapshot.
    pub fn restore(snapshot: &InflaterSnapshot) -> Self {
        Self {
            window: SlidingWindow::from_history(MAX_DICTIONARY_SIZE, &snapshot.history),
            state: BlockState::Header,
            final_block: false,
            pending: None,
        }
    }

    /// Reset for a new DEFLATE stream, forgetting all history.
    pub fn reset(&mut self) {
        self.window.clear();
        self.state = BlockState::Header;
        self.final_block = false;
        self.pending = None;
    }

    /// Whether the final block has been fully decoded.
    pub fn is_finished(&self) -> bool {
        matches!(self.state, BlockState::Done)
    }

    /// Whether the next bits to decode are a block header.
    pub fn at_block_boundary(&self) -> bool {
        matches!(self.state, BlockState::Header)
    }

    /// Capture the decoder state; `None` unless at a block boundary.
    pub fn snapshot(&self) -> Option<InflaterSnapshot> {
        self.at_block_boundary().then(|| InflaterSnapshot {
            history: self.window.snapshot(),
        })
    }

    /// Decompress into `out`, returning the number of bytes produced.
    ///
    /// Returns early at the end of each block. `Ok(0)` with a non-empty
    /// `out` means either an empty block just ended (call again) or the
    /// stream is finished ([`is_finished`](Self::is_finished)).
    pub fn read<R: Read>(&mut self, bits: &mut BitReader<R>, out: &mut [u8]) -> Result<usize> {
        if out.is_empty() {
            return Ok(0);
        }

        if matches!(self.state, BlockState::Header) {
            self.state = self.read_block_header(bits)?;
        }

        let (written, block_ended) = match &mut self.state {
            BlockState::Header => unreachable!("block header was just consumed"),
            BlockState::Done => return Ok(0),
            BlockState::Stored { remaining } => {
                let count = (*remaining).min(out.len());
                bits.read_bytes(&mut out[..count])?;
                self.window.extend(&out[..count]);
                *remaining -= count;
                (count, *remaining == 0)
            }
            BlockState::Huffman(codes) => {
                let (litlen, dist) = codes.trees();
                decode_huffman(bits, litlen, dist, &mut self.window, &mut self.pending, out)?
            }
        };

        if block_ended {
            self.state = if self.final_block {
                BlockState::Done
            } else {
                BlockState::Header
            };
        }

        Ok(written)
    }

    /// Decode everything up to the end of the final block into a `Vec`.
    pub fn read_to_end<R: Read>(&mut self, bits: &mut BitReader<R>) -> Result<Vec<u8>> {
        let mut output = Vec::new();
        let mut buf = vec![0u8; MAX_DICTIONARY_SIZE];
        while !self.is_finished() {
            let n = self.read(bits, &mut buf)?;
            output.extend_from_slice(&buf[..n]);
        }
        Ok(output)
    }

    /// Read a block header and set up the block body.
    fn read_block_header<R: Read>(&mut self, bits: &mut BitReader<R>) -> Result<BlockState> {
        let bfinal = bits.read_bit()?;
        let btype = match bits.read_bits(2)? {
            0 => BlockType::Stored,
            1 => BlockType::FixedHuffman,
            2 => BlockType::DynamicHuffman,
            _ => {
                return Err(GzError::corrupted(
                    bits.bit_position() / 8,
                    "reserved block type 3",
                ));
            }
        };
        self.final_block = bfinal;
        trace!(?btype, bfinal, bit_position = bits.bit_position(), "deflate block");

        match btype {
            BlockType::Stored => {
                bits.align_to_byte();
                let len = bits.read_u16_le()?;
                let nlen = bits.read_u16_le()?;
                if len != !nlen {
                    return Err(GzError::StoredBlockLengthMismatch { len, nlen });
                }
                Ok(BlockState::Stored {
                    remaining: len as usize,
                })
            }
            BlockType::FixedHuffman => Ok(BlockState::Huffman(Codes::Fixed)),
            BlockType::DynamicHuffman => {
                let codes = read_dynamic_codes(bits)?;
                Ok(BlockState::Huffman(Codes::Dynamic(Box::new(codes))))
            }
        }
    }
}

impl Default for Inflater {
    fn default() -> Self {
        Self::new()
    }
}

/// Read the code length code and the two trees of a dynamic block.
fn read_dynamic_codes<R: Read>(bits: &mut BitReader<R>) -> Result<DynamicCodes> {
    let hlit = bits.read_bits(5)? as usize + 257;
    let hdist = bits.read_bits(5)? as usize + 1;
    let hclen = bits.read_bits(4)? as usize + 4;

    if hlit > LITLEN_ALPHABET_SIZE {
        return Err(GzError::invalid_dynamic(format!(
            "{} literal/length codes exceed {}",
            hlit, LITLEN_ALPHABET_SIZE
        )));
    }
    if hdist > DISTANCE_ALPHABET_SIZE {
        return Err(GzError::invalid_dynamic(format!(
            "{} distance codes exceed {}",
            hdist, DISTANCE_ALPHABET_SIZE
        )));
    }

    let mut code_length_lengths = [0u8; CODELEN_ALPHABET_SIZE];
    for &slot in CODE_LENGTH_ORDER.iter().take(hclen) {
        code_length_lengths[slot] = bits.read_bits(3)? as u8;
    }
    let code_length_tree = HuffmanTree::from_code_lengths(&code_length_lengths)?;

    let mut lengths = [0u8; LITLEN_ALPHABET_SIZE + DISTANCE_ALPHABET_SIZE];
    let total = hlit + hdist;
    let mut i = 0;

    while i < total {
        let code = code_length_tree.decode(bits)?;

        let (value, repeat) = match code {
            0..=15 => (code as u8, 1),
            16 => {
                if i == 0 {
                    return Err(GzError::invalid_dynamic("repeat code 16 with no previous length"));
                }
                (lengths[i - 1], bits.read_bits(2)? as usize + 3)
            }
            17 => (0, bits.read_bits(3)? as usize + 3),
            18 => (0, bits.read_bits(7)? as usize + 11),
            _ => return Err(GzError::invalid_huffman(bits.bit_position())),
        };

        if i + repeat > total {
            return Err(GzError::invalid_dynamic(format!(
                "code length repeat overflows {} entries",
                total
            )));
        }
        lengths[i..i + repeat].fill(value);
        i += repeat;
    }

    if lengths[END_OF_BLOCK as usize] == 0 {
        return Err(GzError::invalid_dynamic("missing end-of-block code"));
    }

    Ok(DynamicCodes {
        litlen: HuffmanTree::from_code_lengths(&lengths[..hlit])?,
        dist: HuffmanTree::from_code_lengths(&lengths[hlit..total])?,
    })
}

/// Decode Huffman-coded symbols until `out` is full or the block ends.
///
/// Returns the bytes written and whether end-of-block was reached.
fn decode_huffman<R: Read>(
    bits: &mut BitReader<R>,
    litlen: &HuffmanTree,
    dist: &HuffmanTree,
    window: &mut SlidingWindow,
    pending: &mut Option<PendingCopy>,
    out: &mut [u8],
) -> Result<(usize, bool)> {
    let mut written = 0;

    while written < out.len() {
        if let Some(copy) = pending.as_mut() {
            let n = window.copy_match(copy.distance, copy.remaining, &mut out[written..])?;
            written += n;
            copy.remaining -= n;
            if copy.remaining == 0 {
                *pending = None;
            }
            continue;
        }

        let code = litlen.decode(bits)?;
        match code {
            0..=255 => {
                out[written] = code as u8;
                window.push(code as u8);
                written += 1;
            }
            END_OF_BLOCK => return Ok((written, true)),
            257..=285 => {
                let extra = bits.read_bits(LENGTH_EXTRA_BITS[(code - 257) as usize])? as u16;
                let length = decode_length(code, extra);

                let dist_code = dist.decode(bits)?;
                if dist_code >= 30 {
                    return Err(GzError::corrupted(
                        bits.bit_position() / 8,
                        format!("invalid distance code {}", dist_code),
                    ));
                }
                let dist_extra = bits.read_bits(DISTANCE_EXTRA_BITS[dist_code as usize])? as u16;
                let distance = decode_distance(dist_code, dist_extra) as usize;

                if distance > window.len() {
                    return Err(GzError::invalid_distance(distance, window.len()));
                }
                *pending = Some(PendingCopy {
                    distance,
                    remaining: length as usize,
                });
            }
            _ => {
                return Err(GzError::corrupted(
                    bits.bit_position() / 8,
                    format!("invalid literal/length code {}", code),
                ));
            }
        }
    }

    Ok((written, false))
}

/// Decompress a complete raw DEFLATE stream.
pub fn inflate(data: &[u8]) -> Result<Vec<u8>> {
    let mut bits = BitReader::new(data);
    Inflater::new().read_to_end(&mut bits)
}
