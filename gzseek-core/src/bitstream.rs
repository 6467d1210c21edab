//! Bit-level input for the DEFLATE bitstream.
//!
//! [`BitReader`] wraps any `Read` byte source and hands out variable-width
//! bit fields. DEFLATE packs bits LSB-first: the first bit of the stream is
//! the least significant bit of the first byte.
//!
//! The reader never pulls more bytes from the source than the current
//! request needs. After a byte-aligned read has drained the bit buffer, the
//! source is positioned exactly after the last consumed byte, which is what
//! lets a gzip member end and the next one begin on the same source.
//!
//! # Example
//!
//! ```
//! use gzseek_core::bitstream::BitReader;
//! use std::io::Cursor;
//!
//! let mut reader = BitReader::new(Cursor::new(vec![0xB5, 0xAA]));
//! assert_eq!(reader.read_bits(3).unwrap(), 0b101);
//! reader.align_to_byte();
//! assert_eq!(reader.read_bits(8).unwrap(), 0xAA);
//! assert!(reader.at_end().unwrap());
//! ```

use crate::error::{GzError, Result};
use std::io::{ErrorKind, Read, Seek, SeekFrom};

/// A bit-level reader over any `Read` implementation.
#[derive(Debug)]
pub struct BitReader<R> {
    /// Underlying byte source.
    reader: R,
    /// Bit buffer (LSB-first).
    buffer: u64,
    /// Number of valid bits in buffer.
    bits_in_buffer: u8,
    /// Absolute position of the next unconsumed bit in the source.
    bit_position: u64,
}

impl<R: Read> BitReader<R> {
    /// Create a new `BitReader` positioned at the start of the source.
    pub fn new(reader: R) -> Self {
        Self::with_offset(reader, 0)
    }

    /// Create a `BitReader` whose source is already at `byte_offset`.
    ///
    /// Only affects the reported [`bit_position`](Self::bit_position).
    pub fn with_offset(reader: R, byte_offset: u64) -> Self {
        Self {
            reader,
            buffer: 0,
            bits_in_buffer: 0,
            bit_position: byte_offset * 8,
        }
    }

    /// Get a reference to the underlying reader.
    pub fn get_ref(&self) -> &R {
        &self.reader
    }

    /// Get a mutable reference to the underlying reader.
    pub fn get_mut(&mut self) -> &mut R {
        &mut self.reader
    }

    /// Consume this `BitReader` and return the underlying reader.
    ///
    /// Bits still held in the buffer are lost; see [`buffered_bits`](Self::buffered_bits).
    pub fn into_inner(self) -> R {
        self.reader
    }

    /// Absolute bit offset of the next bit to be consumed.
    pub fn bit_position(&self) -> u64 {
        self.bit_position
    }

    /// Absolute byte offset just past the last byte bits were taken from.
    pub fn byte_position(&self) -> u64 {
        self.bit_position.div_ceil(8)
    }

    /// Number of bits pulled from the source but not consumed yet.
    pub fn buffered_bits(&self) -> u8 {
        self.bits_in_buffer
    }

    /// Whether the next bit starts a byte.
    pub fn is_aligned(&self) -> bool {
        self.bit_position % 8 == 0
    }

    /// Pull one chunk of bytes from the source, retrying interrupted reads.
    ///
    /// Returns the number of bytes read, 0 at end of input. A source that
    /// signals its own end with `UnexpectedEof` is treated as truncated at
    /// the current position.
    fn pull(&mut self, buf: &mut [u8]) -> Result<usize> {
        loop {
            match self.reader.read(buf) {
                Ok(n) => return Ok(n),
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) if e.kind() == ErrorKind::UnexpectedEof => {
                    return Err(GzError::unexpected_eof(
                        self.bit_position + self.bits_in_buffer as u64,
                    ));
                }
                Err(e) => return Err(GzError::Io(e)),
            }
        }
    }

    /// Ensure at least `count` bits are available in the buffer.
    #[inline]
    fn fill_buffer(&mut self, count: u8) -> Result<()> {
        debug_assert!(count <= 32, "Cannot fill more than 32 bits at once");

        while self.bits_in_buffer < count {
            let bits_needed = count - self.bits_in_buffer;
            let bytes_needed = bits_needed.div_ceil(8) as usize;

            let mut temp = [0u8; 4];
            let n = self.pull(&mut temp[..bytes_needed])?;
            if n == 0 {
                return Err(GzError::unexpected_eof(
                    self.bit_position + self.bits_in_buffer as u64,
                ));
            }

            for &byte in &temp[..n] {
                self.buffer |= (byte as u64) << self.bits_in_buffer;
                self.bits_in_buffer += 8;
            }
        }

        Ok(())
    }

    #[inline]
    fn consume(&mut self, count: u8) {
        self.buffer >>= count;
        self.bits_in_buffer -= count;
        self.bit_position += count as u64;
    }

    /// Read up to 32 bits, first bit in the LSB of the result.
    ///
    /// Fails with `UnexpectedEndOfInput` if the source ends first.
    #[inline]
    pub fn read_bits(&mut self, count: u8) -> Result<u32> {
        debug_assert!(count <= 32, "Cannot read more than 32 bits at once");

        if count == 0 {
            return Ok(0);
        }

        self.fill_buffer(count)?;

        let mask = (1u64 << count).wrapping_sub(1);
        let result = (self.buffer & mask) as u32;
        self.consume(count);

        Ok(result)
    }

    /// Peek at up to 32 bits without consuming them.
    ///
    /// On failure any bits already buffered stay available.
    #[inline]
    pub fn peek_bits(&mut self, count: u8) -> Result<u32> {
        debug_assert!(count <= 32, "Cannot peek more than 32 bits at once");

        if count == 0 {
            return Ok(0);
        }

        self.fill_buffer(count)?;

        let mask = (1u64 << count).wrapping_sub(1);
        Ok((self.buffer & mask) as u32)
    }

    /// Skip a number of bits.
    pub fn skip_bits(&mut self, count: u8) -> Result<()> {
        if count == 0 {
            return Ok(());
        }

        self.fill_buffer(count)?;
        self.consume(count);

        Ok(())
    }

    /// Read a single bit.
    pub fn read_bit(&mut self) -> Result<bool> {
        Ok(self.read_bits(1)? != 0)
    }

    /// Align to the next byte boundary by discarding partial bits.
    pub fn align_to_byte(&mut self) {
        let remainder = (self.bit_position % 8) as u8;
        if remainder > 0 {
            let skip = 8 - remainder;
            // The rest of a partially consumed byte is always buffered.
            debug_assert!(self.bits_in_buffer >= skip);
            self.consume(skip);
        }
    }

    /// Read bytes, discarding any partial byte first.
    ///
    /// Whole bytes still held in the bit buffer are handed out before the
    /// source is read again.
    pub fn read_bytes(&mut self, buf: &mut [u8]) -> Result<()> {
        self.align_to_byte();

        let mut offset = 0;
        while self.bits_in_buffer >= 8 && offset < buf.len() {
            buf[offset] = (self.buffer & 0xFF) as u8;
            self.consume(8);
            offset += 1;
        }

        while offset < buf.len() {
            let n = self.pull(&mut buf[offset..])?;
            if n == 0 {
                return Err(GzError::unexpected_eof(self.bit_position));
            }
            offset += n;
            self.bit_position += n as u64 * 8;
        }

        Ok(())
    }

    /// Read one byte-aligned byte.
    pub fn read_u8(&mut self) -> Result<u8> {
        let mut buf = [0u8; 1];
        self.read_bytes(&mut buf)?;
        Ok(buf[0])
    }

    /// Read a byte-aligned little-endian `u16`.
    pub fn read_u16_le(&mut self) -> Result<u16> {
        let mut buf = [0u8; 2];
        self.read_bytes(&mut buf)?;
        Ok(u16::from_le_bytes(buf))
    }

    /// Read a byte-aligned little-endian `u32`.
    pub fn read_u32_le(&mut self) -> Result<u32> {
        let mut buf = [0u8; 4];
        self.read_bytes(&mut buf)?;
        Ok(u32::from_le_bytes(buf))
    }

    /// Check for a clean end of input at the current position.
    ///
    /// True only when no bits are buffered and the source yields zero bytes
    /// (or reports `UnexpectedEof`).
    /// A byte obtained while probing is kept in the buffer.
    pub fn at_end(&mut self) -> Result<bool> {
        if self.bits_in_buffer > 0 {
            return Ok(false);
        }

        let mut byte = [0u8; 1];
        match self.pull(&mut byte) {
            Ok(0) | Err(GzError::UnexpectedEndOfInput { .. }) => Ok(true),
            Ok(_) => {
                self.buffer = byte[0] as u64;
                self.bits_in_buffer = 8;
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }
}

impl<R: Read + Seek> BitReader<R> {
    /// Move to an arbitrary absolute bit offset in the source.
    ///
    /// The buffer is discarded, the source is seeked to the containing byte
    /// and the leading bits of that byte are skipped.
    pub fn reposition(&mut self, bit_offset: u64) -> Result<()> {
        self.reader.seek(SeekFrom::Start(bit_offset / 8))?;
        self.buffer = 0;
        self.bits_in_buffer = 0;
        self.bit_position = bit_offset - bit_offset % 8;
        self.skip_bits((bit_offset % 8) as u8)
    }
}
