//! Body and trailer of a single gzip member.
//!
//! A member is `header | deflate data | CRC-32 | ISIZE`. [`MemberDecoder`]
//! drives the DEFLATE decoder over the body while keeping the running
//! checksum and length the trailer is checked against.

use gzseek_core::error::{GzError, Result};
use gzseek_core::{BitReader, Crc32, TrailerField};
use gzseek_deflate::{Inflater, InflaterSnapshot};
use std::io::Read;

/// The 8-byte trailer closing each member.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemberTrailer {
    /// CRC-32 of the uncompressed data.
    pub crc32: u32,
    /// Uncompressed length modulo 2^32.
    pub isize: u32,
}

impl MemberTrailer {
    /// Read the trailer, skipping the padding bits of the last DEFLATE byte.
    pub fn read<R: Read>(bits: &mut BitReader<R>) -> Result<Self> {
        bits.align_to_byte();
        let crc32 = bits.read_u32_le()?;
        let isize = bits.read_u32_le()?;
        Ok(Self { crc32, isize })
    }

    /// Check the trailer against what was actually decoded.
    pub fn verify(&self, crc: u32, len: u64) -> Result<()> {
        if self.crc32 != crc {
            return Err(GzError::checksum(TrailerField::Crc32, self.crc32, crc));
        }
        let truncated = len as u32;
        if self.isize != truncated {
            return Err(GzError::checksum(TrailerField::Size, self.isize, truncated));
        }
        Ok(())
    }
}

/// Decoder for the compressed body of one member.
#[derive(Debug)]
pub struct MemberDecoder {
    inflater: Inflater,
    crc: Crc32,
    size: u64,
}

impl MemberDecoder {
    /// Start decoding at the beginning of a member body.
    pub fn new() -> Self {
        Self {
            inflater: Inflater::new(),
            crc: Crc32::new(),
            size: 0,
        }
    }

    /// Resume inside a member body from a block-boundary snapshot.
    ///
    /// `crc` and `size` are the checksum state and byte count of the member
    /// data preceding the snapshot.
    pub fn resume(snapshot: &InflaterSnapshot, crc: Crc32, size: u64) -> Self {
        Self {
            inflater: Inflater::restore(snapshot),
            crc,
            size,
        }
    }

    /// Prepare for the next member, keeping the window allocation.
    pub fn reset(&mut self) {
        self.inflater.reset();
        self.crc.reset();
        self.size = 0;
    }

    /// Decode into `out`; see [`Inflater::read`] for the meaning of `Ok(0)`.
    pub fn read<R: Read>(&mut self, bits: &mut BitReader<R>, out: &mut [u8]) -> Result<usize> {
        let n = self.inflater.read(bits, out)?;
        self.crc.update(&out[..n]);
        self.size += n as u64;
        Ok(n)
    }

    /// Whether the body's final block has been decoded.
    pub fn is_finished(&self) -> bool {
        self.inflater.is_finished()
    }

    /// Read and verify the trailer once the body is finished.
    pub fn finish<R: Read>(&self, bits: &mut BitReader<R>) -> Result<MemberTrailer> {
        debug_assert!(self.is_finished());
        let trailer = MemberTrailer::read(bits)?;
        trailer.verify(self.crc.value(), self.size)?;
        Ok(trailer)
    }

    /// Checksum state over the bytes decoded so far.
    pub fn crc(&self) -> Crc32 {
        self.crc
    }

    /// Bytes decoded so far in this member.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Decoder state at a block boundary, if currently at one.
    pub fn snapshot(&self) -> Option<InflaterSnapshot> {
        self.inflater.snapshot()
    }
}

impl Default for MemberDecoder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Body and trailer of the hello.txt vector.
    const HELLO_BODY: [u8; 22] = [
        0xcb, 0x48, 0xcd, 0xc9, 0xc9, 0x57, 0x28, 0xcf, 0x2f, 0xca, 0x49, 0xe1, 0x02, 0x00,
        0x2d, 0x3b, 0x08, 0xaf, 0x0c, 0x00, 0x00, 0x00,
    ];

    fn decode(body: &[u8]) -> (Vec<u8>, Result<MemberTrailer>) {
        let mut bits = BitReader::new(body);
        let mut decoder = MemberDecoder::new();
        let mut out = Vec::new();
        let mut buf = [0u8; 5];
        while !decoder.is_finished() {
            let n = decoder.read(&mut bits, &mut buf).unwrap();
            out.extend_from_slice(&buf[..n]);
        }
        let trailer = decoder.finish(&mut bits);
        (out, trailer)
    }

    #[test]
    fn test_member_body() {
        let (out, trailer) = decode(&HELLO_BODY);
        assert_eq!(out, b"hello world\n");
        let trailer = trailer.unwrap();
        assert_eq!(trailer.crc32, 0xaf083b2d);
        assert_eq!(trailer.isize, 12);
    }

    #[test]
    fn test_corrupt_crc() {
        let mut body = HELLO_BODY;
        body[14] = 0xff;
        let (_, trailer) = decode(&body);
        assert!(matches!(
            trailer,
            Err(GzError::Checksum {
                field: TrailerField::Crc32,
                ..
            })
        ));
    }

    #[test]
    fn test_corrupt_size() {
        let mut body = HELLO_BODY;
        body[18] = 0xff;
        let (_, trailer) = decode(&body);
        assert!(matches!(
            trailer,
            Err(GzError::Checksum {
                field: TrailerField::Size,
                expected: 0xff,
                computed: 12
            })
        ));
    }

    #[test]
    fn test_isize_wraps() {
        let trailer = MemberTrailer {
            crc32: 0,
            isize: 5,
        };
        assert!(trailer.verify(0, (1u64 << 32) + 5).is_ok());
    }

    #[test]
    fn test_truncated_trailer() {
        let (_, trailer) = decode(&HELLO_BODY[..20]);
        assert!(trailer.unwrap_err().is_truncation());
    }
}
