//! GZIP member header parsing (RFC 1952 section 2.3).

use gzseek_core::error::{GzError, Result};
use gzseek_core::{BitReader, Crc32};
use std::io::Read;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// GZIP magic bytes.
pub const GZIP_MAGIC: [u8; 2] = [0x1F, 0x8B];

/// GZIP compression method: DEFLATE.
pub const CM_DEFLATE: u8 = 8;

/// GZIP header flags.
pub mod flags {
    /// Text file.
    pub const FTEXT: u8 = 0x01;
    /// Header CRC present.
    pub const FHCRC: u8 = 0x02;
    /// Extra field present.
    pub const FEXTRA: u8 = 0x04;
    /// Original filename present.
    pub const FNAME: u8 = 0x08;
    /// Comment present.
    pub const FCOMMENT: u8 = 0x10;
    /// Bits that must be zero.
    pub const RESERVED: u8 = 0xE0;
}

/// Header of one gzip member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberHeader {
    /// Compression method (always 8 once parsed).
    pub method: u8,
    /// Flags.
    pub flags: u8,
    /// Modification time (Unix timestamp), 0 if unknown.
    pub mtime: u32,
    /// Extra flags.
    pub xfl: u8,
    /// Operating system.
    pub os: u8,
    /// Raw extra field (if FEXTRA flag set).
    pub extra: Option<Vec<u8>>,
    /// Original filename (if FNAME flag set).
    pub name: Option<String>,
    /// Comment (if FCOMMENT flag set).
    pub comment: Option<String>,
    /// Header CRC16 (if FHCRC flag set), already verified.
    pub header_crc: Option<u16>,
}

/// Byte source that checksums everything it hands out.
struct HeaderBytes<'a, R: Read> {
    bits: &'a mut BitReader<R>,
    crc: Crc32,
}

impl<R: Read> HeaderBytes<'_, R> {
    fn read_exact(&mut self, buf: &mut [u8]) -> Result<()> {
        self.bits.read_bytes(buf)?;
        self.crc.update(buf);
        Ok(())
    }

    fn read_u8(&mut self) -> Result<u8> {
        let mut buf = [0u8; 1];
        self.read_exact(&mut buf)?;
        Ok(buf[0])
    }

    fn read_u16_le(&mut self) -> Result<u16> {
        let mut buf = [0u8; 2];
        self.read_exact(&mut buf)?;
        Ok(u16::from_le_bytes(buf))
    }

    /// Read a NUL-terminated ISO 8859-1 string.
    fn read_latin1(&mut self) -> Result<String> {
        let mut text = String::new();
        loop {
            match self.read_u8()? {
                0 => return Ok(text),
                b => text.push(b as char),
            }
        }
    }
}

impl MemberHeader {
    /// Read a member header.
    ///
    /// The reader must be byte-aligned. A source that is exhausted before
    /// the first header byte yields [`GzError::EmptyInput`]; any later
    /// shortfall is [`GzError::UnexpectedEndOfInput`].
    pub fn read<R: Read>(bits: &mut BitReader<R>) -> Result<Self> {
        if bits.at_end()? {
            return Err(GzError::EmptyInput);
        }

        let mut input = HeaderBytes {
            bits,
            crc: Crc32::new(),
        };

        let mut fixed = [0u8; 10];
        input.read_exact(&mut fixed)?;

        if fixed[0..2] != GZIP_MAGIC {
            return Err(GzError::invalid_header(format!(
                "bad magic {:02x} {:02x}",
                fixed[0], fixed[1]
            )));
        }

        let method = fixed[2];
        if method != CM_DEFLATE {
            return Err(GzError::unsupported_method(method));
        }

        let flags = fixed[3];
        if flags & flags::RESERVED != 0 {
            return Err(GzError::invalid_header(format!(
                "reserved flag bits set: {:#04x}",
                flags
            )));
        }

        let mtime = u32::from_le_bytes([fixed[4], fixed[5], fixed[6], fixed[7]]);
        let xfl = fixed[8];
        let os = fixed[9];

        let extra = if flags & flags::FEXTRA != 0 {
            let xlen = input.read_u16_le()? as usize;
            let mut extra = vec![0u8; xlen];
            input.read_exact(&mut extra)?;
            Some(extra)
        } else {
            None
        };

        let name = if flags & flags::FNAME != 0 {
            Some(input.read_latin1()?)
        } else {
            None
        };

        let comment = if flags & flags::FCOMMENT != 0 {
            Some(input.read_latin1()?)
        } else {
            None
        };

        let header_crc = if flags & flags::FHCRC != 0 {
            let computed = input.crc.low16();
            let expected = input.bits.read_u16_le()?;
            if expected != computed {
                return Err(GzError::header_checksum(expected, computed));
            }
            Some(expected)
        } else {
            None
        };

        Ok(Self {
            method,
            flags,
            mtime,
            xfl,
            os,
            extra,
            name,
            comment,
            header_crc,
        })
    }

    /// Modification time, `None` when the header leaves it unset.
    pub fn modified(&self) -> Option<SystemTime> {
        (self.mtime != 0).then(|| UNIX_EPOCH + Duration::from_secs(self.mtime as u64))
    }

    /// Whether the FTEXT hint is set.
    pub fn is_text(&self) -> bool {
        self.flags & flags::FTEXT != 0
    }
}
