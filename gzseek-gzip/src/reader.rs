//! Multi-member gzip decompression reader.

use crate::header::MemberHeader;
use crate::index::Checkpoint;
use crate::member::MemberDecoder;
use gzseek_core::BitReader;
use gzseek_core::error::{GzError, Result};
use std::io::{self, Read};
use tracing::debug;

/// Decoding state shared by [`GzipReader`] and the seekable reader.
///
/// Owns the bit reader and stitches members together: header, body,
/// trailer, then either a clean end of input or the next header.
#[derive(Debug)]
pub(crate) struct MemberStream<R: Read> {
    pub(crate) bits: BitReader<R>,
    /// Body decoder of the current member; `None` once finished.
    decoder: Option<MemberDecoder>,
    first_header: Option<MemberHeader>,
    last_header: Option<MemberHeader>,
    /// Number of member headers parsed.
    members: usize,
    multistream: bool,
    /// Decompressed bytes produced across all members.
    position: u64,
    error: Option<GzError>,
    closed: bool,
}

impl<R: Read> MemberStream<R> {
    /// Parse the first member header, tolerating an empty source.
    pub(crate) fn open(bits: BitReader<R>) -> Result<Self> {
        let mut stream = Self {
            bits,
            decoder: None,
            first_header: None,
            last_header: None,
            members: 0,
            multistream: true,
            position: 0,
            error: None,
            closed: false,
        };
        stream.start_first_member()?;
        Ok(stream)
    }

    fn start_first_member(&mut self) -> Result<()> {
        match MemberHeader::read(&mut self.bits) {
            Ok(header) => {
                self.begin_member(header);
                Ok(())
            }
            Err(GzError::EmptyInput) => {
                debug!("empty source, no members");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    fn begin_member(&mut self, header: MemberHeader) {
        debug!(
            member = self.members,
            name = header.name.as_deref(),
            bit_position = self.bits.bit_position(),
            "gzip member start"
        );
        if self.first_header.is_none() {
            self.first_header = Some(header.clone());
        }
        self.last_header = Some(header);
        self.members += 1;
        match self.decoder.as_mut() {
            Some(decoder) => decoder.reset(),
            None => self.decoder = Some(MemberDecoder::new()),
        }
    }

    pub(crate) fn first_header(&self) -> Option<&MemberHeader> {
        self.first_header.as_ref()
    }

    pub(crate) fn last_header(&self) -> Option<&MemberHeader> {
        self.last_header.as_ref()
    }

    pub(crate) fn members(&self) -> usize {
        self.members
    }

    pub(crate) fn set_multistream(&mut self, enabled: bool) {
        self.multistream = enabled;
    }

    pub(crate) fn position(&self) -> u64 {
        self.position
    }

    pub(crate) fn is_finished(&self) -> bool {
        self.decoder.is_none() && self.error.is_none()
    }

    pub(crate) fn close(&mut self) {
        self.decoder = None;
        self.closed = true;
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.closed
    }

    /// Decompress into `out`, crossing member boundaries as needed.
    ///
    /// `Ok(0)` for a non-empty `out` means the end of the last member.
    pub(crate) fn read(&mut self, out: &mut [u8]) -> Result<usize> {
        if self.closed {
            return Err(GzError::UseAfterClose);
        }
        if let Some(e) = &self.error {
            return Err(e.sticky_copy());
        }
        if out.is_empty() {
            return Ok(0);
        }

        match self.fill(out) {
            Ok(n) => {
                self.position += n as u64;
                Ok(n)
            }
            Err(e) => {
                debug!(error = %e, position = self.position, "gzip stream failed");
                self.error = Some(e.sticky_copy());
                Err(e)
            }
        }
    }

    fn fill(&mut self, out: &mut [u8]) -> Result<usize> {
        loop {
            let Some(decoder) = self.decoder.as_mut() else {
                return Ok(0);
            };

            let n = decoder.read(&mut self.bits, out)?;
            if n > 0 {
                return Ok(n);
            }
            if !decoder.is_finished() {
                // An empty block ended.
                continue;
            }

            let trailer = decoder.finish(&mut self.bits)?;
            debug!(
                member = self.members - 1,
                crc32 = format_args!("{:08x}", trailer.crc32),
                size = decoder.size(),
                end = self.bits.byte_position(),
                "gzip member end"
            );

            if !self.multistream || self.bits.at_end()? {
                self.decoder = None;
                return Ok(0);
            }
            let header = MemberHeader::read(&mut self.bits)?;
            self.begin_member(header);
        }
    }

    /// Capture a checkpoint if the decoder sits at a block boundary.
    pub(crate) fn checkpoint(&self) -> Option<Checkpoint> {
        let decoder = self.decoder.as_ref()?;
        let window = decoder.snapshot()?;
        Some(Checkpoint {
            compressed_bit_offset: self.bits.bit_position(),
            decompressed_offset: self.position,
            member_index: self.members - 1,
            member_offset: decoder.size(),
            crc: decoder.crc(),
            window,
        })
    }

    /// Continue decoding from a checkpoint.
    ///
    /// The bit reader must already be positioned at the checkpoint's
    /// compressed offset.
    pub(crate) fn resume_at(&mut self, checkpoint: &Checkpoint) {
        debug_assert_eq!(self.bits.bit_position(), checkpoint.compressed_bit_offset);
        self.decoder = Some(MemberDecoder::resume(
            &checkpoint.window,
            checkpoint.crc,
            checkpoint.member_offset,
        ));
        self.members = checkpoint.member_index + 1;
        self.position = checkpoint.decompressed_offset;
        self.error = None;
    }

    /// Restart from the first header; the bit reader must be at its start.
    pub(crate) fn restart(&mut self) -> Result<()> {
        self.decoder = None;
        self.members = 0;
        self.position = 0;
        self.error = None;
        self.first_header = None;
        self.start_first_member()
    }
}

/// GZIP decompression reader over one or more concatenated members.
///
/// Bytes are pulled from the source only as they are needed, so after the
/// last member the source is positioned right after its trailer. Wrap
/// unbuffered sources such as `File` in a `BufReader`.
///
/// ```rust
/// use gzseek_gzip::GzipReader;
/// use std::io::Read;
///
/// let data: &[u8] = &[
///     0x1f, 0x8b, 0x08, 0x08, 0xc8, 0x58, 0x13, 0x4a, 0x00, 0x03, b'h', b'e', b'l',
///     b'l', b'o', b'.', b't', b'x', b't', 0x00, 0xcb, 0x48, 0xcd, 0xc9, 0xc9, 0x57,
///     0x28, 0xcf, 0x2f, 0xca, 0x49, 0xe1, 0x02, 0x00, 0x2d, 0x3b, 0x08, 0xaf, 0x0c,
///     0x00, 0x00, 0x00,
/// ];
/// let mut reader = GzipReader::new(data).unwrap();
/// assert_eq!(reader.name(), Some("hello.txt"));
///
/// let mut text = String::new();
/// reader.read_to_string(&mut text).unwrap();
/// assert_eq!(text, "hello world\n");
/// ```
///
/// Reading a file:
///
/// ```no_run
/// use gzseek_gzip::GzipReader;
/// use std::fs::File;
/// use std::io::{self, BufReader};
///
/// let file = BufReader::new(File::open("access.log.gz")?);
/// let mut reader = GzipReader::new(file)?;
/// io::copy(&mut reader, &mut io::stdout().lock())?;
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug)]
pub struct GzipReader<R: Read> {
    stream: MemberStream<R>,
}

impl<R: Read> GzipReader<R> {
    /// Create a reader, parsing the first member header.
    ///
    /// An empty source gives a reader with zero members whose reads
    /// return 0. A truncated or invalid header is an error.
    pub fn new(reader: R) -> Result<Self> {
        let stream = MemberStream::open(BitReader::new(reader))?;
        Ok(Self { stream })
    }

    /// Header of the first member.
    pub fn header(&self) -> Option<&MemberHeader> {
        self.stream.first_header()
    }

    /// Stored file name of the first member.
    pub fn name(&self) -> Option<&str> {
        self.header().and_then(|h| h.name.as_deref())
    }

    /// Header of the most recently started member.
    pub fn last_header(&self) -> Option<&MemberHeader> {
        self.stream.last_header()
    }

    /// Number of members whose header has been parsed.
    pub fn members(&self) -> usize {
        self.stream.members()
    }

    /// Whether to continue into members after the first (default true).
    ///
    /// When disabled, reading ends after the first member's trailer and
    /// [`into_inner`](Self::into_inner) returns the source positioned at
    /// whatever follows it.
    pub fn multistream(&mut self, enabled: bool) -> &mut Self {
        self.stream.set_multistream(enabled);
        self
    }

    /// Total decompressed bytes returned so far.
    pub fn position(&self) -> u64 {
        self.stream.position()
    }

    /// Decompress into `buf`, returning typed errors.
    pub fn read_decompressed(&mut self, buf: &mut [u8]) -> Result<usize> {
        self.stream.read(buf)
    }

    /// Decompress everything that is left.
    pub fn decompress(&mut self) -> Result<Vec<u8>> {
        let mut output = Vec::new();
        let mut buf = vec![0u8; 32 * 1024];
        loop {
            let n = self.read_decompressed(&mut buf)?;
            if n == 0 {
                return Ok(output);
            }
            output.extend_from_slice(&buf[..n]);
        }
    }

    /// Release decoder state; later reads fail with `UseAfterClose`.
    pub fn close(&mut self) {
        self.stream.close();
    }

    /// Get a reference to the underlying reader.
    pub fn get_ref(&self) -> &R {
        self.stream.bits.get_ref()
    }

    /// Consume the reader and return the source.
    pub fn into_inner(self) -> R {
        self.stream.bits.into_inner()
    }
}

impl<R: Read> Read for GzipReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        Ok(self.read_decompressed(buf)?)
    }
}

/// Decompress a complete gzip stream held in memory.
pub fn decompress(data: &[u8]) -> Result<Vec<u8>> {
    GzipReader::new(data)?.decompress()
}
