//! Random-access reads over a gzip stream.
//!
//! [`SeekableReader`] decodes forward like [`GzipReader`](crate::GzipReader)
//! and records [`Checkpoint`]s as it goes. A backward seek, or a forward
//! seek past a known checkpoint, restarts decoding at the nearest
//! checkpoint instead of at the beginning of the stream.
//!
//! ```rust
//! use gzseek_gzip::{IndexConfig, SeekableReader};
//! use std::io::{Cursor, Read, Seek, SeekFrom};
//!
//! let data = vec![
//!     0x1f, 0x8b, 0x08, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0xff, 0xcb, 0x48, 0xcd,
//!     0xc9, 0xc9, 0x57, 0x28, 0xcf, 0x2f, 0xca, 0x49, 0xe1, 0x02, 0x00, 0x2d, 0x3b,
//!     0x08, 0xaf, 0x0c, 0x00, 0x00, 0x00,
//! ];
//! let mut reader = SeekableReader::open(Cursor::new(data)).unwrap();
//!
//! reader.seek(SeekFrom::Start(6)).unwrap();
//! let mut word = [0u8; 5];
//! reader.read_exact(&mut word).unwrap();
//! assert_eq!(&word, b"world");
//! assert_eq!(reader.len().unwrap(), 12);
//! ```

use crate::header::MemberHeader;
use crate::index::{IndexConfig, SeekIndex};
use crate::reader::MemberStream;
use gzseek_core::BitReader;
use gzseek_core::error::{GzError, Result};
use std::io::{self, BufReader, Read, Seek, SeekFrom};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::debug;

/// Discard buffer size used while decoding towards a seek target.
const SKIP_BUFFER_SIZE: usize = 32 * 1024;

/// Gzip reader supporting `Seek` through an in-memory checkpoint index.
#[derive(Debug)]
pub struct SeekableReader<R: Read + Seek> {
    stream: MemberStream<BufReader<R>>,
    index: SeekIndex,
    /// Source byte offset of the first member header.
    start: u64,
}

impl<R: Read + Seek> SeekableReader<R> {
    /// Open a reader with the default index policy.
    ///
    /// The stream starts at the source's current position.
    pub fn open(source: R) -> Result<Self> {
        Self::with_config(source, IndexConfig::default())
    }

    /// Open a reader with a custom index policy.
    pub fn with_config(mut source: R, config: IndexConfig) -> Result<Self> {
        let start = source.stream_position()?;
        let bits = BitReader::with_offset(BufReader::new(source), start);
        let stream = MemberStream::open(bits)?;

        let mut reader = Self {
            stream,
            index: SeekIndex::new(config),
            start,
        };
        reader.observe();
        Ok(reader)
    }

    /// Header of the first member.
    pub fn header(&self) -> Option<&MemberHeader> {
        self.stream.first_header()
    }

    /// Stored file name of the first member.
    pub fn name(&self) -> Option<&str> {
        self.header().and_then(|h| h.name.as_deref())
    }

    /// The checkpoint index built so far.
    pub fn index(&self) -> &SeekIndex {
        &self.index
    }

    /// Current decompressed position.
    pub fn tell(&self) -> u64 {
        self.stream.position()
    }

    /// Decompressed length of the whole stream.
    ///
    /// Decodes to the end the first time, then returns to the current
    /// position.
    pub fn len(&mut self) -> Result<u64> {
        self.ensure_open()?;
        if let Some(len) = self.index.total_len() {
            return Ok(len);
        }

        let position = self.tell();
        self.skip_to(u64::MAX)?;
        let len = self.tell();
        self.seek_to(position)?;
        Ok(len)
    }

    /// Whether the stream decompresses to nothing.
    pub fn is_empty(&mut self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Decode the whole stream so every checkpoint is in place.
    pub fn build_index(&mut self) -> Result<()> {
        self.len().map(|_| ())
    }

    /// Move to decompressed offset `target`.
    ///
    /// Fails with `SeekOutOfRange` when `target` lies past the end.
    pub fn seek_to(&mut self, target: u64) -> Result<u64> {
        self.ensure_open()?;
        if let Some(len) = self.index.total_len() {
            if target > len {
                return Err(GzError::seek_out_of_range(target, len));
            }
        }

        let position = self.tell();
        let checkpoint_ahead = self
            .index
            .nearest(target)
            .is_some_and(|cp| cp.decompressed_offset > position);

        if target < position || checkpoint_ahead {
            self.restore(target)?;
        } else {
            debug!(from = position, target, "seek forward");
        }

        self.skip_to(target)?;
        Ok(target)
    }

    /// Decompress into `buf`, returning typed errors.
    pub fn read_decompressed(&mut self, buf: &mut [u8]) -> Result<usize> {
        let n = self.stream.read(buf)?;
        self.observe();
        Ok(n)
    }

    /// Release window and checkpoint memory; later calls fail with
    /// `UseAfterClose`.
    pub fn close(&mut self) {
        self.stream.close();
        self.index.clear();
    }

    /// Consume the reader and return the source.
    pub fn into_inner(self) -> R {
        self.stream.bits.into_inner().into_inner()
    }

    fn ensure_open(&self) -> Result<()> {
        if self.stream.is_closed() {
            return Err(GzError::UseAfterClose);
        }
        Ok(())
    }

    /// Record the end of the stream or a checkpoint at the current position.
    fn observe(&mut self) {
        if self.stream.is_finished() {
            self.index.set_total_len(self.stream.position());
        } else if self.index.wants(self.stream.position()) {
            if let Some(checkpoint) = self.stream.checkpoint() {
                self.index.insert(checkpoint);
            }
        }
    }

    /// Restart decoding at the nearest checkpoint at or before `target`.
    fn restore(&mut self, target: u64) -> Result<()> {
        match self.index.nearest(target) {
            Some(checkpoint) => {
                debug!(
                    target,
                    checkpoint = checkpoint.decompressed_offset,
                    bit_offset = checkpoint.compressed_bit_offset,
                    "seek via checkpoint"
                );
                self.stream
                    .bits
                    .reposition(checkpoint.compressed_bit_offset)?;
                self.stream.resume_at(checkpoint);
            }
            None => {
                debug!(target, "seek via stream start");
                self.stream.bits.reposition(self.start * 8)?;
                self.stream.restart()?;
            }
        }
        Ok(())
    }

    /// Decode and discard until `target` or the end of the stream.
    fn skip_to(&mut self, target: u64) -> Result<()> {
        let mut scratch = vec![0u8; SKIP_BUFFER_SIZE];
        while self.tell() < target {
            let want = (target - self.tell()).min(SKIP_BUFFER_SIZE as u64) as usize;
            let n = self.read_decompressed(&mut scratch[..want])?;
            if n == 0 {
                if target == u64::MAX {
                    return Ok(());
                }
                return Err(GzError::seek_out_of_range(target, self.tell()));
            }
        }
        Ok(())
    }
}

impl<R: Read + Seek> Read for SeekableReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        Ok(self.read_decompressed(buf)?)
    }
}

impl<R: Read + Seek> Seek for SeekableReader<R> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let target = match pos {
            SeekFrom::Start(offset) => Some(offset),
            SeekFrom::Current(delta) => self.tell().checked_add_signed(delta),
            SeekFrom::End(delta) => self.len()?.checked_add_signed(delta),
        };
        let target = target.ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                "invalid seek to a negative or overflowing position",
            )
        })?;
        Ok(self.seek_to(target)?)
    }

    fn stream_position(&mut self) -> io::Result<u64> {
        Ok(self.tell())
    }
}

/// A [`SeekableReader`] shared between threads.
///
/// Each [`read_at`](Self::read_at) holds the lock for its seek and read,
/// so all clones share one index and one decoder.
#[derive(Debug)]
pub struct SharedSeekableReader<R: Read + Seek> {
    inner: Arc<Mutex<SeekableReader<R>>>,
}

impl<R: Read + Seek> Clone for SharedSeekableReader<R> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<R: Read + Seek> SharedSeekableReader<R> {
    /// Wrap a reader for shared use.
    pub fn new(reader: SeekableReader<R>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(reader)),
        }
    }

    /// Read up to `buf.len()` bytes starting at decompressed `offset`.
    ///
    /// Returns fewer bytes only at the end of the stream.
    pub fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<usize> {
        let mut reader = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        reader.seek_to(offset)?;

        let mut filled = 0;
        while filled < buf.len() {
            let n = reader.read_decompressed(&mut buf[filled..])?;
            if n == 0 {
                break;
            }
            filled += n;
        }
        Ok(filled)
    }

    /// Decompressed length of the whole stream.
    pub fn len(&self) -> Result<u64> {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether the stream decompresses to nothing.
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
}
