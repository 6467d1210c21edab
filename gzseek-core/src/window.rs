//! Sliding window (history buffer) for back-reference decoding.
//!
//! DEFLATE back-references reach at most 32 KiB into the already emitted
//! output. [`SlidingWindow`] keeps exactly that much history in a fixed
//! ring indexed by `position & (capacity - 1)`; older bytes are overwritten
//! as new ones arrive.

use crate::error::{GzError, Result};

/// Window size for DEFLATE (32 KiB).
pub const DEFLATE_WINDOW_SIZE: usize = 32768;

/// A circular history buffer.
#[derive(Debug, Clone)]
pub struct SlidingWindow {
    /// The underlying buffer.
    buffer: Box<[u8]>,
    /// Next write position.
    position: usize,
    /// Number of valid history bytes (up to capacity).
    size: usize,
    /// Mask for efficient modulo (capacity - 1).
    mask: usize,
}

impl SlidingWindow {
    /// Create a new window with the given capacity.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is not a power of 2 or is zero.
    pub fn new(capacity: usize) -> Self {
        assert!(
            capacity.is_power_of_two(),
            "Capacity must be a power of 2, got {}",
            capacity
        );

        Self {
            buffer: vec![0; capacity].into_boxed_slice(),
            position: 0,
            size: 0,
            mask: capacity - 1,
        }
    }

    /// Create a 32 KiB window for DEFLATE.
    pub fn deflate() -> Self {
        Self::new(DEFLATE_WINDOW_SIZE)
    }

    /// Rebuild a window from a [`snapshot`](Self::snapshot).
    ///
    /// If `history` is longer than the capacity only its tail is kept.
    pub fn from_history(capacity: usize, history: &[u8]) -> Self {
        let mut window = Self::new(capacity);
        let start = history.len().saturating_sub(capacity);
        window.extend(&history[start..]);
        window
    }

    /// Capacity of the window.
    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    /// Number of history bytes available to back-references.
    pub fn len(&self) -> usize {
        self.size
    }

    /// Check if no history is available.
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Forget all history.
    pub fn clear(&mut self) {
        self.position = 0;
        self.size = 0;
    }

    /// Append one byte.
    #[inline]
    pub fn push(&mut self, byte: u8) {
        self.buffer[self.position] = byte;
        self.position = (self.position + 1) & self.mask;
        if self.size <= self.mask {
            self.size += 1;
        }
    }

    /// Append a run of bytes.
    pub fn extend(&mut self, bytes: &[u8]) {
        let capacity = self.capacity();
        let bytes = &bytes[bytes.len().saturating_sub(capacity)..];

        // At most two contiguous pieces around the wrap point.
        let first = bytes.len().min(capacity - self.position);
        self.buffer[self.position..self.position + first].copy_from_slice(&bytes[..first]);
        let rest = &bytes[first..];
        self.buffer[..rest.len()].copy_from_slice(rest);

        self.position = (self.position + bytes.len()) & self.mask;
        self.size = (self.size + bytes.len()).min(capacity);
    }

    /// Copy up to `length` bytes starting `distance` bytes back.
    ///
    /// Each copied byte is appended to the history and written to `out`.
    /// Copies stop when `out` is full; the return value is the number of
    /// bytes copied, so a caller can resume the remainder later with the
    /// same distance. Overlapping copies (`length > distance`) repeat the
    /// pattern as LZ77 requires.
    pub fn copy_match(&mut self, distance: usize, length: usize, out: &mut [u8]) -> Result<usize> {
        if distance == 0 || distance > self.size {
            return Err(GzError::invalid_distance(distance, self.size));
        }

        let count = length.min(out.len());
        let mut src = self.position.wrapping_sub(distance) & self.mask;

        for slot in out.iter_mut().take(count) {
            let byte = self.buffer[src];
            *slot = byte;
            self.buffer[self.position] = byte;
            self.position = (self.position + 1) & self.mask;
            src = (src + 1) & self.mask;
        }
        self.size = (self.size + count).min(self.capacity());

        Ok(count)
    }

    /// Copy the history out, oldest byte first.
    pub fn snapshot(&self) -> Box<[u8]> {
        let mut history = Vec::with_capacity(self.size);
        let start = self.position.wrapping_sub(self.size) & self.mask;
        if start + self.size <= self.capacity() {
            history.extend_from_slice(&self.buffer[start..start + self.size]);
        } else {
            history.extend_from_slice(&self.buffer[start..]);
            history.extend_from_slice(&self.buffer[..self.position]);
        }
        history.into_boxed_slice()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_basic() {
        let mut window = SlidingWindow::new(8);
        window.extend(b"Hello");

        assert_eq!(window.len(), 5);
        assert_eq!(&*window.snapshot(), b"Hello");
    }

    #[test]
    fn test_window_wrap() {
        let mut window = SlidingWindow::new(4);
        window.extend(b"ABCDEF");

        assert_eq!(window.len(), 4);
        assert_eq!(&*window.snapshot(), b"CDEF");

        window.push(b'G');
        assert_eq!(&*window.snapshot(), b"DEFG");
    }

    #[test]
    fn test_copy_match() {
        let mut window = SlidingWindow::new(32);
        let mut out = [0u8; 10];

        window.extend(b"ABCD");
        let written = window.copy_match(4, 4, &mut out).unwrap();
        assert_eq!(written, 4);
        assert_eq!(&out[..4], b"ABCD");
        assert_eq!(&*window.snapshot(), b"ABCDABCD");
    }

    #[test]
    fn test_copy_overlap() {
        // "AB" -> distance=2, length=6 -> "ABABAB"
        let mut window = SlidingWindow::new(32);
        let mut out = [0u8; 10];

        window.extend(b"AB");
        let written = window.copy_match(2, 6, &mut out).unwrap();
        assert_eq!(written, 6);
        assert_eq!(&out[..6], b"ABABAB");
    }

    #[test]
    fn test_copy_resumes_when_output_is_short() {
        let mut window = SlidingWindow::new(32);
        window.push(b'X');
        window.push(b'Y');

        let mut out = [0u8; 3];
        assert_eq!(window.copy_match(2, 5, &mut out).unwrap(), 3);
        assert_eq!(&out, b"XYX");

        // Same distance continues the pattern.
        let mut rest = [0u8; 8];
        assert_eq!(window.copy_match(2, 2, &mut rest).unwrap(), 2);
        assert_eq!(&rest[..2], b"YX");
    }

    #[test]
    fn test_invalid_distance() {
        let mut window = SlidingWindow::new(32);
        let mut out = [0u8; 4];

        assert!(window.copy_match(1, 1, &mut out).is_err());
        window.extend(b"abc");
        let err = window.copy_match(4, 1, &mut out).unwrap_err();
        assert!(matches!(
            err,
            GzError::InvalidBackReference {
                distance: 4,
                available: 3
            }
        ));
        assert!(window.copy_match(0, 1, &mut out).is_err());
    }

    #[test]
    fn test_snapshot_restore() {
        let mut window = SlidingWindow::new(16);
        window.extend(b"0123456789abcdefXYZ");

        let restored = SlidingWindow::from_history(16, &window.snapshot());
        assert_eq!(restored.len(), 16);
        assert_eq!(restored.snapshot(), window.snapshot());

        let mut a = [0u8; 5];
        let mut b = [0u8; 5];
        let mut original = window.clone();
        let mut copy = restored.clone();
        original.copy_match(7, 5, &mut a).unwrap();
        copy.copy_match(7, 5, &mut b).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_clear() {
        let mut window = SlidingWindow::deflate();
        window.extend(b"data");
        window.clear();
        assert!(window.is_empty());
        assert_eq!(window.capacity(), DEFLATE_WINDOW_SIZE);
    }

    #[test]
    #[should_panic(expected = "power of 2")]
    fn test_non_power_of_two_panics() {
        let _ = SlidingWindow::new(100);
    }
}
