//! CRC-32 (ISO 3309) as used by the gzip trailer and header checksum.
//!
//! The gzip header CRC16 (FHCRC) is not a separate CRC-16 polynomial: it is
//! the two least significant bytes of the CRC-32 over the header bytes that
//! precede it (RFC 1952 section 2.3.1). [`Crc32::low16`] returns exactly that.
//!
//! Input of 16 bytes or more is processed with slicing-by-8, eight bytes per
//! step through eight derived tables; shorter input uses the single table.

/// Reflected CRC-32 polynomial.
const POLY: u32 = 0xEDB88320;

/// CRC-32 slicing-by-8 lookup tables. `TABLES[0]` is the classic table.
const TABLES: [[u32; 256]; 8] = {
    let mut tables = [[0u32; 256]; 8];

    let mut i = 0usize;
    while i < 256 {
        let mut crc = i as u32;
        let mut j = 0;
        while j < 8 {
            if crc & 1 != 0 {
                crc = (crc >> 1) ^ POLY;
            } else {
                crc >>= 1;
            }
            j += 1;
        }
        tables[0][i] = crc;
        i += 1;
    }

    let mut t = 1;
    while t < 8 {
        let mut i = 0usize;
        while i < 256 {
            let prev = tables[t - 1][i];
            tables[t][i] = tables[0][(prev & 0xFF) as usize] ^ (prev >> 8);
            i += 1;
        }
        t += 1;
    }

    tables
};

/// Running CRC-32 calculator.
///
/// - Polynomial: 0x04C11DB7 (reflected: 0xEDB88320)
/// - Initial value: 0xFFFFFFFF
/// - Final XOR: 0xFFFFFFFF
///
/// The state is a plain value so a decoder checkpoint can carry a copy of
/// the running checksum of a partially decoded member.
///
/// # Example
///
/// ```
/// use gzseek_core::crc::Crc32;
///
/// let mut crc = Crc32::new();
/// crc.update(b"hello ");
/// crc.update(b"world\n");
/// assert_eq!(crc.value(), 0xAF083B2D);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Crc32 {
    crc: u32,
}

impl Crc32 {
    /// Create a new CRC-32 calculator.
    pub fn new() -> Self {
        Self { crc: 0xFFFFFFFF }
    }

    /// Reset the CRC to its initial state.
    pub fn reset(&mut self) {
        self.crc = 0xFFFFFFFF;
    }

    /// Update the CRC with more data.
    #[inline]
    pub fn update(&mut self, data: &[u8]) {
        if data.len() >= 16 {
            self.crc = slice8(self.crc, data);
        } else {
            self.crc = bytewise(self.crc, data);
        }
    }

    /// Current CRC value of everything fed so far.
    #[inline(always)]
    pub fn value(&self) -> u32 {
        self.crc ^ 0xFFFFFFFF
    }

    /// Low 16 bits of the current value, the gzip header checksum.
    pub fn low16(&self) -> u16 {
        (self.value() & 0xFFFF) as u16
    }

    /// Compute CRC-32 for a slice in one call.
    pub fn compute(data: &[u8]) -> u32 {
        let mut crc = Self::new();
        crc.update(data);
        crc.value()
    }
}

impl Default for Crc32 {
    fn default() -> Self {
        Self::new()
    }
}

#[inline]
fn bytewise(mut crc: u32, data: &[u8]) -> u32 {
    for &byte in data {
        crc = TABLES[0][((crc ^ byte as u32) & 0xFF) as usize] ^ (crc >> 8);
    }
    crc
}

#[inline]
fn slice8(mut crc: u32, data: &[u8]) -> u32 {
    let mut chunks = data.chunks_exact(8);
    for chunk in &mut chunks {
        let lo = crc ^ u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        crc = TABLES[7][(lo & 0xFF) as usize]
            ^ TABLES[6][((lo >> 8) & 0xFF) as usize]
            ^ TABLES[5][((lo >> 16) & 0xFF) as usize]
            ^ TABLES[4][(lo >> 24) as usize]
            ^ TABLES[3][chunk[4] as usize]
            ^ TABLES[2][chunk[5] as usize]
            ^ TABLES[1][chunk[6] as usize]
            ^ TABLES[0][chunk[7] as usize];
    }
    bytewise(crc, chunks.remainder())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crc32_empty() {
        assert_eq!(Crc32::compute(b""), 0);
    }

    #[test]
    fn test_crc32_check() {
        assert_eq!(Crc32::compute(b"123456789"), 0xCBF43926);
    }

    #[test]
    fn test_crc32_hello_world() {
        assert_eq!(Crc32::compute(b"Hello, World!"), 0xEC4AC3D0);
        // Trailer of the classic hello.txt gzip vector.
        assert_eq!(Crc32::compute(b"hello world\n"), 0xAF083B2D);
    }

    #[test]
    fn test_crc32_incremental() {
        let mut crc = Crc32::new();
        crc.update(b"1234");
        crc.update(b"56789");
        assert_eq!(crc.value(), 0xCBF43926);
    }

    #[test]
    fn test_slice8_matches_bytewise() {
        let data: Vec<u8> = (0..1000u32).map(|i| (i * 31 % 251) as u8).collect();
        for len in [16, 17, 23, 24, 63, 64, 999, 1000] {
            let fast = slice8(0xFFFFFFFF, &data[..len]) ^ 0xFFFFFFFF;
            let slow = bytewise(0xFFFFFFFF, &data[..len]) ^ 0xFFFFFFFF;
            assert_eq!(fast, slow, "length {}", len);
        }
    }

    #[test]
    fn test_copy_resumes() {
        let mut crc = Crc32::new();
        crc.update(b"she sells ");
        let saved = crc;
        crc.update(b"seashells");

        let mut resumed = saved;
        resumed.update(b"seashells");
        assert_eq!(crc, resumed);
    }

    #[test]
    fn test_low16() {
        let mut crc = Crc32::new();
        crc.update(b"123456789");
        assert_eq!(crc.low16(), 0x3926);
    }
}
