//! CRC-32 as used by PNG chunk checksums
//!
//! Reflected polynomial `0xEDB88320`, register seeded with `0xFFFFFFFF` and
//! complemented on output (the same CRC zlib and PNG use). The lookup table
//! is built once per process and shared read-only afterwards.

use std::fmt;
use std::sync::LazyLock;

/// Reversed representation of the CRC-32 polynomial
pub const POLYNOMIAL: u32 = 0xEDB8_8320;

static SHARED: LazyLock<Crc32> = LazyLock::new(Crc32::new);

/// Table-driven CRC-32 engine
///
/// Most callers want [`Crc32::shared`] (or the [`crc32`] shortcut), which
/// returns the process-wide instance. Building a private engine is allowed
/// but only costs a second table.
#[derive(Clone)]
pub struct Crc32 {
    table: [u32; 256],
}

impl Crc32 {
    /// Build a new engine, deriving the 256-entry table
    pub fn new() -> Self {
        let mut table = [0u32; 256];
        for (n, entry) in table.iter_mut().enumerate() {
            let mut c = n as u32;
            for _ in 0..8 {
                c = if c & 1 != 0 {
                    POLYNOMIAL ^ (c >> 1)
                } else {
                    c >> 1
                };
            }
            *entry = c;
        }
        Self { table }
    }

    /// The process-wide engine, built on first use
    pub fn shared() -> &'static Crc32 {
        &SHARED
    }

    /// Feed `bytes` into a running (uncomplemented) CRC register
    ///
    /// Start from `u32::MAX` and complement the final value, or use
    /// [`Crc32::checksum`] which does both.
    pub fn update(&self, mut crc: u32, bytes: &[u8]) -> u32 {
        for &byte in bytes {
            let i = ((crc ^ u32::from(byte)) & 0xFF) as usize;
            crc = self.table[i] ^ (crc >> 8);
        }
        crc
    }

    /// CRC-32 of a single byte sequence
    pub fn checksum(&self, bytes: &[u8]) -> u32 {
        self.update(u32::MAX, bytes) ^ u32::MAX
    }

    /// CRC-32 of several byte sequences as if they were concatenated
    ///
    /// PNG checksums cover the chunk type followed by the chunk data, so
    /// `checksum_parts(&[b"IEND", &[]])` equals `checksum(b"IEND")`.
    pub fn checksum_parts(&self, parts: &[&[u8]]) -> u32 {
        parts
            .iter()
            .fold(u32::MAX, |crc, part| self.update(crc, part))
            ^ u32::MAX
    }
}

impl Default for Crc32 {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Crc32 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Crc32")
            .field("polynomial", &format_args!("{POLYNOMIAL:#010x}"))
            .finish_non_exhaustive()
    }
}

/// CRC-32 of `bytes` using the shared engine
pub fn crc32(bytes: &[u8]) -> u32 {
    Crc32::shared().checksum(bytes)
}
