//! The legacy checksum stored in file records.
//!
//! Every byte is added into a 32-bit wrapping total which is then truncated
//! to 16 bits, see [`LegacySum::finalize`]. This is distinct from `cksum(1)`,
//! `sum -r` and the BSD `sum` algorithm. It is a weak checksum and must not
//! be used for anything security related.

use std::io::{self, Read};

use log::debug;

const READ_BLOCK_SIZE: usize = 8192;

/// Incremental state of the legacy sum.
///
/// ```
/// use svr4_contents::LegacySum;
///
/// let mut hasher = LegacySum::new();
/// hasher.update(b"a");
/// hasher.update(b"a");
/// assert_eq!(hasher.finalize(), 194);
/// ```
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LegacySum {
    total: u32,
    len: u64,
}

impl LegacySum {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.total = self.total.wrapping_add(u32::from(b));
        }
        self.len += bytes.len() as u64;
    }

    /// Feeds everything remaining in `reader`, returning the number of bytes read.
    pub fn update_from_reader<R: Read>(&mut self, mut reader: R) -> io::Result<u64> {
        let mut buf = [0_u8; READ_BLOCK_SIZE];
        let start = self.len;

        loop {
            let n = match reader.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };
            self.update(&buf[..n]);
        }

        Ok(self.len - start)
    }

    /// Number of bytes fed so far.
    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Reduces the 32-bit running total to the recorded 16-bit value.
    ///
    /// Carries out of bit 15 are dropped rather than folded back in
    /// (1024 `@` bytes sum to 0, 1025 sum to 64). SysV `sum(1)` folds them
    /// and would report 1 for both.
    pub fn finalize(self) -> u32 {
        self.total & 0xffff
    }
}

/// Computes the legacy sum of an in-memory buffer.
pub fn sum(bytes: impl AsRef<[u8]>) -> u32 {
    let mut hasher = LegacySum::new();
    hasher.update(bytes.as_ref());
    hasher.finalize()
}

/// Computes the legacy sum of everything remaining in `reader`.
pub fn sum_reader<R: Read>(reader: R) -> io::Result<u32> {
    let mut hasher = LegacySum::new();
    hasher.update_from_reader(reader)?;

    debug!("Summed {} bytes", hasher.len());
    Ok(hasher.finalize())
}
