//! Checksums used on the wire and over flash contents.
use crc::{crc32, Hasher32};

/// Fletcher-16 over `bytes`, as `(sum2 << 8) | sum1`, both sums modulo 255.
///
/// Known weak property: bytes 0x00 and 0xFF are indistinguishable, so a
/// corruption that flips every bit of a zero byte goes undetected.
pub fn fletcher16(bytes: &[u8]) -> u16 {
    let (sum1, sum2) = bytes.iter().fold((0u16, 0u16), |(sum1, sum2), byte| {
        let sum1 = (sum1 + *byte as u16) % 255;
        (sum1, (sum2 + sum1) % 255)
    });
    (sum2 << 8) | sum1
}

/// Running IEEE CRC32 digest, fed in chunks.
pub struct Crc32 {
    digest: crc32::Digest,
}

impl Default for Crc32 {
    fn default() -> Self { Self::new() }
}

impl Crc32 {
    pub fn new() -> Self { Self { digest: crc32::Digest::new(crc32::IEEE) } }
    pub fn update(&mut self, bytes: &[u8]) { self.digest.write(bytes); }
    pub fn finish(&self) -> u32 { self.digest.sum32() }
}
