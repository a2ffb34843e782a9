//! Fletcher-16 checksum
//!
//! Protects the served status record against corruption on the wire.
//! Two 8-bit running sums modulo 255; the final value is `sum2 << 8 | sum1`.

/// Computes the Fletcher-16 checksum of a byte sequence.
pub fn fletcher16(data: &[u8]) -> u16 {
    let mut sum1: u16 = 0;
    let mut sum2: u16 = 0;

    for &byte in data {
        sum1 = (sum1 + byte as u16) % 255;
        sum2 = (sum2 + sum1) % 255;
    }

    sum2 << 8 | sum1
}
