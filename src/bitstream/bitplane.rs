//! Converts byte blocks to and from bit planes.
//!
//! Bits are emitted most significant bit first, so byte 0xA0 becomes
//! `[1, 0, 1, 0, 0, 0, 0, 0]`. A bit sequence whose length is not a multiple of 8 is
//! padded with zero bits when packed back into bytes.

/// Spread bytes into one bool per bit, MSB first.
pub fn bytes_to_bits(data: &[u8]) -> Vec<bool> {
    let mut bits = Vec::with_capacity(data.len() * 8);
    for &byte in data {
        for shift in (0..8).rev() {
            bits.push((byte >> shift) & 1 == 1);
        }
    }
    bits
}

/// Pack bits back into bytes, MSB first, zero-padding the last byte.
pub fn bits_to_bytes(bits: &[bool]) -> Vec<u8> {
    bits.chunks(8)
        .map(|chunk| {
            chunk
                .iter()
                .enumerate()
                .fold(0_u8, |byte, (j, &bit)| byte | (bit as u8) << (7 - j))
        })
        .collect()
}
