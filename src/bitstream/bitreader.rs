//! BitReader: reads a packed bitstream back out of a byte slice.
//!
//! Every read is bounds checked. Running off the end returns None, which the decoders
//! turn into a format error rather than guessing at missing data.
//!

/// Reads MSB-first bit fields from a byte slice.
#[derive(Debug)]
pub struct BitReader<'a> {
    buffer: &'a [u8],
    cursor: usize,
    bit_index: usize,
}

impl<'a> BitReader<'a> {
    /// Creates a new BitReader positioned at the first bit of the slice.
    pub fn new(buffer: &'a [u8]) -> Self {
        Self {
            buffer,
            cursor: 0,
            bit_index: 0,
        }
    }

    /// Return the next bit, or None if there is no more data to read
    pub fn bit(&mut self) -> Option<bool> {
        let byte = *self.buffer.get(self.cursor)?;
        let bit = (byte >> (7 - self.bit_index)) & 1 == 1;
        self.bit_index += 1;
        if self.bit_index == 8 {
            self.bit_index = 0;
            self.cursor += 1;
        }
        Some(bit)
    }

    /// Return the next n bits (n <= 32) as an unsigned value, or None if there is not
    /// enough data left. Nothing is consumed when the read fails.
    pub fn bint(&mut self, n: usize) -> Option<u32> {
        debug_assert!(n <= 32);
        if n > self.remaining_bits() {
            return None;
        }
        let mut result = 0_u32;
        for _ in 0..n {
            // Cannot fail, we checked the length above
            result = result << 1 | self.bit()? as u32;
        }
        Some(result)
    }

    /// Returns a byte, or None if there is no more data to read. This is
    /// a convenience function, and calls bint(8).
    pub fn byte(&mut self) -> Option<u8> {
        self.bint(8).map(|byte| byte as u8)
    }

    /// Skip to the start of the next byte (if we are not already on a boundary).
    pub fn align(&mut self) {
        if self.bit_index > 0 {
            self.bit_index = 0;
            self.cursor += 1;
        }
    }

    /// How many bits are left to read.
    pub fn remaining_bits(&self) -> usize {
        (self.buffer.len().saturating_sub(self.cursor)) * 8 - self.bit_index
    }

    /// Number of whole or partial bytes touched so far.
    pub fn bytes_consumed(&self) -> usize {
        self.cursor + (self.bit_index > 0) as usize
    }

    /// Debugging function. Report current position in the buffer.
    pub fn loc(&self) -> String {
        format!("[{}.{}]", self.cursor, self.bit_index)
    }
}
