//! ByteReader: byte-aligned companion to BitReader.
//!
//! Containers and payload headers are made of whole-byte fields (little endian integers,
//! varints, length-prefixed slices). Each read checks the remaining length first and fails
//! with a format error naming the field that was cut short.

use num_bigint::BigUint;

use crate::error::{Error, Result};
use crate::tools::varint::{decode_unsigned, read_varint};

#[derive(Debug)]
pub struct ByteReader<'a> {
    buffer: &'a [u8],
    cursor: usize,
}

impl<'a> ByteReader<'a> {
    pub fn new(buffer: &'a [u8]) -> Self {
        Self { buffer, cursor: 0 }
    }

    /// Take the next `n` bytes as a slice.
    pub fn take(&mut self, n: usize, what: &str) -> Result<&'a [u8]> {
        if n > self.remaining() {
            return Err(Error::format(format!(
                "truncated {}: need {} bytes at offset {}, have {}",
                what,
                n,
                self.cursor,
                self.remaining()
            )));
        }
        let slice = &self.buffer[self.cursor..self.cursor + n];
        self.cursor += n;
        Ok(slice)
    }

    pub fn u8(&mut self, what: &str) -> Result<u8> {
        Ok(self.take(1, what)?[0])
    }

    pub fn u16_le(&mut self, what: &str) -> Result<u16> {
        let bytes = self.take(2, what)?;
        Ok(u16::from_le_bytes([bytes[0], bytes[1]]))
    }

    pub fn u32_le(&mut self, what: &str) -> Result<u32> {
        let bytes = self.take(4, what)?;
        Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    /// Read a base-128 varint.
    pub fn varint(&mut self, what: &str) -> Result<u64> {
        let (value, used) = read_varint(&self.buffer[self.cursor..])
            .map_err(|e| Error::format(format!("bad {}: {}", what, e)))?;
        self.cursor += used;
        Ok(value)
    }

    /// Read a varint that must fit in a usize.
    pub fn varint_usize(&mut self, what: &str) -> Result<usize> {
        let value = self.varint(what)?;
        usize::try_from(value)
            .map_err(|_| Error::format(format!("{} of {} does not fit in memory", what, value)))
    }

    /// Read a length-prefixed unsigned big integer.
    pub fn biguint(&mut self, what: &str) -> Result<BigUint> {
        let (value, used) = decode_unsigned(&self.buffer[self.cursor..])
            .map_err(|e| Error::format(format!("bad {}: {}", what, e)))?;
        self.cursor += used;
        Ok(value)
    }

    /// Everything not read yet.
    pub fn rest(&mut self) -> &'a [u8] {
        let slice = &self.buffer[self.cursor..];
        self.cursor = self.buffer.len();
        slice
    }

    /// Advance past bytes that were decoded by another reader.
    pub fn skip(&mut self, n: usize, what: &str) -> Result<()> {
        self.take(n, what).map(|_| ())
    }

    pub fn remaining(&self) -> usize {
        self.buffer.len() - self.cursor
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    pub fn position(&self) -> usize {
        self.cursor
    }
}
