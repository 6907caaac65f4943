//! Variable-length integer encodings.
//!
//! Small counts (bit lengths, run lengths, position deltas) use a base-128 varint: seven
//! value bits per byte, low bits first, with 0x80 marking that another byte follows.
//!
//! Arbitrary-precision integers (combinadic ranks) are stored as a length followed by
//! their big-endian magnitude bytes:
//!
//! ```text
//! unsigned:  varint(len) | magnitude[len]
//! signed:    S|len (len < 0x7f)            | magnitude[len]
//!            S|0x7f varint(len)            | magnitude[len]
//! ```
//!
//! `S` is the sign bit (0x80 for negative). Zero has no magnitude bytes and is never
//! written as negative.

use num_bigint::{BigInt, BigUint, Sign};
use num_traits::Zero;

use crate::error::{Error, Result};

/// A u64 varint never needs more than 10 bytes.
const MAX_VARINT_LEN: usize = 10;
/// Marks a signed length that did not fit in the first byte.
const EXTENDED_LEN: u8 = 0x7f;
const SIGN_BIT: u8 = 0x80;

/// Append `value` as a base-128 varint.
pub fn write_varint(out: &mut Vec<u8>, mut value: u64) {
    while value >= 0x80 {
        out.push((value as u8 & 0x7f) | 0x80);
        value >>= 7;
    }
    out.push(value as u8);
}

/// Read a base-128 varint from the front of `data`. Returns the value and the number of
/// bytes it occupied.
pub fn read_varint(data: &[u8]) -> Result<(u64, usize)> {
    let mut value = 0_u64;
    for (i, &byte) in data.iter().enumerate().take(MAX_VARINT_LEN) {
        let bits = (byte & 0x7f) as u64;
        let shift = 7 * i as u32;
        // The tenth byte may only carry the single top bit of a u64
        if shift == 63 && bits > 1 {
            return Err(Error::format("varint overflows 64 bits"));
        }
        value |= bits << shift;
        if byte & 0x80 == 0 {
            return Ok((value, i + 1));
        }
    }
    if data.len() >= MAX_VARINT_LEN {
        Err(Error::format("varint longer than 10 bytes"))
    } else {
        Err(Error::format("varint runs past end of buffer"))
    }
}

/// Encode a non-negative big integer: varint length, then big-endian magnitude.
pub fn encode_unsigned(n: &BigUint) -> Vec<u8> {
    let magnitude = magnitude_bytes(n);
    let mut out = Vec::with_capacity(magnitude.len() + 2);
    write_varint(&mut out, magnitude.len() as u64);
    out.extend_from_slice(&magnitude);
    out
}

/// Inverse of encode_unsigned. Returns the value and the bytes consumed.
pub fn decode_unsigned(data: &[u8]) -> Result<(BigUint, usize)> {
    let (len, used) = read_varint(data)?;
    let magnitude = take_magnitude(&data[used..], len)?;
    Ok((BigUint::from_bytes_be(magnitude), used + magnitude.len()))
}

/// Encode a signed big integer with the sign folded into the first length byte.
pub fn encode_signed(n: &BigInt) -> Vec<u8> {
    let magnitude = magnitude_bytes(n.magnitude());
    let sign = if n.sign() == Sign::Minus { SIGN_BIT } else { 0 };
    let mut out = Vec::with_capacity(magnitude.len() + 2);
    if magnitude.len() < EXTENDED_LEN as usize {
        out.push(sign | magnitude.len() as u8);
    } else {
        out.push(sign | EXTENDED_LEN);
        write_varint(&mut out, magnitude.len() as u64);
    }
    out.extend_from_slice(&magnitude);
    out
}

/// Inverse of encode_signed. Returns the value and the bytes consumed.
pub fn decode_signed(data: &[u8]) -> Result<(BigInt, usize)> {
    let first = *data
        .first()
        .ok_or_else(|| Error::format("signed integer missing its length byte"))?;
    let negative = first & SIGN_BIT != 0;
    let (len, mut used) = match first & !SIGN_BIT {
        EXTENDED_LEN => {
            let (len, n) = read_varint(&data[1..])?;
            (len, 1 + n)
        }
        short => (short as u64, 1),
    };
    let magnitude = take_magnitude(&data[used..], len)?;
    used += magnitude.len();
    let magnitude = BigUint::from_bytes_be(magnitude);
    let sign = match (negative, magnitude.is_zero()) {
        (_, true) => Sign::NoSign,
        (true, false) => Sign::Minus,
        (false, false) => Sign::Plus,
    };
    Ok((BigInt::from_biguint(sign, magnitude), used))
}

/// Big-endian magnitude with no bytes at all for zero.
fn magnitude_bytes(n: &BigUint) -> Vec<u8> {
    if n.is_zero() {
        Vec::new()
    } else {
        n.to_bytes_be()
    }
}

fn take_magnitude(data: &[u8], len: u64) -> Result<&[u8]> {
    if len > data.len() as u64 {
        return Err(Error::format(format!(
            "integer declares {} magnitude bytes but only {} remain",
            len,
            data.len()
        )));
    }
    Ok(&data[..len as usize])
}
