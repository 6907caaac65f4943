//! Deflate backend: the packed bits, with their length, run through a gzip stream.

use std::io::{Read, Write};

use flate2::{read::GzDecoder, write::GzEncoder, Compression};

use super::{pack_with_length, unpack_with_length, MAX_BITS};
use crate::error::{Error, Result};

pub fn encode(bits: &[bool]) -> Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&pack_with_length(bits)?)?;
    Ok(encoder.finish()?)
}

/// Largest inflated body a valid payload can have: the u32 length and MAX_BITS packed.
const MAX_INFLATED: u64 = 4 + (MAX_BITS as u64 + 7) / 8;

pub fn decode(data: &[u8]) -> Result<Vec<bool>> {
    let mut inflated = Vec::new();
    GzDecoder::new(data)
        .take(MAX_INFLATED + 1)
        .read_to_end(&mut inflated)
        .map_err(|e| Error::format(format!("inflate failed: {}", e)))?;
    if inflated.len() as u64 > MAX_INFLATED {
        return Err(Error::format("inflated payload is over the size limit"));
    }
    unpack_with_length(&inflated)
}
