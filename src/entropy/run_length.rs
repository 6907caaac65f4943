//! Run length backend: (symbol, run) byte pairs.
//!
//! Runs are capped at 255 so each fits in a byte; a longer run is split into several pairs
//! of the same symbol. The payload has no length field, the pairs simply continue to the
//! end of the slice.

use crate::error::{Error, Result};

const MAX_RUN: usize = 255;

/// Split `bits` into maximal runs of equal bits.
pub(crate) fn runs(bits: &[bool]) -> Vec<(bool, usize)> {
    let mut runs: Vec<(bool, usize)> = Vec::new();
    for &bit in bits {
        match runs.last_mut() {
            Some((symbol, count)) if *symbol == bit => *count += 1,
            _ => runs.push((bit, 1)),
        }
    }
    runs
}

pub fn encode(bits: &[bool]) -> Vec<u8> {
    let mut out = Vec::new();
    for (symbol, mut count) in runs(bits) {
        while count > 0 {
            let take = count.min(MAX_RUN);
            out.push(symbol as u8);
            out.push(take as u8);
            count -= take;
        }
    }
    out
}

pub fn decode(data: &[u8]) -> Result<Vec<bool>> {
    if data.len() % 2 != 0 {
        return Err(Error::format(format!(
            "run length payload of {} bytes is not a whole number of pairs",
            data.len()
        )));
    }
    let mut bits = Vec::with_capacity(data.len() * 4);
    for (i, pair) in data.chunks_exact(2).enumerate() {
        let symbol = match pair[0] {
            0 => false,
            1 => true,
            other => {
                return Err(Error::format(format!(
                    "run {} has symbol {}, expected 0 or 1",
                    i, other
                )))
            }
        };
        if pair[1] == 0 {
            return Err(Error::format(format!("run {} has zero length", i)));
        }
        bits.extend(std::iter::repeat(symbol).take(pair[1] as usize));
    }
    Ok(bits)
}
