//! Adaptive sparse backend: picks a layout from the one-bit density of the chunk.
//!
//! - under 10% ones: the set of one positions as a single combinadic rank
//! - under 30% ones: the one positions, first as a u32 and the rest as varint gaps
//! - otherwise: varint lengths of alternating runs
//!
//! Every layout starts with a sub-mode byte and a varint bit count n. The choice is made
//! from the data alone, so the decoder only ever reads the sub-mode byte.

use log::trace;

use super::{check_len, run_length::runs};
use crate::bitstream::bytereader::ByteReader;
use crate::error::{Error, Result};
use crate::tools::{
    combinadic::{rank, unrank},
    freq_count::count_ones,
    varint::{encode_unsigned, write_varint},
};

/// The layouts, with their sub-mode byte as discriminant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum SparseMode {
    Positions = 0,
    Runs = 1,
    Combinadic = 2,
}

impl SparseMode {
    /// Layout for `ones` set bits out of `len`.
    pub fn select(ones: usize, len: usize) -> Self {
        if len == 0 || ones * 10 < len {
            SparseMode::Combinadic
        } else if ones * 10 < len * 3 {
            SparseMode::Positions
        } else {
            SparseMode::Runs
        }
    }

    fn from_byte(byte: u8) -> Result<Self> {
        match byte {
            0 => Ok(SparseMode::Positions),
            1 => Ok(SparseMode::Runs),
            2 => Ok(SparseMode::Combinadic),
            other => Err(Error::format(format!("unknown sparse sub-mode {}", other))),
        }
    }
}

pub fn encode(bits: &[bool]) -> Result<Vec<u8>> {
    let ones = count_ones(bits);
    let mode = SparseMode::select(ones, bits.len());
    trace!(
        "Sparse layout {:?} for {} ones in {} bits",
        mode,
        ones,
        bits.len()
    );

    let mut out = vec![mode as u8];
    write_varint(&mut out, bits.len() as u64);
    match mode {
        SparseMode::Combinadic => {
            let positions = one_positions(bits);
            write_varint(&mut out, positions.len() as u64);
            out.extend_from_slice(&encode_unsigned(&rank(&positions)?));
        }
        SparseMode::Positions => {
            let positions = one_positions(bits);
            write_varint(&mut out, positions.len() as u64);
            if let Some((&first, rest)) = positions.split_first() {
                let first = u32::try_from(first).map_err(|_| {
                    Error::format(format!("bit position {} does not fit a u32", first))
                })?;
                out.extend_from_slice(&first.to_le_bytes());
                let mut last = first as usize;
                for &p in rest {
                    write_varint(&mut out, (p - last) as u64);
                    last = p;
                }
            }
        }
        SparseMode::Runs => {
            out.push(bits.first().map_or(0, |&b| b as u8));
            for (_, count) in runs(bits) {
                write_varint(&mut out, count as u64);
            }
        }
    }
    Ok(out)
}

pub fn decode(data: &[u8]) -> Result<Vec<bool>> {
    let mut br = ByteReader::new(data);
    let mode = SparseMode::from_byte(br.u8("sparse sub-mode")?)?;
    let n = br.varint_usize("bit count")?;
    check_len(n)?;
    let bits = match mode {
        SparseMode::Combinadic => decode_combinadic(&mut br, n)?,
        SparseMode::Positions => decode_positions(&mut br, n)?,
        SparseMode::Runs => decode_runs(&mut br, n)?,
    };
    if !br.is_empty() {
        return Err(Error::format(format!(
            "{} stray bytes after sparse payload",
            br.remaining()
        )));
    }
    Ok(bits)
}

fn one_positions(bits: &[bool]) -> Vec<usize> {
    bits.iter()
        .enumerate()
        .filter_map(|(i, &bit)| bit.then_some(i))
        .collect()
}

fn decode_combinadic(br: &mut ByteReader<'_>, n: usize) -> Result<Vec<bool>> {
    let k = br.varint_usize("one count")?;
    // Only written for under 10% ones
    if k != 0 && SparseMode::select(k, n) != SparseMode::Combinadic {
        return Err(Error::format(format!(
            "{} ones in {} bits is too dense for a combinadic rank",
            k, n
        )));
    }
    let r = br.biguint("rank")?;
    let mut bits = vec![false; n];
    for p in unrank(n, k, &r)? {
        bits[p] = true;
    }
    Ok(bits)
}

fn decode_positions(br: &mut ByteReader<'_>, n: usize) -> Result<Vec<bool>> {
    let k = br.varint_usize("one count")?;
    if k > n {
        return Err(Error::format(format!("{} ones cannot fit in {} bits", k, n)));
    }
    let mut bits = vec![false; n];
    if k == 0 {
        return Ok(bits);
    }
    let mut p = br.u32_le("first position")? as usize;
    for i in 0..k {
        if i > 0 {
            let gap = br.varint_usize("position gap")?;
            if gap == 0 {
                return Err(Error::format(format!("position {} repeats the last one", i)));
            }
            p = p.saturating_add(gap);
        }
        if p >= n {
            return Err(Error::format(format!(
                "position {} is past the end of {} bits",
                p, n
            )));
        }
        bits[p] = true;
    }
    Ok(bits)
}

fn decode_runs(br: &mut ByteReader<'_>, n: usize) -> Result<Vec<bool>> {
    let mut symbol = match br.u8("first symbol")? {
        0 => false,
        1 => true,
        other => {
            return Err(Error::format(format!(
                "first symbol {} is not 0 or 1",
                other
            )))
        }
    };
    let mut bits = Vec::with_capacity(n);
    while bits.len() < n {
        let run = br.varint_usize("run length")?;
        if run == 0 || run > n - bits.len() {
            return Err(Error::format(format!(
                "run of {} does not fit the {} bits left",
                run,
                n - bits.len()
            )));
        }
        bits.extend(std::iter::repeat(symbol).take(run));
        symbol = !symbol;
    }
    Ok(bits)
}
