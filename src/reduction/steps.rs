//! The per-chunk step log.
//!
//! Every transform the density reducer commits is recorded here, in order. Both steps are
//! involutions (complementing twice, or XORing the same pattern twice, is the identity),
//! so undoing a log is just replaying it back to front.
//!
//! Two on-disk layouts exist. The streaming container uses the bit-packed layout:
//!
//! ```text
//! u16 LE op count | per op: 1 (Negate) or 0 + 11 bit prime index (Xor) | zero pad
//! ```
//!
//! The delimited container uses the older byte layout, which can only say "negate first,
//! then these XORs":
//!
//! ```text
//! u8 negate flag | u8 xor count | u16 LE prime index per xor
//! ```

use log::trace;

use crate::bitstream::{bitpacker::BitPacker, bitreader::BitReader, bytereader::ByteReader};
use crate::error::{Error, Result};
use crate::tools::primes::PrimeTable;

/// Width of a prime table index in the bit-packed layout.
const INDEX_BITS: u32 = 11;

/// One reversible transform of a chunk's bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionStep {
    /// Complement every bit.
    Negate,
    /// XOR with the pattern that has a one at every position i where (i + 1) % period == 0.
    Xor { period: u32 },
}

impl CompressionStep {
    /// Apply this step in place. Applying it a second time undoes it.
    pub fn apply(&self, bits: &mut [bool]) {
        match *self {
            CompressionStep::Negate => bits.iter_mut().for_each(|bit| *bit = !*bit),
            CompressionStep::Xor { period } => xor_in_place(bits, period),
        }
    }
}

/// The XOR pattern for a sequence of `len` bits. Only used where the whole pattern is
/// needed; the reducer and the step replay touch the set positions directly.
pub fn xor_pattern(len: usize, period: u32) -> Vec<bool> {
    let mut pattern = vec![false; len];
    xor_in_place(&mut pattern, period);
    pattern
}

/// Flip every bit the pattern for `period` would set.
fn xor_in_place(bits: &mut [bool], period: u32) {
    let period = period as usize;
    if period == 0 {
        return;
    }
    for i in (period - 1..bits.len()).step_by(period) {
        bits[i] = !bits[i];
    }
}

/// Ordered, append-only record of the steps applied to one chunk.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StepLog {
    steps: Vec<CompressionStep>,
}

impl StepLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, step: CompressionStep) {
        self.steps.push(step);
    }

    pub fn steps(&self) -> &[CompressionStep] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// True if any step is a Negate.
    pub fn negates(&self) -> bool {
        self.steps.contains(&CompressionStep::Negate)
    }

    /// Apply every step in order.
    pub fn replay(&self, bits: &mut [bool]) {
        self.steps.iter().for_each(|step| step.apply(bits));
    }

    /// Undo every step, last one first.
    pub fn undo(&self, bits: &mut [bool]) {
        self.steps.iter().rev().for_each(|step| step.apply(bits));
    }

    /// Bit-packed layout used by the streaming container.
    pub fn encode(&self, primes: &PrimeTable) -> Result<Vec<u8>> {
        let count = u16::try_from(self.steps.len())
            .map_err(|_| Error::format(format!("{} steps do not fit in a step log", self.len())))?;
        let mut bp = BitPacker::new(2 + self.steps.len() * 2);
        bp.out8(count as u8);
        bp.out8((count >> 8) as u8);
        for step in &self.steps {
            match *step {
                CompressionStep::Negate => bp.out_bit(true),
                CompressionStep::Xor { period } => {
                    let idx = index_of(primes, period)?;
                    bp.out_bit(false);
                    bp.out24(INDEX_BITS << 24 | idx as u32);
                }
            }
        }
        trace!("Step log of {} ops packed to {}", count, bp.loc());
        Ok(bp.finish())
    }

    /// Inverse of encode. The slice must hold exactly one log.
    pub fn decode(data: &[u8], primes: &PrimeTable) -> Result<Self> {
        let mut header = ByteReader::new(data);
        let count = header.u16_le("step count")?;
        let mut br = BitReader::new(&data[2..]);
        let mut log = StepLog::new();
        for n in 0..count {
            let negate = br
                .bit()
                .ok_or_else(|| Error::format(format!("step log ends before op {} of {}", n, count)))?;
            if negate {
                log.push(CompressionStep::Negate);
            } else {
                let idx = br.bint(INDEX_BITS as usize).ok_or_else(|| {
                    Error::format(format!("step log ends inside the prime index of op {}", n))
                })?;
                log.push(CompressionStep::Xor {
                    period: prime_at(primes, idx as usize)?,
                });
            }
        }
        br.align();
        if br.remaining_bits() > 0 {
            return Err(Error::format(format!(
                "{} stray bytes after step log",
                br.remaining_bits() / 8
            )));
        }
        Ok(log)
    }

    /// Byte layout used by the delimited container.
    pub fn encode_legacy(&self, primes: &PrimeTable) -> Result<Vec<u8>> {
        let (negate, xors) = match self.steps.split_first() {
            Some((CompressionStep::Negate, rest)) => (1_u8, rest),
            _ => (0_u8, &self.steps[..]),
        };
        let xor_count = u8::try_from(xors.len())
            .map_err(|_| Error::format("delimited containers hold at most 255 XOR steps"))?;
        let mut out = Vec::with_capacity(2 + xors.len() * 2);
        out.push(negate);
        out.push(xor_count);
        for step in xors {
            match *step {
                CompressionStep::Xor { period } => {
                    out.extend_from_slice(&index_of(primes, period)?.to_le_bytes())
                }
                CompressionStep::Negate => {
                    return Err(Error::format(
                        "delimited containers only record a negate as the first step",
                    ))
                }
            }
        }
        Ok(out)
    }

    /// Inverse of encode_legacy. The slice must hold exactly one log.
    pub fn decode_legacy(data: &[u8], primes: &PrimeTable) -> Result<Self> {
        let mut br = ByteReader::new(data);
        let mut log = StepLog::new();
        match br.u8("negate flag")? {
            0 => {}
            1 => log.push(CompressionStep::Negate),
            other => return Err(Error::format(format!("negate flag {} is not 0 or 1", other))),
        }
        let xor_count = br.u8("xor count")?;
        for _ in 0..xor_count {
            let idx = br.u16_le("prime index")?;
            log.push(CompressionStep::Xor {
                period: prime_at(primes, idx as usize)?,
            });
        }
        if !br.is_empty() {
            return Err(Error::format(format!(
                "{} stray bytes after legacy step log",
                br.remaining()
            )));
        }
        Ok(log)
    }
}

impl From<Vec<CompressionStep>> for StepLog {
    fn from(steps: Vec<CompressionStep>) -> Self {
        Self { steps }
    }
}

fn index_of(primes: &PrimeTable, period: u32) -> Result<u16> {
    primes
        .index_of(period)
        .ok_or_else(|| Error::format(format!("period {} is not in the prime table", period)))
}

fn prime_at(primes: &PrimeTable, idx: usize) -> Result<u32> {
    primes.get(idx).ok_or_else(|| {
        Error::format(format!(
            "prime index {} is beyond the {} entry table",
            idx,
            primes.len()
        ))
    })
}
