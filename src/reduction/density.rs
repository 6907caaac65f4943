//! Density reduction: drive a chunk's bits toward mostly-zero with reversible steps.
//!
//! The search is greedy. If ones outnumber zeros the chunk is complemented first. Then,
//! round by round, every candidate prime p is scored by how many zeros the chunk would
//! have after XORing with the period-p pattern, and the best strict improvement is
//! committed. Primes are scanned in ascending order and only a strictly better score
//! replaces the current best, so the lowest period wins ties.
//!
//! Scoring a prime never builds its pattern. Flipping the bits at positions p-1, 2p-1, ...
//! turns every one into a zero and every zero into a one, so the change in zero count is
//! (ones at those positions) - (zeros at those positions).

use log::{debug, trace};

use super::steps::{CompressionStep, StepLog};
use crate::tools::{freq_count::count_ones, primes::PrimeTable};

/// Round limit for chunks up to this many bits; longer chunks get fewer rounds.
const LONG_CHUNK_BITS: usize = 8192;
const LONG_CHUNK_ROUNDS: usize = 5;

/// Stop searching once fewer than 1 in SPARSE_DIVISOR bits is a one.
const SPARSE_DIVISOR: usize = 10;

/// Tunables for the search. None of them affect whether a chunk can be decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReducerConfig {
    /// How many primes (from the front of the table) to test per round. 0 tests them all.
    pub primes_per_round: usize,
    /// Upper bound on XOR rounds for chunks up to 8192 bits.
    pub max_rounds: usize,
}

impl Default for ReducerConfig {
    fn default() -> Self {
        Self {
            primes_per_round: 0,
            max_rounds: 10,
        }
    }
}

/// The transformed bits and the log that undoes them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reduction {
    pub bits: Vec<bool>,
    pub steps: StepLog,
}

/// Reduce the one-density of `bits`. Pure: the same input always gives the same steps.
pub fn reduce(bits: &[bool], primes: &PrimeTable, config: &ReducerConfig) -> Reduction {
    let mut bits = bits.to_vec();
    let mut steps = StepLog::new();
    let len = bits.len();

    let ones = count_ones(&bits);
    let mut zeros = len - ones;
    debug!(
        "Initial bit distribution: {} ones, {} zeros ({:.1}% ones)",
        ones,
        zeros,
        percent(ones, len)
    );

    if ones > zeros {
        CompressionStep::Negate.apply(&mut bits);
        steps.push(CompressionStep::Negate);
        zeros = ones;
        debug!("Applied negation: {} zeros, {} ones", zeros, len - zeros);
    }

    let rounds = if len > LONG_CHUNK_BITS {
        config.max_rounds.min(LONG_CHUNK_ROUNDS)
    } else {
        config.max_rounds
    };

    for round in 0..rounds {
        if (len - zeros) * SPARSE_DIVISOR < len {
            trace!(
                "Bit stream is sparse ({:.1}% ones), stopping",
                percent(len - zeros, len)
            );
            break;
        }

        let candidates = primes.prefix(config.primes_per_round);
        let mut best: Option<(u32, usize)> = None;
        let mut best_gain = 0_isize;
        for &prime in candidates {
            // Periods past the end leave the chunk untouched, and so do all larger primes
            if prime as usize > len {
                break;
            }
            let gain = xor_gain(&bits, prime);
            if gain > best_gain {
                best_gain = gain;
                best = Some((prime, (zeros as isize + gain) as usize));
            }
        }

        match best {
            Some((prime, new_zeros)) => {
                CompressionStep::Xor { period: prime }.apply(&mut bits);
                steps.push(CompressionStep::Xor { period: prime });
                trace!(
                    "Round {}: prime {} gives {} zeros ({:.1}%)",
                    round,
                    prime,
                    new_zeros,
                    percent(new_zeros, len)
                );
                zeros = new_zeros;
            }
            None => {
                trace!("Round {}: no prime improves on {} zeros, stopping", round, zeros);
                break;
            }
        }
    }

    debug!(
        "Reduction finished with {} steps, {} of {} bits set",
        steps.len(),
        len - zeros,
        len
    );
    Reduction { bits, steps }
}

/// Change in zero count if `bits` were XORed with the pattern for `period`.
fn xor_gain(bits: &[bool], period: u32) -> isize {
    let period = period as usize;
    (period - 1..bits.len())
        .step_by(period)
        .map(|i| if bits[i] { 1 } else { -1 })
        .sum()
}

fn percent(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 * 100.0 / whole as f64
    }
}
