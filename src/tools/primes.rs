//! The prime table used as the parameter domain of the density reduction search.
//!
//! The table is built once by the caller and handed to every function that needs it. It
//! is never mutated after construction, so a shared reference can be read from anywhere.

use rustc_hash::FxHashMap;

/// How many primes the standard table holds. Indices are stored in 11 bits, so the table
/// must never grow past 2048 entries.
pub const STANDARD_PRIME_COUNT: usize = 1029;

/// Largest table the 11 bit step log index can address.
pub const MAX_PRIME_COUNT: usize = 1 << 11;

/// Ordered sequence of the first N primes with a reverse index.
#[derive(Debug, Clone)]
pub struct PrimeTable {
    primes: Vec<u32>,
    index: FxHashMap<u32, u16>,
}

impl PrimeTable {
    /// Generate the first `count` primes (clamped to what the step log can address).
    pub fn new(count: usize) -> Self {
        let count = count.min(MAX_PRIME_COUNT);
        let mut primes = Vec::with_capacity(count);
        let mut candidate = 2_u32;
        while primes.len() < count {
            if is_prime(candidate) {
                primes.push(candidate);
            }
            candidate += 1;
        }
        let index = primes
            .iter()
            .enumerate()
            .map(|(i, &p)| (p, i as u16))
            .collect();
        Self { primes, index }
    }

    /// The table every container is written against.
    pub fn standard() -> Self {
        Self::new(STANDARD_PRIME_COUNT)
    }

    /// Prime at table position `idx`.
    pub fn get(&self, idx: usize) -> Option<u32> {
        self.primes.get(idx).copied()
    }

    /// Table position of `prime`, if it is in the table.
    pub fn index_of(&self, prime: u32) -> Option<u16> {
        self.index.get(&prime).copied()
    }

    pub fn len(&self) -> usize {
        self.primes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.primes.is_empty()
    }

    /// The first `width` primes, or the whole table when `width` is 0.
    pub fn prefix(&self, width: usize) -> &[u32] {
        if width == 0 {
            &self.primes
        } else {
            &self.primes[..width.min(self.primes.len())]
        }
    }
}

impl Default for PrimeTable {
    fn default() -> Self {
        Self::standard()
    }
}

/// Trial division, fine for the few thousand candidates we ever test.
fn is_prime(n: u32) -> bool {
    if n < 2 {
        return false;
    }
    if n % 2 == 0 {
        return n == 2;
    }
    let mut i = 3;
    while i * i <= n {
        if n % i == 0 {
            return false;
        }
        i += 2;
    }
    true
}
