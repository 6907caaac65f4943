//! Combinatorial number system ("combinadic") ranking.
//!
//! A set of k distinct bit positions `c_k > ... > c_2 > c_1` out of `[0, n)` maps to the
//! single integer
//!
//! ```text
//! rank = C(c_k, k) + ... + C(c_2, 2) + C(c_1, 1)
//! ```
//!
//! which is a bijection onto `[0, C(n, k))`. For sparse chunks this is close to the
//! information-theoretic minimum for storing where the one bits are. The numbers involved
//! are far past 64 bits (C(8192, 800) has thousands of bits), so everything is computed
//! with `BigUint`.

use num_bigint::BigUint;
use num_traits::{One, Zero};

use crate::error::{Error, Result};

/// Binomial coefficient C(n, k), zero when k > n.
///
/// Uses `C(n, i) = C(n, i - 1) * (n - i + 1) / i`, which is exact at every step.
pub fn binomial(n: usize, k: usize) -> BigUint {
    if k > n {
        return BigUint::zero();
    }
    let k = k.min(n - k);
    let mut acc = BigUint::one();
    for i in 1..=k {
        acc *= n - i + 1;
        acc /= i;
    }
    acc
}

/// Rank a set of distinct positions. The order of `positions` does not matter.
pub fn rank(positions: &[usize]) -> Result<BigUint> {
    let mut sorted = positions.to_vec();
    sorted.sort_unstable_by(|a, b| b.cmp(a));
    if sorted.windows(2).any(|w| w[0] == w[1]) {
        return Err(Error::arithmetic("positions must be distinct to be ranked"));
    }
    let k = sorted.len();
    let mut acc = BigUint::zero();
    for (i, &p) in sorted.iter().enumerate() {
        acc += binomial(p, k - i);
    }
    Ok(acc)
}

/// Recover the k positions (out of n) with the given rank, largest position first.
pub fn unrank(n: usize, k: usize, r: &BigUint) -> Result<Vec<usize>> {
    if k > n {
        return Err(Error::arithmetic(format!(
            "cannot choose {} positions out of {}",
            k, n
        )));
    }
    if r >= &binomial(n, k) {
        return Err(Error::arithmetic(format!(
            "rank is not below C({}, {})",
            n, k
        )));
    }
    let mut positions = Vec::with_capacity(k);
    if k == 0 {
        return Ok(positions);
    }
    let mut remaining = r.clone();
    // m and c track C(m, j) as m walks down. Start one past the top so the first
    // candidate is n - 1.
    let mut m = n - 1;
    let mut c = binomial(m, k);
    for j in (1..=k).rev() {
        // Largest m with C(m, j) <= remaining. C(m - 1, j) = C(m, j) * (m - j) / m.
        while c > remaining {
            c = c * (m - j) / m;
            m -= 1;
        }
        positions.push(m);
        remaining -= &c;
        if j > 1 {
            // Next candidate is m - 1 for j - 1: C(m - 1, j - 1) = C(m, j) * j / m
            if m == 0 {
                return Err(Error::arithmetic("rank walked below position zero"));
            }
            c = c * j / m;
            m -= 1;
        }
    }
    Ok(positions)
}
