/// Returns the frequency count of a bit sequence, indexed by symbol: `[zeros, ones]`.
pub fn bit_freqs(bits: &[bool]) -> [usize; 2] {
    let ones = count_ones(bits);
    [bits.len() - ones, ones]
}

/// Number of set bits in the sequence.
pub fn count_ones(bits: &[bool]) -> usize {
    bits.iter().filter(|&&bit| bit).count()
}

#[test]
fn bit_freqs_test() {
    assert_eq!(bit_freqs(&[]), [0, 0]);
    assert_eq!(bit_freqs(&[true, false, false, true, true]), [2, 3]);
    assert_eq!(count_ones(&[false; 40]), 0);
}
