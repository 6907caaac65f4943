//! The tools module provides several helper functions for xorro.
//!
//! The tools are:
//! - cli: Command line interface for the xorro binary.
//! - combinadic: Ranking and unranking of bit position sets in the combinatorial number system.
//! - freq_count: Zero and one counts of a bit sequence.
//! - primes: The prime table the density reduction draws its XOR periods from.
//! - varint: Base-128 varints and length-prefixed big integers.
//!
pub mod cli;
pub mod combinadic;
pub mod freq_count;
pub mod primes;
pub mod varint;
