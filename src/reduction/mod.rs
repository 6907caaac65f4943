//! The reduction module rewrites a chunk's bits so that they are mostly zero.
//!
//! The entropy coders do much better on a skewed bit distribution than on a balanced one.
//! Reduction searches for a short list of reversible steps (a complement, then XORs with
//! periodic prime patterns) that pushes the chunk toward all-zero, and records those steps
//! so decoding can walk them back.
//!
//! - density: The greedy search itself.
//! - steps: The step type, the per-chunk step log and its two on-disk layouts.
//!
pub mod density;
pub mod steps;
