//! xorro, a bit-level compressor built on density reduction.
//!
//! Version 0.1.0
//!
//! Input is cut into fixed-size chunks. Each chunk is spread into bits and rewritten, with
//! a short list of reversible steps (a complement, then XORs with periodic patterns whose
//! periods are primes), until most of its bits are zero. The reduced bits are entropy
//! coded by one of five backends and stored in a versioned container together with the
//! steps that undo the reduction.
//!
//! Basic usage of the library:
//!
//! ```
//! use xorro::{decode, encode, EncodeOptions, PrimeTable};
//!
//! let primes = PrimeTable::standard();
//! let data = b"abababababababababababab".to_vec();
//! let packed = encode(&data, &primes, &EncodeOptions::default()).unwrap();
//! assert_eq!(decode(&packed, &primes).unwrap(), data);
//! ```
//!
//! The binary wraps this as `xorro [-c|-d] <source> <destination>`.
//!
#![warn(rust_2018_idioms)]

pub mod bitstream;
pub mod compression;
pub mod entropy;
pub mod error;
pub mod reduction;
pub mod tools;

pub use compression::compress::{compress, encode, EncodeOptions, Summary};
pub use compression::container::FormatVersion;
pub use compression::decompress::{decode, decompress};
pub use entropy::Backend;
pub use error::{Error, Result};
pub use tools::primes::PrimeTable;
