//! The entropy module compresses a chunk's reduced bits into bytes.
//!
//! Five backends are available. Every encoded payload starts with a one-byte tag naming the
//! backend that wrote it, so a container can mix backends and the decoder never needs to
//! be told which one to use.
//!
//! | tag | backend        | layout after the tag                                      |
//! |-----|----------------|-----------------------------------------------------------|
//! | 0   | passthrough    | u32 LE bit length, packed bits                            |
//! | 1   | deflate        | gzip stream of (u32 LE bit length, packed bits)           |
//! | 2   | prefix tree    | preorder tree, u16 LE bit length, codeword stream         |
//! | 3   | run length     | (symbol, run) byte pairs, runs of 1..=255                 |
//! | 4   | adaptive sparse| sub-mode byte, then combinadic / positions / varint runs  |
//!
//! The set of backends is closed. Old containers must stay readable, so a tag, once
//! assigned, is never reused.
//!
//! Sequences are limited to MAX_BITS bits, the size of the largest chunk the pipeline makes.
//! Decoders check every declared length against it before allocating or ranking.

pub mod deflate;
pub mod prefix_tree;
pub mod run_length;
pub mod sparse;

use std::{fmt::Display, fmt::Formatter, str::FromStr};

use log::trace;

use crate::bitstream::{
    bitplane::{bits_to_bytes, bytes_to_bits},
    bytereader::ByteReader,
};
use crate::compression::compress::MAX_CHUNK_SIZE;
use crate::error::{Error, Result};

/// Longest bit sequence a payload may hold.
pub const MAX_BITS: usize = MAX_CHUNK_SIZE * 8;

/// Entropy coding backends, with their on-disk tag as discriminant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Backend {
    Passthrough = 0,
    Deflate = 1,
    PrefixTree = 2,
    RunLength = 3,
    AdaptiveSparse = 4,
}

impl Backend {
    /// Every backend, in tag order.
    pub const ALL: [Backend; 5] = [
        Backend::Passthrough,
        Backend::Deflate,
        Backend::PrefixTree,
        Backend::RunLength,
        Backend::AdaptiveSparse,
    ];

    pub fn tag(self) -> u8 {
        self as u8
    }

    pub fn from_tag(tag: u8) -> Result<Self> {
        Backend::ALL
            .iter()
            .copied()
            .find(|b| b.tag() == tag)
            .ok_or_else(|| Error::format(format!("unknown entropy backend tag {}", tag)))
    }

    /// Name used on the command line.
    pub fn name(self) -> &'static str {
        match self {
            Backend::Passthrough => "passthrough",
            Backend::Deflate => "deflate",
            Backend::PrefixTree => "prefix-tree",
            Backend::RunLength => "run-length",
            Backend::AdaptiveSparse => "sparse",
        }
    }
}

impl Default for Backend {
    fn default() -> Self {
        Backend::Deflate
    }
}

impl Display for Backend {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Backend {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "passthrough" | "none" => Ok(Backend::Passthrough),
            "deflate" | "gzip" => Ok(Backend::Deflate),
            "prefix-tree" | "huffman" => Ok(Backend::PrefixTree),
            "run-length" | "rle" => Ok(Backend::RunLength),
            "sparse" | "adaptive-sparse" => Ok(Backend::AdaptiveSparse),
            other => Err(Error::Config(format!(
                "unknown backend '{}' (expected passthrough, deflate, prefix-tree, run-length or sparse)",
                other
            ))),
        }
    }
}

/// Encode `bits` with `backend`, prefixed with the backend tag.
pub fn encode(backend: Backend, bits: &[bool]) -> Result<Vec<u8>> {
    check_len(bits.len())?;
    let body = match backend {
        Backend::Passthrough => pack_with_length(bits)?,
        Backend::Deflate => deflate::encode(bits)?,
        Backend::PrefixTree => prefix_tree::encode(bits)?,
        Backend::RunLength => run_length::encode(bits),
        Backend::AdaptiveSparse => sparse::encode(bits)?,
    };
    let mut out = Vec::with_capacity(body.len() + 1);
    out.push(backend.tag());
    out.extend_from_slice(&body);
    trace!(
        "{} coded {} bits into {} bytes",
        backend,
        bits.len(),
        out.len()
    );
    Ok(out)
}

/// Decode a tagged payload back into bits.
pub fn decode(data: &[u8]) -> Result<Vec<bool>> {
    let (&tag, body) = data
        .split_first()
        .ok_or_else(|| Error::format("empty entropy payload"))?;
    match Backend::from_tag(tag)? {
        Backend::Passthrough => unpack_with_length(body),
        Backend::Deflate => deflate::decode(body),
        Backend::PrefixTree => prefix_tree::decode(body),
        Backend::RunLength => run_length::decode(body),
        Backend::AdaptiveSparse => sparse::decode(body),
    }
}

/// Reject a bit count past MAX_BITS.
pub(crate) fn check_len(len: usize) -> Result<()> {
    if len > MAX_BITS {
        return Err(Error::format(format!(
            "{} bits is over the {} bit limit",
            len, MAX_BITS
        )));
    }
    Ok(())
}

/// u32 LE bit count followed by the packed bits.
pub(crate) fn pack_with_length(bits: &[bool]) -> Result<Vec<u8>> {
    let len = u32::try_from(bits.len())
        .map_err(|_| Error::format(format!("{} bits do not fit a u32 length", bits.len())))?;
    let mut out = Vec::with_capacity(4 + (bits.len() + 7) / 8);
    out.extend_from_slice(&len.to_le_bytes());
    out.extend_from_slice(&bits_to_bytes(bits));
    Ok(out)
}

/// Inverse of pack_with_length. The packed section must be exactly as long as the length
/// needs.
pub(crate) fn unpack_with_length(data: &[u8]) -> Result<Vec<bool>> {
    let mut br = ByteReader::new(data);
    let len = br.u32_le("bit length")? as usize;
    check_len(len)?;
    let packed = br.rest();
    if packed.len() != (len + 7) / 8 {
        return Err(Error::format(format!(
            "{} bits need {} bytes but {} are present",
            len,
            (len + 7) / 8,
            packed.len()
        )));
    }
    let mut bits = bytes_to_bits(packed);
    bits.truncate(len);
    Ok(bits)
}

#[cfg(test)]
mod test {
    use super::*;

    fn samples() -> Vec<Vec<bool>> {
        vec![
            vec![],
            vec![true],
            vec![false],
            vec![false; 8192],
            vec![true; 8192],
            (0..8192).map(|i| i % 3 == 0).collect(),
            (0..8192).map(|i| i % 97 == 5).collect(),
            (0..8192).map(|i| (i / 40) % 2 == 1).collect(),
            (0..8192).map(|i| i % 5 == 0 || i % 7 == 0).collect(),
            (0..13).map(|i| i % 2 == 0).collect(),
        ]
    }

    #[test]
    fn every_backend_round_trips() {
        for backend in Backend::ALL {
            for bits in samples() {
                let encoded = encode(backend, &bits).unwrap();
                assert_eq!(encoded[0], backend.tag());
                assert_eq!(decode(&encoded).unwrap(), bits, "{} failed", backend);
            }
        }
    }

    #[test]
    fn unknown_tag_is_rejected() {
        assert!(matches!(decode(&[9, 0, 0]), Err(Error::Format(_))));
        assert!(matches!(decode(&[]), Err(Error::Format(_))));
    }

    #[test]
    fn truncated_payloads_are_rejected() {
        let bits: Vec<bool> = (0..8192).map(|i| i % 11 == 0 || i % 13 == 0).collect();
        // Run length payloads carry no total, any whole number of pairs is a valid payload
        for backend in Backend::ALL.into_iter().filter(|&b| b != Backend::RunLength) {
            let encoded = encode(backend, &bits).unwrap();
            for cut in [1, 2, encoded.len() / 2, encoded.len() - 1] {
                assert!(
                    decode(&encoded[..cut]).is_err(),
                    "{} accepted a payload cut to {} of {} bytes",
                    backend,
                    cut,
                    encoded.len()
                );
            }
        }
    }

    #[test]
    fn sparse_chunks_shrink() {
        let bits: Vec<bool> = (0..8192).map(|i| i % 211 == 0).collect();
        for backend in [Backend::Deflate, Backend::AdaptiveSparse, Backend::RunLength] {
            assert!(encode(backend, &bits).unwrap().len() < 1024, "{}", backend);
        }
    }

    #[test]
    fn backend_names_test() {
        for backend in Backend::ALL {
            assert_eq!(backend.name().parse::<Backend>().unwrap(), backend);
            assert_eq!(Backend::from_tag(backend.tag()).unwrap(), backend);
        }
        assert_eq!("GZIP".parse::<Backend>().unwrap(), Backend::Deflate);
        assert!(matches!("lzma".parse::<Backend>(), Err(Error::Config(_))));
    }

    #[test]
    fn pack_with_length_test() {
        let packed = pack_with_length(&[true, false, true]).unwrap();
        assert_eq!(packed, vec![3, 0, 0, 0, 0b1010_0000]);
        assert_eq!(unpack_with_length(&packed).unwrap(), vec![true, false, true]);
        assert!(unpack_with_length(&[3, 0, 0, 0]).is_err());
        assert!(unpack_with_length(&[3, 0, 0, 0, 0, 0]).is_err());
    }

    #[test]
    fn length_limit_test() {
        assert!(check_len(MAX_BITS).is_ok());
        assert!(matches!(check_len(MAX_BITS + 1), Err(Error::Format(_))));
        assert!(unpack_with_length(&[0xff, 0xff, 0xff, 0xff]).is_err());
    }
}
