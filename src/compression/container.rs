//! The on-disk container that holds a run of encoded chunks.
//!
//! Both versions share a five byte header: the version byte and the u32 LE length of the
//! original input. What follows depends on the version.
//!
//! Streaming (version 2) writes one self-contained record per chunk:
//!
//! ```text
//! u32 LE one-bit count | u32 LE payload length | payload | u16 LE step log length | step log
//! ```
//!
//! Delimited (version 1) writes every payload first, then every step log, with sentinels
//! between the sections and after each step log:
//!
//! ```text
//! (u32 LE length | payload)* | FF 58 4F 52 4D 45 54 41 | (legacy step log | FE ED C0 DE)*
//! ```
//!
//! The delimited parser finds the sections by scanning for the sentinels, so a payload or
//! step log that happens to contain one would be cut in the wrong place. The writer
//! refuses to produce such a container and the parser cross-checks every boundary it finds.

use std::{fmt::Display, fmt::Formatter, str::FromStr};

use log::{debug, trace};

use crate::bitstream::bytereader::ByteReader;
use crate::error::{Error, Result};
use crate::reduction::steps::StepLog;
use crate::tools::primes::PrimeTable;

/// Separates the payload section from the step log section.
pub const SECTION_SENTINEL: [u8; 8] = [0xff, 0x58, 0x4f, 0x52, 0x4d, 0x45, 0x54, 0x41];
/// Ends each step log in the delimited layout.
pub const CHUNK_SENTINEL: [u8; 4] = [0xfe, 0xed, 0xc0, 0xde];

/// Container versions, with the header byte as discriminant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum FormatVersion {
    Delimited = 1,
    Streaming = 2,
}

impl FormatVersion {
    pub fn tag(self) -> u8 {
        self as u8
    }

    pub fn from_tag(tag: u8) -> Result<Self> {
        match tag {
            1 => Ok(FormatVersion::Delimited),
            2 => Ok(FormatVersion::Streaming),
            other => Err(Error::format(format!("unknown container version {}", other))),
        }
    }
}

impl Default for FormatVersion {
    fn default() -> Self {
        FormatVersion::Streaming
    }
}

impl Display for FormatVersion {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            FormatVersion::Delimited => write!(f, "delimited"),
            FormatVersion::Streaming => write!(f, "streaming"),
        }
    }
}

impl FromStr for FormatVersion {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "delimited" | "1" | "v1" => Ok(FormatVersion::Delimited),
            "streaming" | "2" | "v2" => Ok(FormatVersion::Streaming),
            other => Err(Error::Config(format!(
                "unknown format '{}' (expected delimited or streaming)",
                other
            ))),
        }
    }
}

/// One chunk as stored: its entropy payload and the steps that undo its reduction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkRecord {
    /// Set bits in the reduced chunk. Only the streaming layout stores it.
    pub one_count: Option<u32>,
    /// Tagged entropy payload.
    pub payload: Vec<u8>,
    pub steps: StepLog,
}

/// A parsed container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Container {
    pub version: FormatVersion,
    pub original_len: u32,
    pub chunks: Vec<ChunkRecord>,
}

impl Container {
    /// Serialize. Step logs are written as prime indices into `primes`.
    pub fn encode(&self, primes: &PrimeTable) -> Result<Vec<u8>> {
        let mut out = vec![self.version.tag()];
        out.extend_from_slice(&self.original_len.to_le_bytes());
        match self.version {
            FormatVersion::Streaming => write_streaming(&mut out, &self.chunks, primes)?,
            FormatVersion::Delimited => write_delimited(&mut out, &self.chunks, primes)?,
        }
        debug!(
            "{} container: {} chunks, {} bytes",
            self.version,
            self.chunks.len(),
            out.len()
        );
        Ok(out)
    }

    /// Parse a whole container. The version byte picks the parser.
    pub fn decode(data: &[u8], primes: &PrimeTable) -> Result<Self> {
        let mut br = ByteReader::new(data);
        let version = FormatVersion::from_tag(br.u8("container version")?)?;
        let original_len = br.u32_le("original length")?;
        let body = br.rest();
        let chunks = match version {
            FormatVersion::Streaming => parse_streaming(body, primes)?,
            FormatVersion::Delimited => parse_delimited(body, primes)?,
        };
        debug!(
            "Parsed {} container: {} chunks for {} original bytes",
            version,
            chunks.len(),
            original_len
        );
        Ok(Self {
            version,
            original_len,
            chunks,
        })
    }
}

fn write_streaming(out: &mut Vec<u8>, chunks: &[ChunkRecord], primes: &PrimeTable) -> Result<()> {
    for (i, chunk) in chunks.iter().enumerate() {
        let one_count = chunk.one_count.ok_or_else(|| {
            Error::format(format!("chunk {} has no one-bit count to record", i))
        })?;
        let payload_len = u32::try_from(chunk.payload.len())
            .map_err(|_| Error::format(format!("chunk {} payload is too large", i)))?;
        let steps = chunk.steps.encode(primes)?;
        let steps_len = u16::try_from(steps.len())
            .map_err(|_| Error::format(format!("chunk {} step log is too large", i)))?;

        out.extend_from_slice(&one_count.to_le_bytes());
        out.extend_from_slice(&payload_len.to_le_bytes());
        out.extend_from_slice(&chunk.payload);
        out.extend_from_slice(&steps_len.to_le_bytes());
        out.extend_from_slice(&steps);
    }
    Ok(())
}

fn parse_streaming(body: &[u8], primes: &PrimeTable) -> Result<Vec<ChunkRecord>> {
    let mut br = ByteReader::new(body);
    let mut chunks = Vec::new();
    while !br.is_empty() {
        let start = br.position();
        let one_count = br.u32_le("one-bit count")?;
        let payload_len = br.u32_le("payload length")? as usize;
        let payload = br.take(payload_len, "payload")?.to_vec();
        let steps_len = br.u16_le("step log length")? as usize;
        let steps = StepLog::decode(br.take(steps_len, "step log")?, primes)?;
        trace!(
            "Record {} at offset {}: {} payload bytes, {} steps",
            chunks.len(),
            start,
            payload.len(),
            steps.len()
        );
        chunks.push(ChunkRecord {
            one_count: Some(one_count),
            payload,
            steps,
        });
    }
    Ok(chunks)
}

fn write_delimited(out: &mut Vec<u8>, chunks: &[ChunkRecord], primes: &PrimeTable) -> Result<()> {
    let mut section = Vec::new();
    for (i, chunk) in chunks.iter().enumerate() {
        let payload_len = u32::try_from(chunk.payload.len())
            .map_err(|_| Error::format(format!("chunk {} payload is too large", i)))?;
        section.extend_from_slice(&payload_len.to_le_bytes());
        section.extend_from_slice(&chunk.payload);
    }
    section.extend_from_slice(&SECTION_SENTINEL);
    // The parser takes the first sentinel it sees as the section boundary
    if find(&section, &SECTION_SENTINEL) != Some(section.len() - SECTION_SENTINEL.len()) {
        return Err(Error::format(
            "a payload contains the section sentinel, use the streaming format",
        ));
    }
    out.extend_from_slice(&section);

    for (i, chunk) in chunks.iter().enumerate() {
        let mut entry = chunk.steps.encode_legacy(primes)?;
        entry.extend_from_slice(&CHUNK_SENTINEL);
        if find(&entry, &CHUNK_SENTINEL) != Some(entry.len() - CHUNK_SENTINEL.len()) {
            return Err(Error::format(format!(
                "step log of chunk {} contains the chunk sentinel",
                i
            )));
        }
        out.extend_from_slice(&entry);
    }
    Ok(())
}

fn parse_delimited(body: &[u8], primes: &PrimeTable) -> Result<Vec<ChunkRecord>> {
    let boundary = find(body, &SECTION_SENTINEL)
        .ok_or_else(|| Error::format("delimited container has no section sentinel"))?;

    // Walking the length prefixes must land exactly on the sentinel
    let mut br = ByteReader::new(&body[..boundary]);
    let mut payloads = Vec::new();
    while !br.is_empty() {
        let len = br.u32_le("payload length")? as usize;
        payloads.push(br.take(len, "payload")?.to_vec());
    }

    let mut metadata = &body[boundary + SECTION_SENTINEL.len()..];
    let mut logs = Vec::with_capacity(payloads.len());
    while !metadata.is_empty() {
        let end = find(metadata, &CHUNK_SENTINEL).ok_or_else(|| {
            Error::format(format!(
                "step log {} is missing its chunk sentinel",
                logs.len()
            ))
        })?;
        logs.push(StepLog::decode_legacy(&metadata[..end], primes)?);
        metadata = &metadata[end + CHUNK_SENTINEL.len()..];
    }

    if logs.len() != payloads.len() {
        return Err(Error::format(format!(
            "{} payloads but {} step logs",
            payloads.len(),
            logs.len()
        )));
    }
    Ok(payloads
        .into_iter()
        .zip(logs)
        .map(|(payload, steps)| ChunkRecord {
            one_count: None,
            payload,
            steps,
        })
        .collect())
}

/// Offset of the first occurrence of `needle` in `haystack`.
fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::reduction::steps::CompressionStep::{Negate, Xor};

    fn sample(version: FormatVersion) -> Container {
        let one_count = |n| match version {
            FormatVersion::Streaming => Some(n),
            FormatVersion::Delimited => None,
        };
        Container {
            version,
            original_len: 7,
            chunks: vec![
                ChunkRecord {
                    one_count: one_count(3),
                    payload: vec![0, 1, 2, 3],
                    steps: StepLog::from(vec![Negate, Xor { period: 5 }]),
                },
                ChunkRecord {
                    one_count: one_count(0),
                    payload: vec![9],
                    steps: StepLog::new(),
                },
            ],
        }
    }

    #[test]
    fn streaming_layout_test() {
        let primes = PrimeTable::standard();
        let encoded = sample(FormatVersion::Streaming).encode(&primes).unwrap();
        let expected = vec![
            2, 7, 0, 0, 0, // header
            3, 0, 0, 0, 4, 0, 0, 0, 0, 1, 2, 3, // ones, payload
            4, 0, 2, 0, 0b1000_0000, 0b0001_0000, // steps: 1 | 0 00000000010
            0, 0, 0, 0, 1, 0, 0, 0, 9, // ones, payload
            2, 0, 0, 0, // empty step log
        ];
        assert_eq!(encoded, expected);
        assert_eq!(
            Container::decode(&encoded, &primes).unwrap(),
            sample(FormatVersion::Streaming)
        );
    }

    #[test]
    fn delimited_layout_test() {
        let primes = PrimeTable::standard();
        let encoded = sample(FormatVersion::Delimited).encode(&primes).unwrap();
        let mut expected = vec![1, 7, 0, 0, 0, 4, 0, 0, 0, 0, 1, 2, 3, 1, 0, 0, 0, 9];
        expected.extend_from_slice(&SECTION_SENTINEL);
        expected.extend_from_slice(&[1, 1, 2, 0]);
        expected.extend_from_slice(&CHUNK_SENTINEL);
        expected.extend_from_slice(&[0, 0]);
        expected.extend_from_slice(&CHUNK_SENTINEL);
        assert_eq!(encoded, expected);
        assert_eq!(
            Container::decode(&encoded, &primes).unwrap(),
            sample(FormatVersion::Delimited)
        );
    }

    #[test]
    fn empty_containers_test() {
        let primes = PrimeTable::standard();
        for version in [FormatVersion::Streaming, FormatVersion::Delimited] {
            let container = Container {
                version,
                original_len: 0,
                chunks: vec![],
            };
            let encoded = container.encode(&primes).unwrap();
            assert_eq!(Container::decode(&encoded, &primes).unwrap(), container);
        }
    }

    #[test]
    fn truncated_record_is_rejected() {
        let primes = PrimeTable::standard();
        let encoded = sample(FormatVersion::Streaming).encode(&primes).unwrap();
        // 23 is the end of the first record, which leaves a valid one chunk container
        for cut in (6..encoded.len()).filter(|&cut| cut != 23) {
            assert!(
                matches!(Container::decode(&encoded[..cut], &primes), Err(Error::Format(_))),
                "accepted a container cut to {} bytes",
                cut
            );
        }
        assert!(Container::decode(&[2, 0, 0], &primes).is_err());
        assert!(Container::decode(&[3, 0, 0, 0, 0], &primes).is_err());
    }

    #[test]
    fn sentinel_in_payload_is_refused() {
        let primes = PrimeTable::standard();
        let mut container = sample(FormatVersion::Delimited);
        let mut payload = vec![0];
        payload.extend_from_slice(&SECTION_SENTINEL);
        container.chunks[0].payload = payload;
        assert!(matches!(container.encode(&primes), Err(Error::Format(_))));
        // The streaming layout does not care
        let mut container = sample(FormatVersion::Streaming);
        container.chunks[0].payload = SECTION_SENTINEL.to_vec();
        let encoded = container.encode(&primes).unwrap();
        assert_eq!(Container::decode(&encoded, &primes).unwrap(), container);
    }

    #[test]
    fn delimited_mismatches_are_rejected() {
        let primes = PrimeTable::standard();
        let encoded = sample(FormatVersion::Delimited).encode(&primes).unwrap();

        // Payload length that overshoots the sentinel
        let mut bad = encoded.clone();
        bad[5] = 5;
        assert!(matches!(Container::decode(&bad, &primes), Err(Error::Format(_))));

        // One step log too few
        let mut bad = encoded.clone();
        bad.truncate(encoded.len() - 2 - CHUNK_SENTINEL.len());
        assert!(matches!(Container::decode(&bad, &primes), Err(Error::Format(_))));

        // Unterminated step log
        let mut bad = encoded.clone();
        bad.truncate(encoded.len() - 1);
        assert!(matches!(Container::decode(&bad, &primes), Err(Error::Format(_))));

        // No sentinel at all
        assert!(Container::decode(&[1, 0, 0, 0, 0, 1, 0, 0, 0, 5], &primes).is_err());
    }

    #[test]
    fn version_names_test() {
        assert_eq!("Streaming".parse::<FormatVersion>().unwrap(), FormatVersion::Streaming);
        assert_eq!("v1".parse::<FormatVersion>().unwrap(), FormatVersion::Delimited);
        assert!(matches!("zip".parse::<FormatVersion>(), Err(Error::Config(_))));
        assert_eq!(FormatVersion::default().to_string(), "streaming");
    }
}
