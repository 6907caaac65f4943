use std::io::{Read, Write};
use std::time::Instant;

use log::{debug, info, warn};

use super::compress::Summary;
use super::container::{ChunkRecord, Container};
use crate::bitstream::bitplane::bits_to_bytes;
use crate::entropy;
use crate::error::{Error, Result};
use crate::tools::{freq_count::count_ones, primes::PrimeTable};

/// Decode a container back into the original bytes. A failing chunk fails the whole call.
pub fn decode(data: &[u8], primes: &PrimeTable) -> Result<Vec<u8>> {
    decode_with_summary(data, primes).map(|(out, _)| out)
}

pub(crate) fn decode_with_summary(data: &[u8], primes: &PrimeTable) -> Result<(Vec<u8>, Summary)> {
    let start = Instant::now();
    let container = Container::decode(data, primes)?;
    let original_len = container.original_len as usize;
    info!(
        "Decoding {} container: {} chunks, {} original bytes",
        container.version,
        container.chunks.len(),
        original_len
    );

    let mut out = Vec::with_capacity(original_len);
    let mut steps = 0;
    for (seq, record) in container.chunks.iter().enumerate() {
        let chunk = decompress_chunk(seq, record)?;
        steps += record.steps.len();
        out.extend_from_slice(&chunk);
    }

    if out.len() < original_len {
        return Err(Error::format(format!(
            "chunks hold {} bytes but the header promises {}",
            out.len(),
            original_len
        )));
    }
    if out.len() > original_len {
        warn!(
            "Dropping {} bytes past the recorded length of {}",
            out.len() - original_len,
            original_len
        );
        out.truncate(original_len);
    }

    let summary = Summary {
        bytes_in: data.len(),
        bytes_out: out.len(),
        chunks: container.chunks.len(),
        steps,
    };
    debug!(
        "Decoded {} chunks: {} -> {} bytes in {:?}",
        summary.chunks,
        summary.bytes_in,
        summary.bytes_out,
        start.elapsed()
    );
    Ok((out, summary))
}

/// Entropy decode one record, check its one-bit count and undo its steps.
fn decompress_chunk(seq: usize, record: &ChunkRecord) -> Result<Vec<u8>> {
    let mut bits = entropy::decode(&record.payload).map_err(|e| annotate(e, seq))?;
    if let Some(expected) = record.one_count {
        let ones = count_ones(&bits);
        if ones != expected as usize {
            return Err(Error::arithmetic(format!(
                "chunk {} decodes to {} set bits, the record says {}",
                seq, ones, expected
            )));
        }
    }
    if bits.len() % 8 != 0 {
        return Err(Error::format(format!(
            "chunk {} holds {} bits, not a whole number of bytes",
            seq,
            bits.len()
        )));
    }
    record.steps.undo(&mut bits);
    debug!(
        "Chunk {}: {} payload bytes -> {} bytes, {} steps undone",
        seq,
        record.payload.len(),
        bits.len() / 8,
        record.steps.len()
    );
    Ok(bits_to_bytes(&bits))
}

/// Prefix a chunk number onto a decode error.
fn annotate(e: Error, seq: usize) -> Error {
    match e {
        Error::Format(msg) => Error::Format(format!("chunk {}: {}", seq, msg)),
        Error::Arithmetic(msg) => Error::Arithmetic(format!("chunk {}: {}", seq, msg)),
        other => other,
    }
}

/// Read a whole container from `reader` and write the decoded bytes to `writer`.
pub fn decompress<R: Read, W: Write>(
    mut reader: R,
    mut writer: W,
    primes: &PrimeTable,
) -> Result<Summary> {
    let mut data = Vec::new();
    reader.read_to_end(&mut data)?;
    let (out, summary) = decode_with_summary(&data, primes)?;
    writer.write_all(&out)?;
    writer.flush()?;
    Ok(summary)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::compression::compress::{encode, EncodeOptions};
    use crate::compression::container::FormatVersion;
    use crate::entropy::Backend;
    use crate::reduction::steps::StepLog;

    fn record(bits: &[bool], one_count: Option<u32>) -> ChunkRecord {
        ChunkRecord {
            one_count,
            payload: entropy::encode(Backend::Passthrough, bits).unwrap(),
            steps: StepLog::new(),
        }
    }

    fn container(chunks: Vec<ChunkRecord>, original_len: u32) -> Vec<u8> {
        Container {
            version: FormatVersion::Streaming,
            original_len,
            chunks,
        }
        .encode(&PrimeTable::standard())
        .unwrap()
    }

    #[test]
    fn one_count_mismatch_is_an_arithmetic_error() {
        let primes = PrimeTable::standard();
        let bits = vec![false; 8];
        let data = container(vec![record(&bits, Some(1))], 1);
        assert!(matches!(decode(&data, &primes), Err(Error::Arithmetic(_))));
        let data = container(vec![record(&bits, Some(0))], 1);
        assert_eq!(decode(&data, &primes).unwrap(), vec![0]);
    }

    #[test]
    fn partial_bytes_are_rejected() {
        let primes = PrimeTable::standard();
        let data = container(vec![record(&[true; 7], Some(7))], 1);
        assert!(matches!(decode(&data, &primes), Err(Error::Format(_))));
    }

    #[test]
    fn short_output_is_rejected() {
        let primes = PrimeTable::standard();
        let data = container(vec![record(&[false; 8], Some(0))], 2);
        assert!(matches!(decode(&data, &primes), Err(Error::Format(_))));
    }

    #[test]
    fn bad_payload_names_its_chunk() {
        let primes = PrimeTable::standard();
        let mut bad = record(&[false; 8], Some(0));
        bad.payload = vec![42];
        let data = container(vec![record(&[false; 8], Some(0)), bad], 2);
        match decode(&data, &primes) {
            Err(Error::Format(msg)) => assert!(msg.starts_with("chunk 1:")),
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn decompress_over_handles() {
        let primes = PrimeTable::standard();
        let data: Vec<u8> = (0..3000_u32).map(|i| (i * 31 % 256) as u8).collect();
        let encoded = encode(&data, &primes, &EncodeOptions::default()).unwrap();
        let mut out = Vec::new();
        let summary = decompress(&encoded[..], &mut out, &primes).unwrap();
        assert_eq!(out, data);
        assert_eq!(summary.chunks, 3);
        assert_eq!(summary.bytes_in, encoded.len());
        assert_eq!(summary.bytes_out, 3000);
    }
}
