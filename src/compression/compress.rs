use std::io::{Read, Write};
use std::time::Instant;

use log::{debug, info};

use super::compress_chunk::compress_chunk;
use super::container::{Container, FormatVersion};
use crate::entropy::Backend;
use crate::error::{Error, Result};
use crate::reduction::density::ReducerConfig;
use crate::tools::primes::PrimeTable;

/// Source bytes per chunk unless told otherwise.
pub const DEFAULT_CHUNK_SIZE: usize = 1024;
/// Largest chunk the pipeline accepts.
pub const MAX_CHUNK_SIZE: usize = 65536;

/// Everything the encoder can be told. None of it needs to be known to decode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodeOptions {
    /// Source bytes per chunk, 1..=65536
    pub chunk_size: usize,
    /// Primes tested per reduction round, 0 for the whole table
    pub primes_per_chunk: usize,
    pub backend: Backend,
    pub format: FormatVersion,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            primes_per_chunk: 0,
            backend: Backend::default(),
            format: FormatVersion::default(),
        }
    }
}

impl EncodeOptions {
    pub fn validate(&self) -> Result<()> {
        if !(1..=MAX_CHUNK_SIZE).contains(&self.chunk_size) {
            return Err(Error::Config(format!(
                "chunk size {} is outside 1..={}",
                self.chunk_size, MAX_CHUNK_SIZE
            )));
        }
        Ok(())
    }

    fn reducer_config(&self) -> ReducerConfig {
        ReducerConfig {
            primes_per_round: self.primes_per_chunk,
            ..ReducerConfig::default()
        }
    }
}

/// What a compress or decompress run did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Summary {
    pub bytes_in: usize,
    pub bytes_out: usize,
    pub chunks: usize,
    /// Reduction steps over all chunks
    pub steps: usize,
}

impl Summary {
    /// Output size as a percentage of input size.
    pub fn ratio(&self) -> f64 {
        if self.bytes_in == 0 {
            0.0
        } else {
            self.bytes_out as f64 * 100.0 / self.bytes_in as f64
        }
    }
}

/// Encode an in-memory buffer into a container.
pub fn encode(data: &[u8], primes: &PrimeTable, options: &EncodeOptions) -> Result<Vec<u8>> {
    encode_with_summary(data, primes, options).map(|(out, _)| out)
}

pub(crate) fn encode_with_summary(
    data: &[u8],
    primes: &PrimeTable,
    options: &EncodeOptions,
) -> Result<(Vec<u8>, Summary)> {
    options.validate()?;
    let original_len = u32::try_from(data.len()).map_err(|_| {
        Error::Config(format!(
            "input of {} bytes is too large for a container",
            data.len()
        ))
    })?;
    info!(
        "Encoding {} bytes in {} byte chunks with the {} backend, {} format",
        data.len(),
        options.chunk_size,
        options.backend,
        options.format
    );

    let start = Instant::now();
    let config = options.reducer_config();
    let chunks = data
        .chunks(options.chunk_size)
        .enumerate()
        .map(|(seq, chunk)| compress_chunk(seq, chunk, primes, &config, options.backend))
        .collect::<Result<Vec<_>>>()?;
    let steps = chunks.iter().map(|c| c.steps.len()).sum();

    let container = Container {
        version: options.format,
        original_len,
        chunks,
    };
    let out = container.encode(primes)?;
    let summary = Summary {
        bytes_in: data.len(),
        bytes_out: out.len(),
        chunks: container.chunks.len(),
        steps,
    };
    debug!(
        "Encoded {} chunks with {} steps: {} -> {} bytes ({:.1}%) in {:?}",
        summary.chunks,
        summary.steps,
        summary.bytes_in,
        summary.bytes_out,
        summary.ratio(),
        start.elapsed()
    );
    Ok((out, summary))
}

/// Read all of `reader`, encode it and write the container to `writer`.
pub fn compress<R: Read, W: Write>(
    mut reader: R,
    mut writer: W,
    primes: &PrimeTable,
    options: &EncodeOptions,
) -> Result<Summary> {
    let mut data = Vec::new();
    reader.read_to_end(&mut data)?;
    let (out, summary) = encode_with_summary(&data, primes, options)?;
    writer.write_all(&out)?;
    writer.flush()?;
    Ok(summary)
}
