use std::time::Instant;

use log::debug;

use super::container::ChunkRecord;
use crate::bitstream::bitplane::bytes_to_bits;
use crate::entropy::{self, Backend};
use crate::error::{Error, Result};
use crate::reduction::density::{reduce, ReducerConfig};
use crate::tools::{freq_count::count_ones, primes::PrimeTable};

/// Called by encode, this turns one chunk of source bytes into a container record:
/// bytes to bits, density reduction, then the entropy backend.
pub fn compress_chunk(
    seq: usize,
    chunk: &[u8],
    primes: &PrimeTable,
    config: &ReducerConfig,
    backend: Backend,
) -> Result<ChunkRecord> {
    let start = Instant::now();
    let bits = bytes_to_bits(chunk);
    let reduction = reduce(&bits, primes, config);

    let one_count = count_ones(&reduction.bits);
    let one_count = u32::try_from(one_count)
        .map_err(|_| Error::format(format!("chunk {} has too many set bits", seq)))?;
    let payload = entropy::encode(backend, &reduction.bits)?;

    debug!(
        "Chunk {}: {} -> {} bytes ({:.1}%), {} steps, {} ones left, {:?}",
        seq,
        chunk.len(),
        payload.len(),
        payload.len() as f64 * 100.0 / chunk.len().max(1) as f64,
        reduction.steps.len(),
        one_count,
        start.elapsed()
    );

    Ok(ChunkRecord {
        one_count: Some(one_count),
        payload,
        steps: reduction.steps,
    })
}
