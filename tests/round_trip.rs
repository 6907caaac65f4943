use num_traits::ToPrimitive;
use xorro::compression::container::{ChunkRecord, Container, CHUNK_SENTINEL, SECTION_SENTINEL};
use xorro::reduction::steps::{CompressionStep, StepLog};
use xorro::tools::combinadic::{binomial, rank, unrank};
use xorro::{decode, encode, Backend, EncodeOptions, Error, FormatVersion, PrimeTable};

const FORMATS: [FormatVersion; 2] = [FormatVersion::Streaming, FormatVersion::Delimited];

/// Deterministic mix of text-like runs and noise.
fn sample_data(len: usize) -> Vec<u8> {
    let mut state = 0x2545_f491_u32;
    (0..len)
        .map(|i| {
            state = state.wrapping_mul(1_103_515_245).wrapping_add(12_345);
            if (i / 64) % 3 == 0 {
                b"xorro "[i % 6]
            } else {
                (state >> 16) as u8
            }
        })
        .collect()
}

fn options(backend: Backend, format: FormatVersion) -> EncodeOptions {
    EncodeOptions {
        backend,
        format,
        ..EncodeOptions::default()
    }
}

#[test]
fn every_size_backend_and_format_round_trips() {
    let primes = PrimeTable::standard();
    for len in [0, 1, 1023, 1024, 1025, 2048, 3000] {
        let data = sample_data(len);
        for backend in Backend::ALL {
            for format in FORMATS {
                let packed = encode(&data, &primes, &options(backend, format)).unwrap();
                assert_eq!(
                    decode(&packed, &primes).unwrap(),
                    data,
                    "len {} with {} / {}",
                    len,
                    backend,
                    format
                );
            }
        }
    }
}

#[test]
fn zero_bytes_need_no_negate_and_shrink() {
    let primes = PrimeTable::standard();
    let data = vec![0_u8; 2048];
    let packed = encode(&data, &primes, &EncodeOptions::default()).unwrap();
    assert!(packed.len() < 2048);

    let container = Container::decode(&packed, &primes).unwrap();
    assert_eq!(container.chunks.len(), 2);
    assert!(container
        .chunks
        .iter()
        .all(|c| !c.steps.negates() && c.one_count == Some(0)));
    assert_eq!(decode(&packed, &primes).unwrap(), data);
}

#[test]
fn alternating_bytes_round_trip_under_every_backend() {
    let primes = PrimeTable::standard();
    let data: Vec<u8> = (0..10).map(|i| if i % 2 == 0 { 0xff } else { 0x00 }).collect();
    for backend in Backend::ALL {
        for format in FORMATS {
            let packed = encode(&data, &primes, &options(backend, format)).unwrap();
            assert_eq!(decode(&packed, &primes).unwrap(), data, "{}", backend);
        }
    }
}

#[test]
fn small_chunks_and_prime_limits_round_trip() {
    let primes = PrimeTable::standard();
    let data = sample_data(777);
    for (chunk_size, primes_per_chunk) in [(1, 0), (7, 3), (100, 50), (65536, 1)] {
        let opts = EncodeOptions {
            chunk_size,
            primes_per_chunk,
            ..EncodeOptions::default()
        };
        let packed = encode(&data, &primes, &opts).unwrap();
        assert_eq!(decode(&packed, &primes).unwrap(), data);
    }
}

#[test]
fn truncated_final_record_is_a_format_error() {
    let primes = PrimeTable::standard();
    let data = sample_data(2500);
    let packed = encode(&data, &primes, &EncodeOptions::default()).unwrap();
    for cut in [1, 2, 3, 7, 20] {
        let truncated = &packed[..packed.len() - cut];
        assert!(
            matches!(decode(truncated, &primes), Err(Error::Format(_))),
            "accepted a container missing {} bytes",
            cut
        );
    }
}

#[test]
fn corrupt_payload_is_caught() {
    let primes = PrimeTable::standard();
    let data = sample_data(1024);
    let opts = options(Backend::Passthrough, FormatVersion::Streaming);
    let mut packed = encode(&data, &primes, &opts).unwrap();
    // Header (5), one-bit count (4), payload length (4), tag (1), bit length (4)
    packed[18] ^= 0x01;
    assert!(matches!(decode(&packed, &primes), Err(Error::Arithmetic(_))));
}

#[test]
fn delimited_sentinel_in_payload_is_rejected() {
    let primes = PrimeTable::standard();

    // The writer refuses to produce it
    let mut payload = vec![0];
    payload.extend_from_slice(&SECTION_SENTINEL);
    let container = Container {
        version: FormatVersion::Delimited,
        original_len: 1,
        chunks: vec![ChunkRecord {
            one_count: None,
            payload: payload.clone(),
            steps: StepLog::new(),
        }],
    };
    assert!(matches!(container.encode(&primes), Err(Error::Format(_))));

    // And a hand-made one does not decode into the wrong bytes
    let mut crafted = vec![1, 1, 0, 0, 0];
    crafted.extend_from_slice(&(payload.len() as u32).to_le_bytes());
    crafted.extend_from_slice(&payload);
    crafted.extend_from_slice(&SECTION_SENTINEL);
    crafted.extend_from_slice(&[0, 0]);
    crafted.extend_from_slice(&CHUNK_SENTINEL);
    assert!(matches!(decode(&crafted, &primes), Err(Error::Format(_))));
}

#[test]
fn oversized_sparse_chunk_is_refused() {
    let primes = PrimeTable::standard();
    // Sparse tag, combinadic sub-mode, n = 2^22, k = 2^21, rank 0
    let mut payload = vec![Backend::AdaptiveSparse.tag(), 2];
    payload.extend_from_slice(&[0x80, 0x80, 0x80, 0x02, 0x80, 0x80, 0x80, 0x01, 0]);
    let container = Container {
        version: FormatVersion::Streaming,
        original_len: 1 << 19,
        chunks: vec![ChunkRecord {
            one_count: Some(1 << 21),
            payload,
            steps: StepLog::new(),
        }],
    };
    let packed = container.encode(&primes).unwrap();
    assert!(matches!(decode(&packed, &primes), Err(Error::Format(_))));
}

#[test]
fn delimited_step_logs_survive() {
    let primes = PrimeTable::standard();
    let data: Vec<u8> = (0..1024_u32).map(|i| if i % 5 == 0 { 0x00 } else { 0xff }).collect();
    let opts = options(Backend::AdaptiveSparse, FormatVersion::Delimited);
    let packed = encode(&data, &primes, &opts).unwrap();
    let container = Container::decode(&packed, &primes).unwrap();
    assert_eq!(container.chunks[0].steps.steps()[0], CompressionStep::Negate);
    assert_eq!(decode(&packed, &primes).unwrap(), data);
}

#[test]
fn unknown_version_is_rejected() {
    let primes = PrimeTable::standard();
    assert!(matches!(decode(&[9, 0, 0, 0, 0], &primes), Err(Error::Format(_))));
    assert!(matches!(decode(&[], &primes), Err(Error::Format(_))));
}

#[test]
fn combinadic_is_a_bijection_up_to_twenty() {
    const N: usize = 20;
    let mut seen: Vec<Vec<bool>> = (0..=N)
        .map(|k| vec![false; binomial(N, k).to_usize().unwrap()])
        .collect();
    for mask in 0_u32..(1 << N) {
        let positions: Vec<usize> = (0..N).filter(|&i| mask >> i & 1 == 1).collect();
        let k = positions.len();
        let r = rank(&positions).unwrap();

        // A set whose top position is p ranks in [C(p, k), C(p + 1, k)), so the subsets
        // of every smaller [0, n) fill [0, C(n, k)) as well
        if let Some(&top) = positions.last() {
            assert!(r >= binomial(top, k) && r < binomial(top + 1, k));
        }

        let idx = r.to_usize().unwrap();
        assert!(!seen[k][idx], "rank {} repeats for k = {}", idx, k);
        seen[k][idx] = true;

        let mut back = unrank(N, k, &r).unwrap();
        back.reverse();
        assert_eq!(back, positions);
    }
    assert!(seen.iter().all(|ranks| ranks.iter().all(|&s| s)));

    for n in 13..=N {
        for k in 0..=n {
            assert!(matches!(
                unrank(n, k, &binomial(n, k)),
                Err(Error::Arithmetic(_))
            ));
        }
    }
}
