//! The compression module ties the pieces together into the xorro pipeline.
//!
//! Compression happens in the following steps for each chunk of the input:
//! - Bit plane: Spread the chunk's bytes into bits, most significant bit first.
//! - Density reduction: Complement the chunk if it is mostly ones, then XOR it with periodic
//!   prime patterns while that keeps increasing the number of zeros.
//! - Entropy coding: Compress the (now mostly zero) bits with the chosen backend.
//! - Container: Record the payload and the step log, in either container version.
//!
//! Decompression reads the container version from the first byte and follows the inverse
//! of the process, chunk by chunk: entropy decode, check the one-bit count when the
//! container has one, undo the steps in reverse order, pack the bits back into bytes.
//!
//! Chunks are independent of each other. All work is single threaded and in source order.

pub mod compress;
pub mod compress_chunk;
pub mod container;
pub mod decompress;
