//! The bitstream module forms the bit-level I/O subsystem for xorro.
//!
//! Everything xorro stores is ultimately a sequence of bits: the chunk data itself after
//! it has been spread into a bit plane, the step logs with their 11 bit prime indices, and
//! the prefix tree with its codeword stream.
//!
//! - bitplane: Convert byte blocks to and from bit sequences (MSB first).
//! - bitpacker: Pack variable width fields into bytes.
//! - bitreader: Read variable width fields back out of a byte slice, never past its end.
//! - bytereader: Read whole-byte fields (little endian integers, varints, slices).
//!
pub mod bitpacker;
pub mod bitplane;
pub mod bitreader;
pub mod bytereader;
