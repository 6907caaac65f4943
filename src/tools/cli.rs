use std::{fmt::Display, fmt::Formatter};

use clap::Parser;
use log::info;

use crate::compression::{compress::EncodeOptions, container::FormatVersion};
use crate::entropy::Backend;

/// Compress or Decompress
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Compress,
    Decompress,
}
impl Display for Mode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Define all user settable options to control program behavior
#[derive(Debug, Clone)]
pub struct XorOpts {
    /// Compress/Decompress
    pub op_mode: Mode,
    /// File to read
    pub source: String,
    /// File to write
    pub destination: String,
    /// Also log debug output to debug.log
    pub verbose: bool,
    /// Encoder settings, ignored when decompressing
    pub encode: EncodeOptions,
}

/// Command Line Interpretation - uses external CLAP crate.
#[derive(Parser, Debug)]
#[clap(
    version,
    about = "Bit-level compressor built on prime-period XOR density reduction",
    long_about = "
    xorro splits its input into chunks, turns each chunk into bits, and searches for a short
    list of reversible transforms (a complement and XORs with periodic prime patterns) that
    leaves the bits mostly zero. The reduced bits are then entropy coded and stored, with
    the transforms needed to undo them, in a versioned container."
)]
pub struct Args {
    /// File to read
    #[clap()]
    source: String,

    /// File to write
    #[clap()]
    destination: String,

    /// Compress the source (the default)
    #[clap(short = 'c', long = "compress", conflicts_with = "decompress")]
    compress: bool,

    /// Decompress the source
    #[clap(short = 'd', long = "decompress")]
    decompress: bool,

    /// Write debug output to debug.log
    #[clap(short = 'v', long = "verbose")]
    verbose: bool,

    /// Primes tested per reduction round, 0 tests the whole table
    #[clap(short = 'p', long = "primes", default_value_t = 0)]
    primes: usize,

    /// Entropy backend: passthrough, deflate, prefix-tree, run-length or sparse
    #[clap(long, default_value = "deflate")]
    backend: Backend,

    /// Container format: streaming or delimited
    #[clap(long, default_value = "streaming")]
    format: FormatVersion,

    /// Source bytes per chunk, 1-65536
    #[clap(long = "chunk-size", default_value_t = 1024)]
    chunk_size: usize,
}

impl From<Args> for XorOpts {
    fn from(args: Args) -> Self {
        Self {
            op_mode: if args.decompress {
                Mode::Decompress
            } else {
                Mode::Compress
            },
            source: args.source,
            destination: args.destination,
            verbose: args.verbose,
            encode: EncodeOptions {
                chunk_size: args.chunk_size,
                primes_per_chunk: args.primes,
                backend: args.backend,
                format: args.format,
            },
        }
    }
}

/// Parse the command line into our internal structure.
pub fn init_opts() -> XorOpts {
    XorOpts::from(Args::parse())
}

impl XorOpts {
    /// Log the settings. Call once the logger is installed.
    pub fn report(&self) {
        info!("---- xorro Initialization Start ----",);
        info!("Operational mode set to {}", self.op_mode);
        info!("Reading {}, writing {}", self.source, self.destination);
        if self.op_mode == Mode::Compress {
            info!("Chunk size set to {}", self.encode.chunk_size);
            match self.encode.primes_per_chunk {
                0 => info!("Testing the whole prime table each round"),
                n => info!("Testing the first {} primes each round", n),
            }
            info!("Backend set to {}", self.encode.backend);
            info!("Format set to {}", self.encode.format);
        }
        info!("---- xorro Initialization End ----\n");
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn parse(args: &[&str]) -> Result<XorOpts, clap::Error> {
        Args::try_parse_from(args).map(XorOpts::from)
    }

    #[test]
    fn defaults_test() {
        let opts = parse(&["xorro", "in.txt", "out.xor"]).unwrap();
        assert_eq!(opts.op_mode, Mode::Compress);
        assert_eq!(opts.source, "in.txt");
        assert_eq!(opts.destination, "out.xor");
        assert!(!opts.verbose);
        assert_eq!(opts.encode, EncodeOptions::default());
    }

    #[test]
    fn flags_test() {
        let opts = parse(&[
            "xorro",
            "-d",
            "-v",
            "-p",
            "64",
            "--backend",
            "rle",
            "--format",
            "delimited",
            "--chunk-size",
            "4096",
            "in.xor",
            "out.txt",
        ])
        .unwrap();
        assert_eq!(opts.op_mode, Mode::Decompress);
        assert!(opts.verbose);
        assert_eq!(opts.encode.primes_per_chunk, 64);
        assert_eq!(opts.encode.backend, Backend::RunLength);
        assert_eq!(opts.encode.format, FormatVersion::Delimited);
        assert_eq!(opts.encode.chunk_size, 4096);
    }

    #[test]
    fn bad_arguments_are_rejected() {
        assert!(parse(&["xorro", "-c", "-d", "a", "b"]).is_err());
        assert!(parse(&["xorro", "--backend", "lzma", "a", "b"]).is_err());
        assert!(parse(&["xorro", "a"]).is_err());
    }
}
