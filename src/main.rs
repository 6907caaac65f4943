//Enable more cargo lint tests
#![warn(rust_2018_idioms)]

use std::{
    fs::File,
    io::{BufReader, BufWriter},
    process::exit,
};

use log::{error, info, LevelFilter};
use simplelog::{
    ColorChoice, CombinedLogger, Config, SharedLogger, TermLogger, TerminalMode, WriteLogger,
};

use xorro::{
    compress, decompress,
    tools::cli::{init_opts, Mode, XorOpts},
    PrimeTable, Summary,
};

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

/// Where verbose runs send their debug output.
const DEBUG_LOG: &str = "debug.log";

fn main() {
    let options = init_opts();
    init_logging(options.verbose);
    options.report();

    //----- Figure how what we need to do and go do it
    match run(&options) {
        Ok(summary) => {
            let verb = match options.op_mode {
                Mode::Compress => "Compressed",
                Mode::Decompress => "Decompressed",
            };
            println!(
                "{} {} ({} bytes) to {} ({} bytes, {:.1}%), {} chunks, {} steps",
                verb,
                options.source,
                summary.bytes_in,
                options.destination,
                summary.bytes_out,
                summary.ratio(),
                summary.chunks,
                summary.steps
            );
        }
        Err(e) => {
            let verb = match options.op_mode {
                Mode::Compress => "compressing",
                Mode::Decompress => "decompressing",
            };
            error!("{} failed: {}", verb, e);
            eprintln!("Error {} {}: {}", verb, options.source, e);
            exit(1);
        }
    }
    info!("Done.\n");
}

fn run(options: &XorOpts) -> xorro::Result<Summary> {
    let primes = PrimeTable::standard();
    let reader = BufReader::new(File::open(&options.source)?);
    let writer = BufWriter::new(File::create(&options.destination)?);
    match options.op_mode {
        Mode::Compress => compress(reader, writer, &primes, &options.encode),
        Mode::Decompress => decompress(reader, writer, &primes),
    }
}

/// Warnings and errors go to the terminal. Verbose runs also get a debug log file.
fn init_logging(verbose: bool) {
    let mut loggers: Vec<Box<dyn SharedLogger>> = vec![TermLogger::new(
        LevelFilter::Warn,
        Config::default(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    )];
    if verbose {
        match File::create(DEBUG_LOG) {
            Ok(file) => loggers.push(WriteLogger::new(
                LevelFilter::Debug,
                Config::default(),
                file,
            )),
            Err(e) => eprintln!("Cannot create {}: {}", DEBUG_LOG, e),
        }
    }
    if let Err(e) = CombinedLogger::init(loggers) {
        eprintln!("Logger setup failed: {}", e);
    }
}
