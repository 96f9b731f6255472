//!
//! This is the interactive shell of the Eigen object model.
//!
#![warn(missing_docs)]

use std::fs::File;
use std::io;
use std::io::BufReader;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
#[cfg(feature = "jemalloc")]
use jemallocator::Jemalloc;
use tracing_subscriber::EnvFilter;

mod shell;

use eigen_runtime::universe::Universe;

use crate::shell::Shell;

#[cfg(feature = "jemalloc")]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

#[derive(Debug, Clone, PartialEq, Parser)]
#[clap(about, author, version)]
struct Options {
    /// File of shell commands to run (reads from standard input otherwise).
    #[clap(name = "FILE")]
    file: Option<PathBuf>,

    /// Enable verbose output (`-v` for graph mutations, `-vv` for every dispatch step).
    #[clap(short = 'v', long, parse(from_occurrences))]
    verbose: u64,
}

fn main() -> anyhow::Result<()> {
    let opts: Options = Options::parse();

    let level = match opts.verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let mut shell = Shell::new(Universe::new());

    match opts.file {
        None => {
            let stdin = io::stdin();
            let stdin = stdin.lock();
            shell.run(stdin, true)?;
        }
        Some(path) => {
            let file = File::open(&path)
                .with_context(|| format!("could not open '{}'", path.display()))?;
            shell.run(BufReader::new(file), false)?;
        }
    }

    Ok(())
}
