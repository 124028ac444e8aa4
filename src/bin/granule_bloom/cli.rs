use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// granule-bloom: build, inspect and probe bloom filter index segments
#[derive(Parser, Debug)]
#[command(name = "granule-bloom", version, about = "Per-granule bloom filter index tool")]
pub struct Cli {
    #[command(subcommand)]
    pub cmd: Cmd,
}

impl Cli {
    pub fn parse_args() -> Self {
        <Self as Parser>::parse()
    }
}

#[derive(Subcommand, Debug)]
pub enum Cmd {
    /// Build a segment file from JSON rows
    ///
    /// Input is an array of granules, each an array of columns, each an array of scalars:
    /// [
    ///   [[1, 2, 3], ["a", "b", "c"]],
    ///   [[4, 5],    ["d", "e"]]
    /// ]
    Build {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        out: PathBuf,
        /// Overrides GBF_BITS_PER_ROW (default 8)
        #[arg(long)]
        bits_per_row: Option<u64>,
        /// Overrides GBF_HASH_FUNCTIONS (default 4)
        #[arg(long)]
        hash_functions: Option<usize>,
    },
    /// Print the segment header and per-granule filter stats
    Inspect {
        #[arg(long)]
        path: PathBuf,
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Check which granules may contain a value in a column
    Probe {
        #[arg(long)]
        path: PathBuf,
        #[arg(long)]
        column: usize,
        /// JSON scalar (42, -1, 1.5, "text"); anything else is taken as a string
        #[arg(long)]
        value: String,
        #[arg(long, default_value_t = false)]
        json: bool,
    },
}
