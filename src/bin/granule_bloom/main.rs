use anyhow::Result;
use env_logger::{Builder, Env};

mod cli;
mod util;
mod cmd_build;
mod cmd_inspect;
mod cmd_probe;

fn init_logger() {
    // RUST_LOG overrides, default is info.
    Builder::from_env(Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();
}

fn main() {
    init_logger();

    if let Err(e) = run() {
        eprintln!("error: {:#}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = cli::Cli::parse_args();
    match cli.cmd {
        cli::Cmd::Build { input, out, bits_per_row, hash_functions } =>
            cmd_build::exec(input, out, bits_per_row, hash_functions),

        cli::Cmd::Inspect { path, json } =>
            cmd_inspect::exec(path, json),

        cli::Cmd::Probe { path, column, value, json } =>
            cmd_probe::exec(path, column, value, json),
    }
}
