use clap::Parser;
use papertrade::cli::{Cli, run};

fn main() -> std::process::ExitCode {
    run(Cli::parse())
}
