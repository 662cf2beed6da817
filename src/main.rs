use clap::Parser;
use pairview::cli::{run, Cli};

fn main() -> std::process::ExitCode {
    run(Cli::parse())
}
