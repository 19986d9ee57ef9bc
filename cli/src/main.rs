use std::process::ExitCode;

use certpin_cli::Cli;
use certpin_cli::run_main;
use clap::Parser;

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    run_main(cli)
}
