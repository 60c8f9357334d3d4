use clap::Parser;
use metar_store::cli::{run, Cli};
use std::process::ExitCode;

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    Ok(run(cli)?)
}
