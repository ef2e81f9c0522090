mod alignment;
mod cli;
mod config;
mod gene;
mod junction;
mod process;
mod report;
mod shape;

#[macro_use]
extern crate log;
#[macro_use]
extern crate anyhow;

use anyhow::Context;

fn main() -> anyhow::Result<()> {
    let cfg = cli::handle_cli().with_context(|| "Error processing command line arguments")?;
    process::run(&cfg)
}
