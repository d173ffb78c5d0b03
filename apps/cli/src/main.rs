//! IntelScout CLI: company and catalog seed enrichment.
//!
//! Finds companies through a directory search or reads seed rows from a
//! file, enriches each seed from its remote detail page, and writes JSON,
//! CSV, and summary reports.

mod commands;
mod input;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
