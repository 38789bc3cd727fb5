//! skinscan CLI: upload a face photo, run a remote skin analysis, and print
//! the normalized report.

mod commands;
mod report;

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
