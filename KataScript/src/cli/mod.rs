//! KataScript CLI - dump and inject script text from the command line

pub mod commands;

use clap::Parser;
use commands::Commands;

#[derive(Parser)]
#[command(name = "katascript")]
#[command(version, about = "KataScript: text dump/inject tools for Katakoi bytecode scripts", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Run the KataScript CLI
pub fn run_cli() -> anyhow::Result<()> {
    // Setup logging
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    cli.command.execute()?;

    Ok(())
}
