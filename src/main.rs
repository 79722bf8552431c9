//! mserver-harness - multi-server startup ordering smoke test
//!
//! Starts a server with each of four initialization orderings and drives
//! SQL and MAPI clients against it in six fixed interleavings.

use std::path::PathBuf;

use clap::Parser;
use mserver_harness::{cli, commands::Commands, common::logging};

#[derive(Parser)]
#[command(name = "mserver-harness", about = "Multi-server startup ordering smoke harness")]
#[command(version, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Config file (default: the platform config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Debug-level logging for this crate
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    logging::init_cli(cli.verbose);

    let command = cli.command.unwrap_or_default();
    if let Err(e) = cli::dispatch(command, cli.config.as_deref(), cli.verbose).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
