//! CLI command definitions
//!
//! Defines the clap commands for the harness CLI.

use clap::{Args, Subcommand};

#[derive(Subcommand)]
pub enum Commands {
    /// Run the harness (the default when no command is given)
    Run {
        #[command(flatten)]
        selection: SelectionArgs,

        /// Seconds to wait after starting each server, overriding the config file
        #[arg(long)]
        ready_delay: Option<u64>,
    },

    /// Print what a run would do without starting any process
    Plan {
        #[command(flatten)]
        selection: SelectionArgs,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check that the server and client commands can be found
    Check,
}

impl Default for Commands {
    fn default() -> Self {
        Commands::Run {
            selection: SelectionArgs::default(),
            ready_delay: None,
        }
    }
}

/// Restrict a run to part of the scenario matrix
#[derive(Args, Debug, Default, Clone, Copy)]
pub struct SelectionArgs {
    /// Only run scenario X (1-4)
    #[arg(long, short = 'x')]
    pub scenario: Option<u8>,

    /// Only run sub-scenario S (1-6) of each selected scenario
    #[arg(long, short = 's')]
    pub sub: Option<u8>,
}
