//! CLI command handling
//!
//! Dispatches CLI commands to the harness and formats output.

use std::path::{Path, PathBuf};
use std::time::Duration;

use colored::Colorize;

use crate::commands::{Commands, SelectionArgs};
use crate::common::config::{Config, MAPI_CLIENT_ENV, SERVER_ENV, SQL_CLIENT_ENV};
use crate::common::{Error, Result};
use crate::harness::{self, Readiness, Runner, Selection, StdStreams};

/// Dispatch a CLI command
pub async fn dispatch(command: Commands, config_path: Option<&Path>, verbose: bool) -> Result<()> {
    match command {
        Commands::Run {
            selection,
            ready_delay,
        } => {
            let selection = to_selection(selection)?;
            let config = Config::load(config_path)?;
            let commands = config.resolve_commands()?;

            let readiness = match ready_delay {
                Some(secs) => Readiness::Delay(Duration::from_secs(secs)),
                None => Readiness::from_config(&config.readiness)?,
            };

            let mut runner = Runner::new(
                commands,
                readiness,
                Duration::from_secs(config.shutdown.grace_secs),
                StdStreams,
            );
            let summary = runner.run(&selection).await?;

            // stderr is part of the compared output; keep it clean unless asked
            if verbose {
                eprintln!(
                    "\n{} {} server cycles, {} client invocations",
                    "Done:".green().bold(),
                    summary.servers,
                    summary.clients
                );
            }
            Ok(())
        }

        Commands::Plan { selection, json } => {
            let selection = to_selection(selection)?;
            let planned = harness::describe(&selection);

            if json {
                println!("{}", serde_json::to_string_pretty(&planned)?);
                return Ok(());
            }

            for server in &planned {
                println!("{}", server.diagnostic.bold());
                for client in &server.clients {
                    println!("  {}", client.diagnostic);
                    println!("    {} {}", "stdin:".dimmed(), client.command.trim_end());
                }
            }
            Ok(())
        }

        Commands::Check => {
            let config = Config::load(config_path)?;
            let report = check_commands(&config, |var| std::env::var(var).ok());

            for entry in &report {
                match &entry.status {
                    CheckStatus::Found { program, path } => println!(
                        "{} {}: {} ({})",
                        "✓".green(),
                        entry.var,
                        program,
                        path.display().to_string().dimmed()
                    ),
                    CheckStatus::NotFound { program } => {
                        println!("{} {}: '{}' not found", "✗".red(), entry.var, program)
                    }
                    CheckStatus::NotConfigured => {
                        println!("{} {}: not configured", "✗".red(), entry.var)
                    }
                }
            }

            let missing = report.iter().filter(|e| !e.status.is_found()).count();
            if missing > 0 {
                return Err(Error::Config(format!(
                    "{missing} of {} commands unavailable",
                    report.len()
                )));
            }
            Ok(())
        }
    }
}

/// Outcome of looking up one configured command
#[derive(Debug, PartialEq, Eq)]
pub enum CheckStatus {
    Found { program: String, path: PathBuf },
    NotFound { program: String },
    NotConfigured,
}

impl CheckStatus {
    pub fn is_found(&self) -> bool {
        matches!(self, CheckStatus::Found { .. })
    }
}

#[derive(Debug)]
pub struct CheckEntry {
    pub var: &'static str,
    pub status: CheckStatus,
}

/// Resolve each command and look up its program on PATH
pub fn check_commands<F>(config: &Config, lookup: F) -> Vec<CheckEntry>
where
    F: Fn(&str) -> Option<String>,
{
    [SERVER_ENV, SQL_CLIENT_ENV, MAPI_CLIENT_ENV]
        .into_iter()
        .map(|var| {
            let command = config.command_for(var, &lookup);
            let status = match command.as_deref().and_then(program_of) {
                None => CheckStatus::NotConfigured,
                Some(program) => match which::which(program) {
                    Ok(path) => CheckStatus::Found {
                        program: program.to_string(),
                        path,
                    },
                    Err(_) => CheckStatus::NotFound {
                        program: program.to_string(),
                    },
                },
            };
            CheckEntry { var, status }
        })
        .collect()
}

fn to_selection(args: SelectionArgs) -> Result<Selection> {
    Selection::new(args.scenario, args.sub)
}

/// First word of a shell command line
fn program_of(command_line: &str) -> Option<&str> {
    command_line.split_whitespace().next()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_program_of() {
        assert_eq!(program_of("mserver5 --dbfarm /tmp/x"), Some("mserver5"));
        assert_eq!(program_of("  mclient -lsql"), Some("mclient"));
        assert_eq!(program_of("   "), None);
    }

    #[test]
    fn test_selection_out_of_range_is_rejected() {
        let args = SelectionArgs {
            scenario: Some(9),
            sub: None,
        };
        assert!(matches!(to_selection(args), Err(Error::InvalidSelection(_))));
    }

    #[test]
    fn test_check_reports_each_command() {
        let config = Config::from_toml_str("[commands]\nmapi_client = \"   \"\n").unwrap();
        let report = check_commands(&config, |var| match var {
            SERVER_ENV => Some("sh -c 'cat > /dev/null'".to_string()),
            SQL_CLIENT_ENV => Some("/nonexistent/mclient -lsql".to_string()),
            _ => None,
        });

        let vars: Vec<_> = report.iter().map(|e| e.var).collect();
        assert_eq!(vars, vec![SERVER_ENV, SQL_CLIENT_ENV, MAPI_CLIENT_ENV]);

        assert!(
            matches!(&report[0].status, CheckStatus::Found { program, .. } if program == "sh")
        );
        assert_eq!(
            report[1].status,
            CheckStatus::NotFound {
                program: "/nonexistent/mclient".to_string()
            }
        );
        assert_eq!(report[2].status, CheckStatus::NotConfigured);
    }

    #[tokio::test]
    async fn test_plan_does_not_need_commands() {
        let args = SelectionArgs {
            scenario: Some(1),
            sub: Some(1),
        };
        dispatch(Commands::Plan { selection: args, json: true }, None, false)
            .await
            .unwrap();
    }
}
