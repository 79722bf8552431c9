//! Server readiness
//!
//! The harness has no protocol of its own to ask a server whether it is
//! up. By default it sleeps a fixed delay; alternatively it polls a probe
//! command until that command succeeds.

use std::process::Stdio;
use std::time::{Duration, Instant};

use crate::common::config::{ReadinessConfig, ReadinessMode};
use crate::common::{Error, Result};

use super::process::{shell_command, ServerHandle};

/// How to wait for a freshly launched server
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Readiness {
    /// Sleep for a fixed duration
    Delay(Duration),
    /// Run `command` every `interval` until it exits 0, for at most `timeout`
    Probe {
        command: String,
        interval: Duration,
        timeout: Duration,
    },
}

impl Default for Readiness {
    fn default() -> Self {
        Readiness::Delay(Duration::from_secs(
            ReadinessConfig::default().ready_delay_secs,
        ))
    }
}

impl Readiness {
    /// Build the strategy from the `[readiness]` config table
    pub fn from_config(config: &ReadinessConfig) -> Result<Self> {
        match config.mode {
            ReadinessMode::Delay => Ok(Readiness::Delay(Duration::from_secs(
                config.ready_delay_secs,
            ))),
            ReadinessMode::Probe => {
                let command = config
                    .probe
                    .clone()
                    .filter(|p| !p.trim().is_empty())
                    .ok_or_else(|| {
                        Error::Config(
                            "readiness mode 'probe' requires a 'probe' command".to_string(),
                        )
                    })?;
                Ok(Readiness::Probe {
                    command,
                    interval: Duration::from_millis(config.probe_interval_ms),
                    timeout: Duration::from_secs(config.probe_timeout_secs),
                })
            }
        }
    }

    /// Wait until `server` is considered ready
    ///
    /// A server that has already exited is logged and treated as ready; what
    /// happens next is the clients' problem, not the harness's.
    pub async fn wait(&self, server: &mut ServerHandle) -> Result<()> {
        match self {
            Readiness::Delay(delay) => {
                tokio::time::sleep(*delay).await;
                warn_if_exited(server);
                Ok(())
            }
            Readiness::Probe {
                command,
                interval,
                timeout,
            } => probe(command, *interval, *timeout, server).await,
        }
    }
}

async fn probe(
    command: &str,
    interval: Duration,
    timeout: Duration,
    server: &mut ServerHandle,
) -> Result<()> {
    let deadline = Instant::now() + timeout;
    let mut attempts = 0u32;

    loop {
        if warn_if_exited(server) {
            return Ok(());
        }

        attempts += 1;
        let mut child = shell_command(command)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| Error::spawn_failed("readiness probe", e))?;

        let remaining = deadline.saturating_duration_since(Instant::now());
        match tokio::time::timeout(remaining, child.wait()).await {
            Ok(Ok(status)) if status.success() => {
                tracing::debug!(attempts, "Server ready");
                return Ok(());
            }
            Ok(Ok(_)) => {}
            Ok(Err(e)) => return Err(e.into()),
            Err(_) => {
                tracing::debug!(attempts, "Readiness command still running at deadline, killing it");
                let _ = child.kill().await;
                return Err(Error::ServerNotReady(timeout.as_secs()));
            }
        }

        if Instant::now() >= deadline {
            return Err(Error::ServerNotReady(timeout.as_secs()));
        }

        tokio::time::sleep(interval).await;
    }
}

fn warn_if_exited(server: &mut ServerHandle) -> bool {
    match server.try_exited() {
        Some(status) => {
            tracing::warn!(pid = ?server.pid(), %status, "Server exited before becoming ready");
            true
        }
        None => false,
    }
}
