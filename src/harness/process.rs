//! Server and client processes
//!
//! Commands are shell command lines run through `sh -c`, so a configured
//! command may carry its own arguments. The harness only ever talks to a
//! child through its stdin; stdout and stderr are inherited.

use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio::process::{Child, ChildStdin, Command};

use crate::common::{Error, Result};

/// Flag carrying the initialization string on the server command line
pub const DBINIT_FLAG: &str = "--dbinit";

/// Build a `sh -c` command for a configured command line
pub fn shell_command(command_line: &str) -> Command {
    let mut cmd = Command::new("sh");
    cmd.arg("-c").arg(command_line);
    cmd
}

/// Build the server command: `<server> --dbinit <init>`
///
/// The flag and init string are passed as positional parameters so the shell
/// never re-parses the init string. `server` may be any shell command line
/// (`VAR=x mserver5`, `cd farm && mserver5`); on Unix it runs in its own
/// process group so the whole group can be killed on teardown.
pub fn server_command(server: &str, init: &str) -> Command {
    let mut cmd = shell_command(&format!("{server} \"$@\""));
    cmd.arg("sh").arg(DBINIT_FLAG).arg(init);
    #[cfg(unix)]
    cmd.process_group(0);
    cmd
}

/// A running server
///
/// Dropping the handle closes the server's stdin, which is the server's
/// signal to shut down. [`ServerHandle::stop`] also reaps the process.
#[derive(Debug)]
pub struct ServerHandle {
    child: Child,
    stdin: Option<ChildStdin>,
    pid: Option<u32>,
}

impl ServerHandle {
    /// Launch the server with its stdin piped
    pub fn spawn(server: &str, init: &str) -> Result<Self> {
        let mut child = server_command(server, init)
            .stdin(Stdio::piped())
            .spawn()
            .map_err(|e| Error::spawn_failed("server", e))?;

        let stdin = child.stdin.take();
        let pid = child.id();
        tracing::debug!(?pid, "Server launched");

        Ok(Self { child, stdin, pid })
    }

    /// OS process id of the server's shell, also its process group id on Unix
    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    /// Exit status if the server has already exited
    pub fn try_exited(&mut self) -> Option<ExitStatus> {
        self.child.try_wait().ok().flatten()
    }

    /// Close stdin and wait up to `grace` for the server to exit
    ///
    /// A server still running after `grace` is killed. The exit status is
    /// returned for logging only.
    pub async fn stop(mut self, grace: Duration) -> Option<ExitStatus> {
        drop(self.stdin.take());

        match tokio::time::timeout(grace, self.child.wait()).await {
            Ok(Ok(status)) => Some(status),
            Ok(Err(e)) => {
                tracing::warn!(pid = ?self.pid, error = %e, "Failed to wait for server");
                None
            }
            Err(_) => {
                tracing::warn!(
                    pid = ?self.pid,
                    grace_secs = grace.as_secs(),
                    "Server still running after stdin was closed, killing it"
                );
                self.kill_group();
                if let Err(e) = self.child.kill().await {
                    tracing::warn!(pid = ?self.pid, error = %e, "Failed to kill server");
                }
                self.child.try_wait().ok().flatten()
            }
        }
    }

    /// SIGKILL every process in the server's group
    #[cfg(unix)]
    fn kill_group(&self) {
        if let Some(pid) = self.pid {
            // Negative pid addresses the process group
            let result = unsafe { libc::kill(-(pid as i32), libc::SIGKILL) };
            if result != 0 {
                tracing::debug!(pid, "Server process group already gone");
            }
        }
    }

    #[cfg(not(unix))]
    fn kill_group(&self) {}
}

impl Drop for ServerHandle {
    fn drop(&mut self) {
        if self.stdin.take().is_some() {
            tracing::debug!(pid = ?self.pid, "Server handle dropped, stdin closed");
        }
    }
}

/// Run a client: write `text` to its stdin, close it, wait for exit
///
/// A client that exits before reading its input is not an error; the
/// broken pipe is logged and the client is still waited for.
pub async fn run_client(command_line: &str, what: &str, text: &str) -> Result<ExitStatus> {
    let mut child = shell_command(command_line)
        .stdin(Stdio::piped())
        .spawn()
        .map_err(|e| Error::spawn_failed(what, e))?;

    if let Some(mut stdin) = child.stdin.take() {
        if let Err(e) = stdin.write_all(text.as_bytes()).await {
            tracing::warn!(client = what, error = %e, "Failed to write command to client");
        }
        // stdin is dropped here, closing the pipe
    }

    Ok(child.wait().await?)
}
