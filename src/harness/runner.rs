//! Harness runner
//!
//! Walks the scenario matrix strictly in order: for every selected
//! sub-scenario, start a server, run its four clients one after another,
//! then stop the server before the next one starts.

use std::time::Duration;

use crate::common::config::ResolvedCommands;
use crate::common::Result;

use super::diagnostics::{self, DiagnosticSink};
use super::plan::{ClientInvocation, Protocol, Scenario, Selection, SubScenario};
use super::process::{self, ServerHandle};
use super::readiness::Readiness;

/// Counts of what a run did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Server start/stop cycles
    pub servers: usize,
    /// Client invocations
    pub clients: usize,
}

/// Sequential harness driver
pub struct Runner<S> {
    commands: ResolvedCommands,
    readiness: Readiness,
    shutdown_grace: Duration,
    sink: S,
}

impl<S: DiagnosticSink> Runner<S> {
    pub fn new(
        commands: ResolvedCommands,
        readiness: Readiness,
        shutdown_grace: Duration,
        sink: S,
    ) -> Self {
        Self {
            commands,
            readiness,
            shutdown_grace,
            sink,
        }
    }

    /// Give back the diagnostic sink
    pub fn into_sink(self) -> S {
        self.sink
    }

    /// Announce and launch the server for `sub`, then wait for readiness
    pub async fn start_server(&mut self, sub: &SubScenario) -> Result<ServerHandle> {
        self.sink.emit(&diagnostics::server_line(sub))?;

        let mut server = ServerHandle::spawn(&self.commands.server, sub.init)?;
        tracing::info!(x = sub.x, s = sub.s, pid = ?server.pid(), "Server started");

        if let Err(e) = self.readiness.wait(&mut server).await {
            self.stop_server(server).await;
            return Err(e);
        }
        Ok(server)
    }

    /// Close the server's stdin and reap it; the exit status is only logged
    pub async fn stop_server(&self, server: ServerHandle) {
        let pid = server.pid();
        match server.stop(self.shutdown_grace).await {
            Some(status) => tracing::info!(?pid, %status, "Server stopped"),
            None => tracing::info!(?pid, "Server stopped"),
        }
    }

    /// Announce and run one client, returning its label
    pub async fn run_client(&mut self, client: &ClientInvocation) -> Result<String> {
        self.sink.emit(&diagnostics::client_line(client))?;

        let what = format!("{} client", client.protocol.tag());
        let status =
            process::run_client(self.client_command(client.protocol), &what, &client.command_text())
                .await?;

        tracing::debug!(
            x = client.x,
            s = client.s,
            c = client.c,
            protocol = client.protocol.tag(),
            %status,
            "Client finished"
        );
        Ok(client.protocol.label())
    }

    /// One server lifetime with its four clients
    pub async fn run_sub_scenario(&mut self, sub: &SubScenario) -> Result<RunSummary> {
        let server = self.start_server(sub).await?;
        let mut summary = RunSummary {
            servers: 1,
            clients: 0,
        };

        for client in sub.clients() {
            if let Err(e) = self.run_client(&client).await {
                self.stop_server(server).await;
                return Err(e);
            }
            summary.clients += 1;
        }

        self.stop_server(server).await;
        Ok(summary)
    }

    /// All six sub-scenarios of `scenario`
    pub async fn run_scenario(&mut self, scenario: &Scenario) -> Result<RunSummary> {
        self.run_selected(scenario, &Selection::all()).await
    }

    /// Everything in `selection`
    pub async fn run(&mut self, selection: &Selection) -> Result<RunSummary> {
        let mut total = RunSummary::default();
        for scenario in selection.scenarios() {
            let summary = self.run_selected(&scenario, selection).await?;
            total.servers += summary.servers;
            total.clients += summary.clients;
        }
        tracing::info!(
            servers = total.servers,
            clients = total.clients,
            "Harness run complete"
        );
        Ok(total)
    }

    async fn run_selected(
        &mut self,
        scenario: &Scenario,
        selection: &Selection,
    ) -> Result<RunSummary> {
        tracing::info!(x = scenario.x, init = scenario.init, "Running scenario");
        let mut total = RunSummary::default();
        for sub in selection.sub_scenarios(scenario) {
            let summary = self.run_sub_scenario(&sub).await?;
            total.servers += summary.servers;
            total.clients += summary.clients;
        }
        Ok(total)
    }

    fn client_command(&self, protocol: Protocol) -> &str {
        match protocol {
            Protocol::Sql => &self.commands.sql_client,
            Protocol::Mapi => &self.commands.mapi_client,
        }
    }
}
