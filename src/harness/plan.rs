//! Scenario matrix
//!
//! Four server initialization orderings, each exercised by six literal
//! client protocol orderings of four clients.

use serde::Serialize;

use crate::common::config::{MAPI_CLIENT_ENV, SQL_CLIENT_ENV};
use crate::common::{Error, Result};

use super::diagnostics;

/// Client front-end used for one invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Protocol {
    /// SQL front-end
    Sql,
    /// MAPI wire-protocol front-end
    Mapi,
}

impl Protocol {
    /// Tag used in diagnostics
    pub fn tag(self) -> &'static str {
        match self {
            Protocol::Sql => "SQL",
            Protocol::Mapi => "MAPI",
        }
    }

    /// Environment variable naming this protocol's client command
    pub fn env_var(self) -> &'static str {
        match self {
            Protocol::Sql => SQL_CLIENT_ENV,
            Protocol::Mapi => MAPI_CLIENT_ENV,
        }
    }

    /// Command text fed to the client on stdin
    pub fn command_text(self, x: u8, s: u8, c: u8) -> String {
        match self {
            Protocol::Sql => format!("select {x}{s}{c} ;\n"),
            Protocol::Mapi => format!("print({x}{s}{c});\n"),
        }
    }

    /// Label a client hands back to its caller
    pub fn label(self) -> String {
        format!("({}) ", self.tag())
    }
}

use Protocol::{Mapi, Sql};

/// Number of scenarios
pub const SCENARIO_COUNT: u8 = 4;

/// Number of sub-scenarios per scenario
pub const SUB_SCENARIO_COUNT: u8 = 6;

/// Number of clients run against every server
pub const CLIENTS_PER_SERVER: usize = 4;

/// Server initialization strings, indexed by scenario `x - 1`
pub static INIT_STRINGS: [&str; SCENARIO_COUNT as usize] = [
    "module(mapi);module(sql_server); mapi_start(); sql_server_start();",
    "module(mapi);module(sql_server); sql_server_start(); mapi_start();",
    "module(sql_server);module(mapi); mapi_start(); sql_server_start();",
    "module(sql_server);module(mapi); sql_server_start(); mapi_start();",
];

/// Client protocol orderings, indexed by sub-scenario `s - 1`
pub static ORDERINGS: [[Protocol; CLIENTS_PER_SERVER]; SUB_SCENARIO_COUNT as usize] = [
    [Sql, Sql, Mapi, Mapi],
    [Sql, Mapi, Sql, Mapi],
    [Mapi, Sql, Sql, Mapi],
    [Sql, Mapi, Mapi, Sql],
    [Mapi, Sql, Mapi, Sql],
    [Mapi, Mapi, Sql, Sql],
];

/// One server initialization ordering
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Scenario {
    pub x: u8,
    pub init: &'static str,
}

impl Scenario {
    /// Look up scenario `x` (1-based)
    pub fn get(x: u8) -> Option<Self> {
        let init = *INIT_STRINGS.get(usize::from(x).checked_sub(1)?)?;
        Some(Self { x, init })
    }

    /// All scenarios in order
    pub fn all() -> impl Iterator<Item = Scenario> {
        (1..=SCENARIO_COUNT).filter_map(Scenario::get)
    }

    /// Sub-scenario `s` (1-based) of this scenario
    pub fn sub_scenario(&self, s: u8) -> Option<SubScenario> {
        let ordering = ORDERINGS.get(usize::from(s).checked_sub(1)?)?;
        Some(SubScenario {
            x: self.x,
            s,
            init: self.init,
            ordering,
        })
    }

    /// All six sub-scenarios in order
    pub fn sub_scenarios(&self) -> impl Iterator<Item = SubScenario> {
        let scenario = *self;
        (1..=SUB_SCENARIO_COUNT).filter_map(move |s| scenario.sub_scenario(s))
    }
}

/// One server lifetime with its four clients
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubScenario {
    pub x: u8,
    pub s: u8,
    pub init: &'static str,
    ordering: &'static [Protocol; CLIENTS_PER_SERVER],
}

impl SubScenario {
    /// The four client invocations, `c` = 1..4
    pub fn clients(&self) -> impl Iterator<Item = ClientInvocation> {
        let SubScenario { x, s, init, ordering } = *self;
        ordering
            .iter()
            .enumerate()
            .map(move |(i, &protocol)| ClientInvocation {
                x,
                s,
                c: i as u8 + 1,
                init,
                protocol,
                preceding: &ordering[..i],
            })
    }

    /// Protocol ordering of this sub-scenario
    pub fn ordering(&self) -> &'static [Protocol] {
        self.ordering
    }
}

/// One client run against the current server
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientInvocation {
    pub x: u8,
    pub s: u8,
    pub c: u8,
    pub init: &'static str,
    pub protocol: Protocol,
    preceding: &'static [Protocol],
}

impl ClientInvocation {
    /// Command text for this client
    pub fn command_text(&self) -> String {
        self.protocol.command_text(self.x, self.s, self.c)
    }

    /// Labels of the clients that ran before this one on the same server
    pub fn history(&self) -> String {
        self.preceding.iter().map(|p| p.label()).collect()
    }
}

/// Which part of the matrix to run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Selection {
    scenario: Option<u8>,
    sub: Option<u8>,
}

impl Selection {
    /// The whole matrix
    pub fn all() -> Self {
        Self::default()
    }

    /// Restrict to scenario `x` and/or sub-scenario `s`
    pub fn new(scenario: Option<u8>, sub: Option<u8>) -> Result<Self> {
        if let Some(x) = scenario {
            if !(1..=SCENARIO_COUNT).contains(&x) {
                return Err(Error::InvalidSelection(format!(
                    "scenario {x} is out of range 1..={SCENARIO_COUNT}"
                )));
            }
        }
        if let Some(s) = sub {
            if !(1..=SUB_SCENARIO_COUNT).contains(&s) {
                return Err(Error::InvalidSelection(format!(
                    "sub-scenario {s} is out of range 1..={SUB_SCENARIO_COUNT}"
                )));
            }
        }
        Ok(Self { scenario, sub })
    }

    /// Selected scenarios in order
    pub fn scenarios(&self) -> impl Iterator<Item = Scenario> {
        let only = self.scenario;
        Scenario::all().filter(move |sc| only.map_or(true, |x| sc.x == x))
    }

    /// Selected sub-scenarios of `scenario` in order
    pub fn sub_scenarios(&self, scenario: &Scenario) -> impl Iterator<Item = SubScenario> {
        let only = self.sub;
        scenario
            .sub_scenarios()
            .filter(move |sub| only.map_or(true, |s| sub.s == s))
    }
}

/// A planned client, as reported by `plan`
#[derive(Debug, Serialize)]
pub struct PlannedClient {
    pub c: u8,
    pub protocol: Protocol,
    pub command: String,
    pub diagnostic: String,
}

/// A planned server lifetime, as reported by `plan`
#[derive(Debug, Serialize)]
pub struct PlannedServer {
    pub x: u8,
    pub s: u8,
    pub init: &'static str,
    pub diagnostic: String,
    pub clients: Vec<PlannedClient>,
}

/// Everything a run over `selection` would do, without spawning anything
pub fn describe(selection: &Selection) -> Vec<PlannedServer> {
    let mut planned = Vec::new();
    for scenario in selection.scenarios() {
        for sub in selection.sub_scenarios(&scenario) {
            planned.push(PlannedServer {
                x: sub.x,
                s: sub.s,
                init: sub.init,
                diagnostic: diagnostics::server_line(&sub),
                clients: sub
                    .clients()
                    .map(|client| PlannedClient {
                        c: client.c,
                        protocol: client.protocol,
                        command: client.command_text(),
                        diagnostic: diagnostics::client_line(&client),
                    })
                    .collect(),
            });
        }
    }
    planned
}

#[cfg(test)]
mod tests {
    use super::Protocol::{Mapi, Sql};
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_first_sub_scenario() {
        let sub = Scenario::get(1).unwrap().sub_scenario(1).unwrap();
        assert_eq!(
            sub.init,
            "module(mapi);module(sql_server); mapi_start(); sql_server_start();"
        );

        let clients: Vec<_> = sub.clients().collect();
        let protocols: Vec<_> = clients.iter().map(|c| c.protocol).collect();
        assert_eq!(protocols, vec![Sql, Sql, Mapi, Mapi]);

        let commands: Vec<_> = clients.iter().map(|c| c.command_text()).collect();
        assert_eq!(
            commands,
            vec!["select 111 ;\n", "select 112 ;\n", "print(113);\n", "print(114);\n"]
        );
    }

    #[test]
    fn test_orderings_are_distinct_and_balanced() {
        let distinct: HashSet<_> = ORDERINGS.iter().collect();
        assert_eq!(distinct.len(), ORDERINGS.len());

        for ordering in ORDERINGS.iter() {
            let sql = ordering.iter().filter(|p| **p == Sql).count();
            assert_eq!(sql, 2, "ordering {ordering:?} should have two SQL clients");
        }
    }

    #[test]
    fn test_full_matrix_counts() {
        let servers = describe(&Selection::all());
        assert_eq!(servers.len(), 24);

        let clients: usize = servers.iter().map(|s| s.clients.len()).sum();
        assert_eq!(clients, 96);

        for server in &servers {
            let cs: Vec<_> = server.clients.iter().map(|c| c.c).collect();
            assert_eq!(cs, vec![1, 2, 3, 4]);
        }
    }

    #[test]
    fn test_command_text_uses_all_digits() {
        let sub = Scenario::get(4).unwrap().sub_scenario(6).unwrap();
        let commands: Vec<_> = sub.clients().map(|c| c.command_text()).collect();
        assert_eq!(
            commands,
            vec!["print(461);\n", "print(462);\n", "select 463 ;\n", "select 464 ;\n"]
        );
    }

    #[test]
    fn test_history_lists_earlier_clients() {
        let sub = Scenario::get(2).unwrap().sub_scenario(3).unwrap();
        let history: Vec<_> = sub.clients().map(|c| c.history()).collect();
        assert_eq!(history, vec!["", "(MAPI) ", "(MAPI) (SQL) ", "(MAPI) (SQL) (SQL) "]);
    }

    #[test]
    fn test_selection_filters() {
        let selection = Selection::new(Some(3), Some(2)).unwrap();
        let servers = describe(&selection);
        assert_eq!(servers.len(), 1);
        assert_eq!((servers[0].x, servers[0].s), (3, 2));

        let selection = Selection::new(None, Some(5)).unwrap();
        let xs: Vec<_> = describe(&selection).iter().map(|s| s.x).collect();
        assert_eq!(xs, vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_selection_rejects_out_of_range() {
        assert!(matches!(
            Selection::new(Some(0), None),
            Err(Error::InvalidSelection(_))
        ));
        assert!(matches!(
            Selection::new(Some(5), None),
            Err(Error::InvalidSelection(_))
        ));
        assert!(matches!(
            Selection::new(None, Some(7)),
            Err(Error::InvalidSelection(_))
        ));
    }

    #[test]
    fn test_lookup_out_of_range() {
        assert!(Scenario::get(0).is_none());
        assert!(Scenario::get(5).is_none());
        assert!(Scenario::get(1).unwrap().sub_scenario(0).is_none());
        assert!(Scenario::get(1).unwrap().sub_scenario(7).is_none());
    }

    #[test]
    fn test_protocol_env_vars() {
        assert_eq!(Sql.env_var(), "SQL_CLIENT");
        assert_eq!(Mapi.env_var(), "MAPI_CLIENT");
    }

    #[test]
    fn test_protocol_serializes_as_tag() {
        assert_eq!(serde_json::to_string(&Mapi).unwrap(), "\"MAPI\"");
        assert_eq!(serde_json::to_string(&Sql).unwrap(), "\"SQL\"");
    }
}
