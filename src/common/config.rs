//! Configuration file handling
//!
//! Settings come from `config.toml` (see [`super::paths::config_path`]);
//! the process environment takes precedence for the three commands.

use serde::Deserialize;
use std::path::Path;

use super::paths::config_path;
use super::{Error, Result};

/// Environment variable holding the server command
pub const SERVER_ENV: &str = "MSERVER";
/// Environment variable holding the SQL client command
pub const SQL_CLIENT_ENV: &str = "SQL_CLIENT";
/// Environment variable holding the MAPI client command
pub const MAPI_CLIENT_ENV: &str = "MAPI_CLIENT";

/// Main configuration structure
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    /// Command lines for the server and the two clients
    #[serde(default)]
    pub commands: CommandsConfig,

    /// How to decide that a freshly started server is ready
    #[serde(default)]
    pub readiness: ReadinessConfig,

    /// Server teardown settings
    #[serde(default)]
    pub shutdown: ShutdownConfig,
}

/// Shell command lines, used when the matching environment variable is unset
#[derive(Debug, Deserialize, Default, Clone)]
pub struct CommandsConfig {
    pub server: Option<String>,
    pub sql_client: Option<String>,
    pub mapi_client: Option<String>,
}

/// Readiness strategy selector
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ReadinessMode {
    /// Sleep for a fixed duration
    #[default]
    Delay,
    /// Poll a probe command until it succeeds
    Probe,
}

/// Readiness settings
#[derive(Debug, Deserialize, Clone)]
pub struct ReadinessConfig {
    #[serde(default)]
    pub mode: ReadinessMode,

    /// Seconds to wait after launching the server in `delay` mode
    #[serde(default = "default_ready_delay")]
    pub ready_delay_secs: u64,

    /// Shell command that exits 0 once the server accepts clients
    #[serde(default)]
    pub probe: Option<String>,

    /// Pause between probe attempts
    #[serde(default = "default_probe_interval")]
    pub probe_interval_ms: u64,

    /// Give up on the probe after this many seconds
    #[serde(default = "default_probe_timeout")]
    pub probe_timeout_secs: u64,
}

impl Default for ReadinessConfig {
    fn default() -> Self {
        Self {
            mode: ReadinessMode::default(),
            ready_delay_secs: default_ready_delay(),
            probe: None,
            probe_interval_ms: default_probe_interval(),
            probe_timeout_secs: default_probe_timeout(),
        }
    }
}

fn default_ready_delay() -> u64 {
    5
}
fn default_probe_interval() -> u64 {
    200
}
fn default_probe_timeout() -> u64 {
    30
}

/// Server teardown settings
#[derive(Debug, Deserialize, Clone)]
pub struct ShutdownConfig {
    /// Seconds to wait for the server to exit after its stdin is closed
    #[serde(default = "default_grace")]
    pub grace_secs: u64,
}

impl Default for ShutdownConfig {
    fn default() -> Self {
        Self {
            grace_secs: default_grace(),
        }
    }
}

fn default_grace() -> u64 {
    30
}

/// Fully resolved command lines for one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedCommands {
    pub server: String,
    pub sql_client: String,
    pub mapi_client: String,
}

impl Config {
    /// Load configuration
    ///
    /// An explicit path must exist. Without one, the default config file is
    /// read if present, otherwise defaults are returned.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }
        if let Some(path) = config_path() {
            if path.exists() {
                return Self::from_file(&path);
            }
        }
        Ok(Self::default())
    }

    fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::FileRead {
            path: path.display().to_string(),
            error: e.to_string(),
        })?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::ConfigParse(e.to_string()))
    }

    /// Resolve the three commands from the process environment and the file
    pub fn resolve_commands(&self) -> Result<ResolvedCommands> {
        self.resolve_commands_with(|var| std::env::var(var).ok())
    }

    /// Resolve commands using `lookup` in place of the process environment
    pub fn resolve_commands_with<F>(&self, lookup: F) -> Result<ResolvedCommands>
    where
        F: Fn(&str) -> Option<String>,
    {
        let pick = |var: &str| {
            self.command_for(var, &lookup)
                .ok_or_else(|| Error::missing_command(var))
        };

        Ok(ResolvedCommands {
            server: pick(SERVER_ENV)?,
            sql_client: pick(SQL_CLIENT_ENV)?,
            mapi_client: pick(MAPI_CLIENT_ENV)?,
        })
    }

    /// Command line for `var`: `lookup(var)` first, then the config file
    ///
    /// Blank values count as unset. Unknown variables have no file fallback.
    pub fn command_for<F>(&self, var: &str, lookup: F) -> Option<String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let fallback = match var {
            SERVER_ENV => &self.commands.server,
            SQL_CLIENT_ENV => &self.commands.sql_client,
            MAPI_CLIENT_ENV => &self.commands.mapi_client,
            _ => return lookup(var).filter(|v| !v.trim().is_empty()),
        };

        lookup(var)
            .filter(|v| !v.trim().is_empty())
            .or_else(|| fallback.clone().filter(|v| !v.trim().is_empty()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.readiness.mode, ReadinessMode::Delay);
        assert_eq!(config.readiness.ready_delay_secs, 5);
        assert_eq!(config.shutdown.grace_secs, 30);
    }

    #[test]
    fn test_parse_partial_file() {
        let config = Config::from_toml_str(
            r#"
            [commands]
            server = "mserver5 --dbfarm /tmp/farm"

            [readiness]
            mode = "probe"
            probe = "mclient -s 'select 1;'"
            "#,
        )
        .unwrap();

        assert_eq!(
            config.commands.server.as_deref(),
            Some("mserver5 --dbfarm /tmp/farm")
        );
        assert_eq!(config.readiness.mode, ReadinessMode::Probe);
        assert_eq!(config.readiness.probe_interval_ms, 200);
        assert_eq!(config.shutdown.grace_secs, 30);
    }

    #[test]
    fn test_parse_rejects_unknown_mode() {
        let err = Config::from_toml_str("[readiness]\nmode = \"guess\"\n").unwrap_err();
        assert!(matches!(err, Error::ConfigParse(_)));
    }

    #[test]
    fn test_environment_overrides_file() {
        let config = Config::from_toml_str(
            r#"
            [commands]
            server = "from-file-server"
            sql_client = "from-file-sql"
            mapi_client = "from-file-mapi"
            "#,
        )
        .unwrap();
        let env: HashMap<&str, &str> = [(SQL_CLIENT_ENV, "from-env-sql")].into_iter().collect();

        let resolved = config
            .resolve_commands_with(|var| env.get(var).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(resolved.server, "from-file-server");
        assert_eq!(resolved.sql_client, "from-env-sql");
        assert_eq!(resolved.mapi_client, "from-file-mapi");
    }

    #[test]
    fn test_blank_environment_is_unset() {
        let config = Config::default();
        let err = config
            .resolve_commands_with(|var| (var == SERVER_ENV).then(|| "  ".to_string()))
            .unwrap_err();
        match err {
            Error::MissingCommand { var } => assert_eq!(var, SERVER_ENV),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_command_for_falls_back_to_file() {
        let config = Config::from_toml_str("[commands]\nmapi_client = \"mclient -lmal\"\n").unwrap();

        assert_eq!(
            config.command_for(MAPI_CLIENT_ENV, |_| Some(String::new())),
            Some("mclient -lmal".to_string())
        );
        assert_eq!(config.command_for(SQL_CLIENT_ENV, |_| None), None);
        assert_eq!(
            config.command_for(SERVER_ENV, |_| Some("mserver5".to_string())),
            Some("mserver5".to_string())
        );
    }

    #[test]
    fn test_explicit_missing_file_is_error() {
        let err = Config::load(Some(Path::new("/nonexistent/mserver-harness.toml"))).unwrap_err();
        assert!(matches!(err, Error::FileRead { .. }));
    }
}
