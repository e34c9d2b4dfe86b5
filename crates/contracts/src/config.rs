//! Run configuration - the immutable blueprint for one shipper invocation
//!
//! Constructed once before the orchestrator runs: values are loaded from a
//! TOML/JSON file and CLI flags override file values when set.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Available source adapters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// External command, one metric per stdout line
    Command,
    /// Canned batch, for tests and dry wiring
    Mock,
}

impl SourceKind {
    /// Stable identifier; used as the buffer partition name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Command => "command",
            Self::Mock => "mock",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "command" => Ok(Self::Command),
            "mock" => Ok(Self::Mock),
            other => Err(format!("invalid source kind: {other}")),
        }
    }
}

/// Available sink adapters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SinkKind {
    /// Zabbix sender wire protocol over TCP
    Zabbix,
    /// Mackerel service-metrics HTTP API
    Mackerel,
    /// Tracing log output, for debugging
    Log,
}

impl SinkKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Zabbix => "zabbix",
            Self::Mackerel => "mackerel",
            Self::Log => "log",
        }
    }
}

impl fmt::Display for SinkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SinkKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "zabbix" => Ok(Self::Zabbix),
            "mackerel" => Ok(Self::Mackerel),
            "log" => Ok(Self::Log),
            other => Err(format!("invalid sink kind: {other}")),
        }
    }
}

/// Durable buffer settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BufferSettings {
    /// Store path; defaults to `{temp_dir}/{target}_metrics.db`
    #[serde(default)]
    pub path: Option<PathBuf>,

    /// Unix file mode for the store, octal string
    #[serde(default = "default_buffer_mode")]
    pub mode: String,

    /// Maximum backlog entries replayed per run
    #[serde(default = "default_drain_limit")]
    pub drain_limit: usize,
}

impl Default for BufferSettings {
    fn default() -> Self {
        Self {
            path: None,
            mode: default_buffer_mode(),
            drain_limit: default_drain_limit(),
        }
    }
}

fn default_buffer_mode() -> String {
    "0600".to_string()
}

fn default_drain_limit() -> usize {
    10
}

/// Command source settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CommandSourceConfig {
    /// Command line to run; whitespace-split, first field is the program
    #[serde(default)]
    pub command: String,
}

/// Zabbix sink settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZabbixSinkConfig {
    /// Zabbix server host
    #[serde(default = "default_zabbix_server")]
    pub server: String,

    /// Zabbix trapper port
    #[serde(default = "default_zabbix_port")]
    pub port: u16,

    /// Monitored host name on the server side; defaults to the target
    #[serde(default)]
    pub host: String,
}

impl Default for ZabbixSinkConfig {
    fn default() -> Self {
        Self {
            server: default_zabbix_server(),
            port: default_zabbix_port(),
            host: String::new(),
        }
    }
}

fn default_zabbix_server() -> String {
    "localhost".to_string()
}

fn default_zabbix_port() -> u16 {
    10051
}

/// Mackerel sink settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MackerelSinkConfig {
    /// API key for the Mackerel account
    #[serde(default)]
    pub api_key: String,

    /// Service whose metrics are posted; defaults to the target
    #[serde(default)]
    pub service: String,
}

/// Complete configuration for one shipper invocation
#[derive(Debug, Clone, Validate, Serialize, Deserialize)]
pub struct ShipperConfig {
    /// Logical delivery target; names the buffer file
    #[validate(length(min = 1, message = "target must not be empty"))]
    pub target: String,

    /// Which source adapter produces the fresh batch
    pub source: SourceKind,

    /// Which sink adapter receives batches
    pub sink: SinkKind,

    #[serde(default)]
    pub buffer: BufferSettings,

    #[serde(default)]
    pub command: CommandSourceConfig,

    #[serde(default)]
    pub zabbix: ZabbixSinkConfig,

    #[serde(default)]
    pub mackerel: MackerelSinkConfig,
}

impl ShipperConfig {
    /// Buffer partition name for the configured source
    pub fn partition(&self) -> &'static str {
        self.source.as_str()
    }

    /// Buffer store path, derived from the target unless overridden
    pub fn buffer_path(&self) -> PathBuf {
        self.buffer
            .path
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join(format!("{}_metrics.db", self.target)))
    }

    /// Buffer file mode parsed from the configured octal string
    pub fn buffer_mode(&self) -> Result<u32, crate::ContractError> {
        u32::from_str_radix(&self.buffer.mode, 8).map_err(|e| {
            crate::ContractError::config_validation(
                "buffer.mode",
                format!("not an octal file mode '{}': {e}", self.buffer.mode),
            )
        })
    }

    /// Zabbix host identifier, falling back to the target
    pub fn zabbix_host(&self) -> &str {
        if self.zabbix.host.is_empty() {
            &self.target
        } else {
            &self.zabbix.host
        }
    }

    /// Mackerel service name, falling back to the target
    pub fn mackerel_service(&self) -> &str {
        if self.mackerel.service.is_empty() {
            &self.target
        } else {
            &self.mackerel.service
        }
    }
}
