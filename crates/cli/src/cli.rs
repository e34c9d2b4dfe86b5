//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use contracts::{ShipperConfig, SinkKind, SourceKind};

/// Metrics Courier - buffered one-shot metrics shipper
#[derive(Parser, Debug)]
#[command(
    name = "metrics-courier",
    author,
    version,
    about = "Buffered one-shot metrics shipper",
    long_about = "Fetches one batch of metrics from a configured source and delivers \n\
                  it to a configured sink, replaying previously-undelivered batches \n\
                  from a crash-safe on-disk buffer first.\n\n\
                  Designed to run under cron or a systemd timer; one invocation is \n\
                  one delivery cycle."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "METRICS_COURIER_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "compact",
        global = true,
        env = "METRICS_COURIER_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Execute one delivery run
    Run(RunArgs),

    /// Validate configuration file without running
    Validate(ValidateArgs),
}

/// Arguments for the `run` command
///
/// Every override flag mirrors a configuration file field; a flag given on
/// the command line (or via its environment variable) wins over the file.
#[derive(Parser, Debug, Clone, Default)]
pub struct RunArgs {
    /// Path to configuration file (TOML or JSON)
    #[arg(short, long, env = "METRICS_COURIER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Override the logical delivery target
    #[arg(long, env = "METRICS_COURIER_TARGET")]
    pub target: Option<String>,

    /// Override the source adapter (command, mock)
    #[arg(long, value_enum, env = "METRICS_COURIER_SOURCE")]
    pub source: Option<SourceKindArg>,

    /// Override the sink adapter (zabbix, mackerel, log)
    #[arg(long, value_enum, env = "METRICS_COURIER_SINK")]
    pub sink: Option<SinkKindArg>,

    /// Override the collector command line for the command source
    #[arg(long, env = "METRICS_COURIER_COMMAND")]
    pub command: Option<String>,

    /// Override the buffer store path
    #[arg(long, env = "METRICS_COURIER_BUFFER_PATH")]
    pub buffer_path: Option<PathBuf>,

    /// Override the buffer file mode (octal string)
    #[arg(long, env = "METRICS_COURIER_BUFFER_MODE")]
    pub buffer_mode: Option<String>,

    /// Override the backlog entries replayed per run
    #[arg(long, env = "METRICS_COURIER_DRAIN_LIMIT")]
    pub drain_limit: Option<usize>,

    /// Override the Zabbix server host
    #[arg(long, env = "METRICS_COURIER_ZABBIX_SERVER")]
    pub zabbix_server: Option<String>,

    /// Override the Zabbix trapper port
    #[arg(long, env = "METRICS_COURIER_ZABBIX_PORT")]
    pub zabbix_port: Option<u16>,

    /// Override the monitored host name reported to Zabbix
    #[arg(long, env = "METRICS_COURIER_ZABBIX_HOST")]
    pub zabbix_host: Option<String>,

    /// Override the Mackerel API key
    #[arg(long, env = "MACKEREL_API_KEY")]
    pub mackerel_api_key: Option<String>,

    /// Override the Mackerel service name
    #[arg(long, env = "METRICS_COURIER_MACKEREL_SERVICE")]
    pub mackerel_service: Option<String>,

    /// Validate the resolved configuration and exit without delivering
    #[arg(long)]
    pub dry_run: bool,
}

impl RunArgs {
    /// Overlay every given flag onto `config`; flags win over file values
    pub fn apply_overrides(&self, config: &mut ShipperConfig) {
        if let Some(ref target) = self.target {
            config.target = target.clone();
        }
        if let Some(source) = self.source {
            config.source = source.into();
        }
        if let Some(sink) = self.sink {
            config.sink = sink.into();
        }
        if let Some(ref command) = self.command {
            config.command.command = command.clone();
        }
        if let Some(ref path) = self.buffer_path {
            config.buffer.path = Some(path.clone());
        }
        if let Some(ref mode) = self.buffer_mode {
            config.buffer.mode = mode.clone();
        }
        if let Some(limit) = self.drain_limit {
            config.buffer.drain_limit = limit;
        }
        if let Some(ref server) = self.zabbix_server {
            config.zabbix.server = server.clone();
        }
        if let Some(port) = self.zabbix_port {
            config.zabbix.port = port;
        }
        if let Some(ref host) = self.zabbix_host {
            config.zabbix.host = host.clone();
        }
        if let Some(ref key) = self.mackerel_api_key {
            config.mackerel.api_key = key.clone();
        }
        if let Some(ref service) = self.mackerel_service {
            config.mackerel.service = service.clone();
        }
    }
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Log output format
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    Pretty,
    /// Compact single-line format
    #[default]
    Compact,
}

/// clap-parseable wrapper over [`SourceKind`]
#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum SourceKindArg {
    Command,
    Mock,
}

impl From<SourceKindArg> for SourceKind {
    fn from(arg: SourceKindArg) -> Self {
        match arg {
            SourceKindArg::Command => Self::Command,
            SourceKindArg::Mock => Self::Mock,
        }
    }
}

/// clap-parseable wrapper over [`SinkKind`]
#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum SinkKindArg {
    Zabbix,
    Mackerel,
    Log,
}

impl From<SinkKindArg> for SinkKind {
    fn from(arg: SinkKindArg) -> Self {
        match arg {
            SinkKindArg::Zabbix => Self::Zabbix,
            SinkKindArg::Mackerel => Self::Mackerel,
            SinkKindArg::Log => Self::Log,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{
        BufferSettings, CommandSourceConfig, MackerelSinkConfig, ZabbixSinkConfig,
    };

    fn base_config() -> ShipperConfig {
        ShipperConfig {
            target: "web01".to_string(),
            source: SourceKind::Command,
            sink: SinkKind::Zabbix,
            buffer: BufferSettings::default(),
            command: CommandSourceConfig {
                command: "/usr/local/bin/collect".to_string(),
            },
            zabbix: ZabbixSinkConfig::default(),
            mackerel: MackerelSinkConfig::default(),
        }
    }

    #[test]
    fn test_flags_override_file_values() {
        let args = RunArgs {
            target: Some("edge01".to_string()),
            sink: Some(SinkKindArg::Log),
            zabbix_port: Some(10052),
            drain_limit: Some(25),
            ..Default::default()
        };

        let mut config = base_config();
        args.apply_overrides(&mut config);

        assert_eq!(config.target, "edge01");
        assert_eq!(config.sink, SinkKind::Log);
        assert_eq!(config.zabbix.port, 10052);
        assert_eq!(config.buffer.drain_limit, 25);
        // untouched fields keep their file values
        assert_eq!(config.source, SourceKind::Command);
        assert_eq!(config.command.command, "/usr/local/bin/collect");
    }

    #[test]
    fn test_no_flags_change_nothing() {
        let args = RunArgs::default();
        let mut config = base_config();
        args.apply_overrides(&mut config);
        assert_eq!(config.target, "web01");
        assert_eq!(config.zabbix.port, 10051);
    }
}
