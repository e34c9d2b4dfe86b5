//! `run` command implementation.

use anyhow::{Context, Result};
use std::time::Duration;
use tracing::info;

use contracts::{
    BufferSettings, CommandSourceConfig, MackerelSinkConfig, ShipperConfig, ZabbixSinkConfig,
};
use delivery::DeliveryConfig;
use durable_buffer::BufferOptions;

use crate::cli::RunArgs;
use crate::error::CliError;

/// Execute the `run` command: one delivery cycle, then exit
pub async fn run_delivery(args: &RunArgs) -> Result<()> {
    let config = resolve_config(args)?;

    info!(
        target = %config.target,
        source = %config.source,
        sink = %config.sink,
        buffer = %config.buffer_path().display(),
        "Configuration resolved"
    );

    if args.dry_run {
        info!("Dry run mode - configuration is valid, exiting");
        print_config_summary(&config);
        return Ok(());
    }

    let mut source = sources::create_source(&config).context("Failed to build source")?;
    let mut sink = delivery::create_sink(&config).context("Failed to build sink")?;

    let delivery_config = DeliveryConfig {
        buffer_path: config.buffer_path(),
        buffer_options: BufferOptions {
            mode: config.buffer_mode()?,
            lock_wait: Duration::from_secs(5),
        },
        drain_limit: config.buffer.drain_limit,
    };

    let report = delivery::deliver(&delivery_config, &mut source, &mut sink)
        .await
        .context("Delivery failed")?;

    report.print_summary();
    info!("metrics-courier finished");
    Ok(())
}

/// Build the effective configuration: file values first, flags on top
///
/// Without a configuration file the flags must carry at least a target; the
/// source and sink fall back to `command` and `log` so a bare
/// `--target x --command y` invocation works.
fn resolve_config(args: &RunArgs) -> Result<ShipperConfig> {
    let mut config = match &args.config {
        Some(path) => {
            if !path.exists() {
                return Err(CliError::config_not_found(path.display().to_string()).into());
            }
            config_loader::ConfigLoader::load_from_path(path)
                .with_context(|| format!("Failed to load config from {}", path.display()))?
        }
        None => {
            let target = args
                .target
                .clone()
                .ok_or(CliError::missing_flag("target"))?;
            ShipperConfig {
                target,
                source: contracts::SourceKind::Command,
                sink: contracts::SinkKind::Log,
                buffer: BufferSettings::default(),
                command: CommandSourceConfig::default(),
                zabbix: ZabbixSinkConfig::default(),
                mackerel: MackerelSinkConfig::default(),
            }
        }
    };

    args.apply_overrides(&mut config);

    config_loader::ConfigLoader::validate(&config).context("Configuration invalid")?;
    Ok(config)
}

/// Print configuration summary for dry-run mode
fn print_config_summary(config: &ShipperConfig) {
    println!("\n=== Configuration Summary ===\n");
    println!("Target: {}", config.target);
    println!("Source: {}", config.source);
    if !config.command.command.is_empty() {
        println!("  Command: {}", config.command.command);
    }
    println!("Sink:   {}", config.sink);
    match config.sink {
        contracts::SinkKind::Zabbix => {
            println!(
                "  Server: {}:{} (host '{}')",
                config.zabbix.server,
                config.zabbix.port,
                config.zabbix_host()
            );
        }
        contracts::SinkKind::Mackerel => {
            println!("  Service: {}", config.mackerel_service());
        }
        contracts::SinkKind::Log => {}
    }
    println!("\nBuffer:");
    println!("  Path: {}", config.buffer_path().display());
    println!("  Mode: {}", config.buffer.mode);
    println!("  Drain limit: {}", config.buffer.drain_limit);
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(dir: &tempfile::TempDir, body: &str) -> std::path::PathBuf {
        let path = dir.path().join("config.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(body.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_resolve_flags_override_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = write_config(
            &dir,
            r#"
target = "web01"
source = "mock"
sink = "zabbix"

[zabbix]
server = "zabbix.internal"
"#,
        );

        let args = RunArgs {
            config: Some(path),
            zabbix_server: Some("zabbix.backup".to_string()),
            ..Default::default()
        };
        let config = resolve_config(&args).unwrap();
        assert_eq!(config.zabbix.server, "zabbix.backup");
        assert_eq!(config.target, "web01");
    }

    #[test]
    fn test_resolve_flags_only_needs_target() {
        let args = RunArgs::default();
        assert!(resolve_config(&args).is_err());

        let args = RunArgs {
            target: Some("web01".to_string()),
            command: Some("vmstat 1 2".to_string()),
            ..Default::default()
        };
        let config = resolve_config(&args).unwrap();
        assert_eq!(config.source, contracts::SourceKind::Command);
        assert_eq!(config.sink, contracts::SinkKind::Log);
    }

    #[test]
    fn test_resolve_missing_file_is_an_error() {
        let args = RunArgs {
            config: Some(std::path::PathBuf::from("/nonexistent/config.toml")),
            ..Default::default()
        };
        assert!(resolve_config(&args).is_err());
    }

    #[test]
    fn test_resolve_rejects_invalid_overrides() {
        // override breaks validation: command source with no command
        let args = RunArgs {
            target: Some("web01".to_string()),
            source: Some(crate::cli::SourceKindArg::Command),
            ..Default::default()
        };
        assert!(resolve_config(&args).is_err());
    }
}
