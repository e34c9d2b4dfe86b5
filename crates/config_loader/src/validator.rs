//! Configuration validation
//!
//! Validation rules:
//! - derive-level field constraints (non-empty target)
//! - source-specific fields present for the selected source
//! - sink-specific fields present for the selected sink
//! - buffer mode is a parseable octal string, drain limit sane

use contracts::{ContractError, ShipperConfig, SinkKind, SourceKind};
use validator::Validate;

/// Validate a ShipperConfig
///
/// Returns the first error encountered, or Ok(()).
pub fn validate(config: &ShipperConfig) -> Result<(), ContractError> {
    validate_fields(config)?;
    validate_source(config)?;
    validate_sink(config)?;
    validate_buffer(config)?;
    Ok(())
}

/// Derive-level field constraints
fn validate_fields(config: &ShipperConfig) -> Result<(), ContractError> {
    config.validate().map_err(|e| {
        let field = e
            .field_errors()
            .keys()
            .next()
            .map(|k| k.to_string())
            .unwrap_or_else(|| "config".to_string());
        ContractError::config_validation(field, e.to_string())
    })
}

/// Source-specific requirements
fn validate_source(config: &ShipperConfig) -> Result<(), ContractError> {
    if config.source == SourceKind::Command && config.command.command.trim().is_empty() {
        return Err(ContractError::config_validation(
            "command.command",
            "command source selected but no command configured",
        ));
    }
    Ok(())
}

/// Sink-specific requirements
fn validate_sink(config: &ShipperConfig) -> Result<(), ContractError> {
    match config.sink {
        SinkKind::Zabbix => {
            if config.zabbix.server.is_empty() {
                return Err(ContractError::config_validation(
                    "zabbix.server",
                    "zabbix sink selected but no server configured",
                ));
            }
            if config.zabbix.port == 0 {
                return Err(ContractError::config_validation(
                    "zabbix.port",
                    "zabbix port must be > 0",
                ));
            }
        }
        SinkKind::Mackerel => {
            if config.mackerel.api_key.is_empty() {
                return Err(ContractError::config_validation(
                    "mackerel.api_key",
                    "mackerel sink selected but no api_key configured",
                ));
            }
        }
        SinkKind::Log => {}
    }
    Ok(())
}

/// Buffer settings sanity
fn validate_buffer(config: &ShipperConfig) -> Result<(), ContractError> {
    config.buffer_mode()?;
    Ok(())
}
