//! Error types for CLI operations.

use thiserror::Error;

/// CLI-specific error types
#[derive(Error, Debug)]
pub enum CliError {
    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: String },

    /// Flags-only invocation is missing a required flag
    #[error("No configuration file given and --{flag} not set")]
    MissingFlag { flag: &'static str },
}

impl CliError {
    pub fn config_not_found(path: impl Into<String>) -> Self {
        Self::ConfigNotFound { path: path.into() }
    }

    pub fn missing_flag(flag: &'static str) -> Self {
        Self::MissingFlag { flag }
    }
}
