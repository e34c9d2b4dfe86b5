//! Source selection - tagged union over the configured source kind
//!
//! Enum dispatch rather than trait objects: the `Source` contract's async
//! methods are not object-safe, and the set of adapters is closed by
//! configuration anyway.

use contracts::{ContractError, MetricBatch, ShipperConfig, Source, SourceKind};

use crate::{CommandSource, MockSource};

/// A configured source adapter
pub enum SourceHandle {
    Command(CommandSource),
    Mock(MockSource),
}

impl Source for SourceHandle {
    fn kind(&self) -> SourceKind {
        match self {
            Self::Command(s) => s.kind(),
            Self::Mock(s) => s.kind(),
        }
    }

    async fn fetch(&mut self) -> Result<MetricBatch, ContractError> {
        match self {
            Self::Command(s) => s.fetch().await,
            Self::Mock(s) => s.fetch().await,
        }
    }

    async fn teardown(&mut self) {
        match self {
            Self::Command(s) => s.teardown().await,
            Self::Mock(s) => s.teardown().await,
        }
    }
}

/// Build the source adapter selected by `config.source`
pub fn create_source(config: &ShipperConfig) -> Result<SourceHandle, ContractError> {
    match config.source {
        SourceKind::Command => Ok(SourceHandle::Command(CommandSource::new(
            &config.command.command,
        )?)),
        SourceKind::Mock => Ok(SourceHandle::Mock(MockSource::heartbeat())),
    }
}
