//! Sink implementations
//!
//! Contains LogSink, ZabbixSink, MackerelSink and the MockSink test double.
//! Adapters are selected by configuration through [`create_sink`]; enum
//! dispatch because the async `Sink` contract is not object-safe.

mod log;
mod mackerel;
mod mock;
mod zabbix;

pub use self::log::LogSink;
pub use self::mackerel::MackerelSink;
pub use self::mock::MockSink;
pub use self::zabbix::ZabbixSink;

use contracts::{ContractError, MetricBatch, ShipperConfig, Sink, SinkKind};

/// A configured sink adapter
pub enum SinkHandle {
    Zabbix(ZabbixSink),
    Mackerel(MackerelSink),
    Log(LogSink),
}

impl Sink for SinkHandle {
    fn name(&self) -> &str {
        match self {
            Self::Zabbix(s) => s.name(),
            Self::Mackerel(s) => s.name(),
            Self::Log(s) => s.name(),
        }
    }

    async fn send(&mut self, batch: &MetricBatch) -> Result<(), ContractError> {
        match self {
            Self::Zabbix(s) => s.send(batch).await,
            Self::Mackerel(s) => s.send(batch).await,
            Self::Log(s) => s.send(batch).await,
        }
    }
}

/// Build the sink adapter selected by `config.sink`
pub fn create_sink(config: &ShipperConfig) -> Result<SinkHandle, ContractError> {
    match config.sink {
        SinkKind::Zabbix => Ok(SinkHandle::Zabbix(ZabbixSink::new(
            &config.zabbix.server,
            config.zabbix.port,
            config.zabbix_host(),
        ))),
        SinkKind::Mackerel => Ok(SinkHandle::Mackerel(MackerelSink::new(
            &config.mackerel.api_key,
            config.mackerel_service(),
        )?)),
        SinkKind::Log => Ok(SinkHandle::Log(LogSink::new("log"))),
    }
}
