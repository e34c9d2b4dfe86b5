//! LogSink - logs batch summaries via tracing

use contracts::{ContractError, MetricBatch, MetricValue, Sink};
use tracing::info;

/// Sink that logs batch summaries for debugging
pub struct LogSink {
    name: String,
}

impl LogSink {
    /// Create a new LogSink with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    fn log_batch_summary(&self, batch: &MetricBatch) {
        let numeric = batch
            .iter()
            .filter(|m| matches!(m.value, MetricValue::Number(_)))
            .count();

        info!(
            sink = %self.name,
            metrics = batch.len(),
            numeric,
            text = batch.len() - numeric,
            "batch received"
        );
    }
}

impl Sink for LogSink {
    fn name(&self) -> &str {
        &self.name
    }

    async fn send(&mut self, batch: &MetricBatch) -> Result<(), ContractError> {
        self.log_batch_summary(batch);
        Ok(())
    }
}
