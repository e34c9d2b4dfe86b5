//! MockSource - canned batches for tests and dry wiring

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use chrono::Utc;
use contracts::{ContractError, Metric, MetricBatch, Source, SourceKind};

/// Source that yields a preconfigured batch or failure
pub struct MockSource {
    outcome: Result<MetricBatch, String>,
    teardowns: Arc<AtomicUsize>,
}

impl MockSource {
    /// Always yield a clone of `batch`
    pub fn with_batch(batch: MetricBatch) -> Self {
        Self {
            outcome: Ok(batch),
            teardowns: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Always fail with `message`
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            outcome: Err(message.into()),
            teardowns: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Single heartbeat metric stamped at fetch time
    pub fn heartbeat() -> Self {
        Self::with_batch(MetricBatch::from(vec![Metric::new(
            "courier.heartbeat",
            Utc::now(),
            1.0,
        )]))
    }

    /// Counter of teardown calls, shared with the source after it moves
    pub fn teardown_counter(&self) -> Arc<AtomicUsize> {
        self.teardowns.clone()
    }
}

impl Source for MockSource {
    fn kind(&self) -> SourceKind {
        SourceKind::Mock
    }

    async fn fetch(&mut self) -> Result<MetricBatch, ContractError> {
        match &self.outcome {
            Ok(batch) => Ok(batch.clone()),
            Err(message) => Err(ContractError::source_fetch(
                SourceKind::Mock.as_str(),
                message.clone(),
            )),
        }
    }

    async fn teardown(&mut self) {
        self.teardowns.fetch_add(1, Ordering::SeqCst);
    }
}
