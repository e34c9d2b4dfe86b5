//! MockSink - scripted sink for orchestrator and scenario tests

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use contracts::{ContractError, MetricBatch, Sink};

/// Sink that fails a scripted number of times, then succeeds
///
/// Every attempted batch is recorded, successful or not, so tests can
/// count delivery attempts across simulated runs.
pub struct MockSink {
    fail_remaining: Arc<AtomicUsize>,
    attempts: Arc<Mutex<Vec<MetricBatch>>>,
}

impl MockSink {
    /// Sink that always succeeds
    pub fn ok() -> Self {
        Self::fail_n_times(0)
    }

    /// Sink that always fails
    pub fn failing() -> Self {
        Self::fail_n_times(usize::MAX)
    }

    /// Sink that fails the first `n` sends, then succeeds
    pub fn fail_n_times(n: usize) -> Self {
        Self {
            fail_remaining: Arc::new(AtomicUsize::new(n)),
            attempts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Attempted batches, shared with the sink after it moves
    pub fn attempts(&self) -> Arc<Mutex<Vec<MetricBatch>>> {
        self.attempts.clone()
    }

    /// Remaining scripted failures, shared across simulated runs
    pub fn failure_counter(&self) -> Arc<AtomicUsize> {
        self.fail_remaining.clone()
    }

    /// New sink sharing this sink's script and attempt log (a "next run")
    pub fn successor(&self) -> Self {
        Self {
            fail_remaining: self.fail_remaining.clone(),
            attempts: self.attempts.clone(),
        }
    }
}

impl Sink for MockSink {
    fn name(&self) -> &str {
        "mock"
    }

    async fn send(&mut self, batch: &MetricBatch) -> Result<(), ContractError> {
        self.attempts
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(batch.clone());

        let remaining = self.fail_remaining.load(Ordering::SeqCst);
        if remaining > 0 {
            if remaining != usize::MAX {
                self.fail_remaining.store(remaining - 1, Ordering::SeqCst);
            }
            return Err(ContractError::sink_send("mock", "scripted failure"));
        }
        Ok(())
    }
}
