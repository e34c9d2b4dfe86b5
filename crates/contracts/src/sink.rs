//! Sink trait - delivery-side capability contract
//!
//! Defines the abstract interface for sinks.

use crate::{ContractError, MetricBatch};

/// Metric sink trait
///
/// All sink implementations must implement this trait. `send` must be safe
/// to call with a previously-sent batch: the orchestrator may retry the
/// same batch across invocations (at-least-once delivery), and sinks are
/// not required to deduplicate.
#[trait_variant::make(Sink: Send)]
pub trait LocalSink {
    /// Sink name (used for logging)
    fn name(&self) -> &str;

    /// Deliver one batch
    ///
    /// # Errors
    /// Returns a send error (should include context); the orchestrator
    /// decides whether to buffer or surface it.
    async fn send(&mut self, batch: &MetricBatch) -> Result<(), ContractError>;
}
