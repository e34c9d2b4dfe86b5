//! Source trait - fetch-side capability contract
//!
//! Defines the abstract interface the orchestrator consumes; concrete
//! adapters (command runner, mocks) live outside this crate.

use crate::{ContractError, MetricBatch, SourceKind};

/// Metric source trait
///
/// A source produces exactly one batch per process invocation. Adapters own
/// their own timeouts; the orchestrator imposes none.
#[trait_variant::make(Source: Send)]
pub trait LocalSource {
    /// Stable source identity; also names the buffer partition so backlog
    /// survives configuration changes that keep the same source kind
    fn kind(&self) -> SourceKind;

    /// Produce one batch of measurements
    ///
    /// # Errors
    /// A fetch failure is fatal for the run; there is nothing to deliver
    /// and nothing to buffer.
    async fn fetch(&mut self) -> Result<MetricBatch, ContractError>;

    /// Release held resources (connections, subprocess handles)
    ///
    /// Invoked exactly once per process lifetime, regardless of fetch
    /// outcome.
    async fn teardown(&mut self);
}
