//! Delivery error types

use contracts::ContractError;
use thiserror::Error;

/// Terminal failures of one delivery run
///
/// Backlog-drain problems are recovered locally and never surface here; a
/// run fails only when the fresh batch cannot be fetched or delivered.
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// Nothing to deliver and nothing to buffer; the external scheduler is
    /// expected to re-invoke later
    #[error("source fetch failed: {source}")]
    SourceFetch {
        #[source]
        source: ContractError,
    },

    /// Fresh send failed; `buffered` reports whether the batch was
    /// persisted for a later run
    #[error("fresh send failed (buffered for replay: {buffered}): {source}")]
    FreshSend {
        buffered: bool,
        #[source]
        source: ContractError,
    },
}
