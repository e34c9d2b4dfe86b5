//! # Delivery
//!
//! Sink adapters and the per-invocation delivery orchestrator.
//!
//! The orchestrator binds one [`contracts::Source`], one
//! [`contracts::Sink`] and the [`durable_buffer::DurableBuffer`] into a
//! single run-to-completion pass: replay a bounded slice of the backlog,
//! send the fresh batch, persist it on failure.

mod error;
mod orchestrator;
mod report;
pub mod sinks;

pub use error::DeliveryError;
pub use orchestrator::{deliver, DeliveryConfig};
pub use report::DeliveryReport;
pub use sinks::{create_sink, SinkHandle};
