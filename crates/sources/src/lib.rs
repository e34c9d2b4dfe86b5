//! # Sources
//!
//! Source adapters: each produces one [`contracts::MetricBatch`] per
//! invocation behind the [`contracts::Source`] contract.
//!
//! Concrete adapters are selected by configuration at process start through
//! [`create_source`]; the orchestrator never sees an adapter type directly.

mod command;
mod factory;
mod mock;

pub use command::CommandSource;
pub use factory::{create_source, SourceHandle};
pub use mock::MockSource;
