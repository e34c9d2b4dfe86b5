//! # Contracts
//!
//! Frozen interface contracts, defining inter-crate data structures and traits.
//! All business crates can only depend on this crate, reverse dependencies are
//! prohibited.
//!
//! ## Delivery Model
//! - A [`Metric`] is one measurement; a [`MetricBatch`] is one fetch cycle
//! - A [`Source`] produces one batch per invocation, a [`Sink`] accepts one
//! - Delivery is at-least-once: a sink may see the same batch again after a
//!   failed or unconfirmed run

mod config;
mod error;
mod metric;
mod sink;
mod source;

pub use config::*;
pub use error::*;
pub use metric::*;
pub use sink::{LocalSink, Sink};
pub use source::{LocalSource, Source};
