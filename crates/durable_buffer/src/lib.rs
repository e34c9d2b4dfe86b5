//! # Durable Buffer
//!
//! Crash-safe, disk-backed ordered queue of previously-undelivered metric
//! batches, partitioned by source kind.
//!
//! Storage is a single SQLite file per logical target, owned exclusively by
//! one process at a time. Every entry is committed atomically under a
//! monotonically increasing [`BufferKey`], and replay reads entries back in
//! strict ascending key order (FIFO per partition).
//!
//! The backlog has no TTL: it only shrinks via confirmed per-entry deletion,
//! and can grow without bound while the sink stays down.

mod error;
mod key;
mod store;

pub use error::BufferError;
pub use key::{BufferKey, Clock, SystemClock};
pub use store::{BufferOptions, DurableBuffer};
