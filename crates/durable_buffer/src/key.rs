//! BufferKey - monotonic ordering token assigned at write time
//!
//! Not a measurement timestamp. Derived from a nanosecond wall-clock
//! reading, disambiguated on tie so a key is never reused within a
//! partition.

use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

/// Ordering/identity token for one buffered entry.
///
/// Stored as an SQLite `INTEGER` and ordered numerically; [`fmt::Display`]
/// renders the decimal string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BufferKey(i64);

impl BufferKey {
    pub(crate) fn from_nanos(nanos: i64) -> Self {
        Self(nanos)
    }

    /// Raw nanosecond reading the key was derived from
    pub fn as_nanos(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for BufferKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Wall-clock seam for key generation
///
/// The buffer only needs "monotonic enough": the store bumps colliding
/// readings itself, so tests can drive collisions with a fixed clock.
pub trait Clock: Send {
    /// Current wall-clock reading in nanoseconds since the Unix epoch
    fn now_nanos(&self) -> i64;
}

/// System wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_nanos(&self) -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos() as i64)
            .unwrap_or(0)
    }
}
