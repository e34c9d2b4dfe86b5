//! Delivery run report

use std::time::Duration;

/// Statistics from one successful delivery run
///
/// Failed runs only leave logs behind; there is no partial-success channel
/// beyond them.
#[derive(Debug, Clone, Default)]
pub struct DeliveryReport {
    /// Backlog entries attempted this run (bounded by the drain limit)
    pub backlog_attempted: usize,

    /// Backlog entries confirmed by the sink
    pub backlog_delivered: usize,

    /// Metrics in the fresh batch that was delivered
    pub fresh_metrics: usize,

    /// Whether the durable buffer could be opened for this run
    pub buffer_available: bool,

    /// Total duration of the run
    pub duration: Duration,
}

impl DeliveryReport {
    /// Backlog entries that stayed resident after this run's drain slice
    pub fn backlog_remaining(&self) -> usize {
        self.backlog_attempted - self.backlog_delivered
    }

    /// Print a human-readable summary
    pub fn print_summary(&self) {
        println!("\n=== Delivery Summary ===");
        println!("  Fresh metrics sent: {}", self.fresh_metrics);
        println!(
            "  Backlog: {} attempted, {} delivered, {} still pending",
            self.backlog_attempted,
            self.backlog_delivered,
            self.backlog_remaining()
        );
        if !self.buffer_available {
            println!("  Buffer: UNAVAILABLE (ran without durability net)");
        }
        println!("  Duration: {:.3}s", self.duration.as_secs_f64());
    }
}
