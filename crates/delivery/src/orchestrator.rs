//! DeliveryOrchestrator - the per-invocation algorithm
//!
//! Single pass, run to completion, no scheduling of its own:
//! open buffer -> fetch -> drain bounded backlog -> send fresh ->
//! persist fresh on failure. Source teardown and buffer close run on
//! every exit path.

use std::path::PathBuf;
use std::time::Instant;

use contracts::{Sink, Source};
use durable_buffer::{BufferError, BufferOptions, DurableBuffer};
use tracing::{debug, error, info, warn};

use crate::{DeliveryError, DeliveryReport};

/// Per-run orchestration settings
#[derive(Debug, Clone)]
pub struct DeliveryConfig {
    /// Buffer store path (one file per logical target)
    pub buffer_path: PathBuf,

    /// Buffer open options (file mode, bounded lock wait)
    pub buffer_options: BufferOptions,

    /// Maximum backlog entries replayed this run
    pub drain_limit: usize,
}

/// Execute one delivery run
///
/// `Source::teardown` is invoked exactly once, regardless of which step
/// failed. A buffer that cannot be opened degrades the run (no durability
/// net) instead of aborting it; fetch failure and fresh-send failure are
/// the only terminal errors.
pub async fn deliver<So: Source, Si: Sink>(
    config: &DeliveryConfig,
    source: &mut So,
    sink: &mut Si,
) -> Result<DeliveryReport, DeliveryError> {
    let outcome = run(config, source, sink).await;
    source.teardown().await;
    outcome
}

async fn run<So: Source, Si: Sink>(
    config: &DeliveryConfig,
    source: &mut So,
    sink: &mut Si,
) -> Result<DeliveryReport, DeliveryError> {
    let start = Instant::now();
    let partition = source.kind().as_str();

    let mut buffer = match DurableBuffer::open(&config.buffer_path, config.buffer_options.clone())
    {
        Ok(buffer) => Some(buffer),
        Err(e) => {
            warn!(
                error = %e,
                path = %config.buffer_path.display(),
                "buffer unavailable; running without durability net"
            );
            None
        }
    };

    let mut report = DeliveryReport {
        buffer_available: buffer.is_some(),
        ..Default::default()
    };

    let fresh = match source.fetch().await {
        Ok(batch) => batch,
        Err(e) => {
            if let Some(buffer) = buffer {
                buffer.close();
            }
            return Err(DeliveryError::SourceFetch { source: e });
        }
    };
    report.fresh_metrics = fresh.len();
    info!(metrics = fresh.len(), partition, "fresh batch fetched");

    if let Some(buffer) = buffer.as_mut() {
        drain_backlog(buffer, partition, config.drain_limit, sink, &mut report).await;
    }

    let outcome = match sink.send(&fresh).await {
        Ok(()) => {
            info!(sink = sink.name(), metrics = fresh.len(), "fresh batch delivered");
            report.duration = start.elapsed();
            Ok(report)
        }
        Err(e) => {
            let buffered = match buffer.as_mut() {
                Some(buffer) => match buffer.write(partition, &fresh) {
                    Ok(key) => {
                        info!(%key, partition, "fresh batch buffered for replay");
                        true
                    }
                    Err(we) => {
                        error!(error = %we, "failed to buffer fresh batch; it is lost");
                        false
                    }
                },
                None => {
                    error!("buffer unavailable; undelivered fresh batch is lost");
                    false
                }
            };
            Err(DeliveryError::FreshSend { buffered, source: e })
        }
    };

    if let Some(buffer) = buffer {
        buffer.close();
    }
    outcome
}

/// Replay up to `limit` oldest backlog entries, deleting each on confirmed
/// delivery
///
/// Every failure here is recovered locally: a bad entry or a failing sink
/// never blocks delivery of the fresh batch.
async fn drain_backlog<Si: Sink>(
    buffer: &mut DurableBuffer,
    partition: &str,
    limit: usize,
    sink: &mut Si,
    report: &mut DeliveryReport,
) {
    let entries = match buffer.read_oldest(partition, limit) {
        Ok(entries) => entries,
        Err(BufferError::PartitionNotFound(_)) => {
            debug!(partition, "no backlog yet");
            return;
        }
        Err(e) => {
            warn!(error = %e, partition, "backlog unreadable; skipping drain this run");
            return;
        }
    };

    if entries.is_empty() {
        return;
    }
    info!(entries = entries.len(), partition, "draining backlog");

    for (key, batch) in entries {
        report.backlog_attempted += 1;
        match sink.send(&batch).await {
            Ok(()) => {
                report.backlog_delivered += 1;
                if let Err(e) = buffer.delete(partition, key) {
                    // entry stays resident and may be resent on a later
                    // run; acceptable under at-least-once semantics
                    warn!(%key, error = %e, "delivered entry could not be deleted");
                }
            }
            Err(e) => {
                warn!(%key, error = %e, "backlog entry delivery failed; kept for a later run");
            }
        }
    }
}
