//! # Integration Tests
//!
//! End-to-end delivery scenarios across simulated shipper invocations.
//!
//! Covers:
//! - clean runs, failure runs and recovery runs against one buffer file
//! - crash-safety and exclusive-ownership behavior of the durable buffer
//! - at-least-once accounting observed from the sink side

#[cfg(test)]
mod config_tests {
    use config_loader::{ConfigFormat, ConfigLoader};
    use contracts::{SinkKind, SourceKind};

    const FULL_TOML: &str = r#"
target = "web01"
source = "command"
sink = "zabbix"

[buffer]
path = "/var/lib/courier/web01.db"
drain_limit = 25

[command]
command = "/usr/local/bin/collect-metrics --fast"

[zabbix]
server = "zabbix.internal"
port = 10051
host = "web01.prod"
"#;

    #[test]
    fn test_full_config_builds_source_and_sink() {
        let config = ConfigLoader::load_from_str(FULL_TOML, ConfigFormat::Toml).unwrap();
        assert_eq!(config.source, SourceKind::Command);
        assert_eq!(config.sink, SinkKind::Zabbix);
        assert_eq!(config.buffer.drain_limit, 25);
        assert_eq!(config.partition(), "command");

        assert!(sources::create_source(&config).is_ok());
        assert!(delivery::create_sink(&config).is_ok());
    }

    #[test]
    fn test_json_config_accepted() {
        let json = r#"{
            "target": "web01",
            "source": "mock",
            "sink": "log"
        }"#;
        let config = ConfigLoader::load_from_str(json, ConfigFormat::Json).unwrap();
        assert_eq!(config.source, SourceKind::Mock);
        assert!(config.buffer_path().ends_with("web01_metrics.db"));
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::path::PathBuf;
    use std::time::Duration;

    use chrono::{TimeZone, Utc};
    use contracts::{Metric, MetricBatch};
    use delivery::{deliver, sinks::MockSink, DeliveryConfig, DeliveryError};
    use durable_buffer::{BufferError, BufferOptions, DurableBuffer};
    use sources::MockSource;
    use tempfile::TempDir;

    fn batch(names: &[&str]) -> MetricBatch {
        let t0 = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        MetricBatch::from(
            names
                .iter()
                .enumerate()
                .map(|(i, name)| Metric::new(*name, t0, i as f64))
                .collect::<Vec<_>>(),
        )
    }

    fn config(path: PathBuf) -> DeliveryConfig {
        DeliveryConfig {
            buffer_path: path,
            buffer_options: BufferOptions::default(),
            drain_limit: 10,
        }
    }

    fn backlog_len(path: &PathBuf) -> usize {
        let buffer = DurableBuffer::open(path, BufferOptions::default()).unwrap();
        match buffer.read_oldest("mock", 0) {
            Ok(entries) => entries.len(),
            Err(BufferError::PartitionNotFound(_)) => 0,
            Err(e) => panic!("unexpected buffer error: {e}"),
        }
    }

    /// Healthy source and sink: exactly one send, nothing persisted.
    #[tokio::test]
    async fn test_clean_delivery_leaves_no_residue() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("metrics.db");

        let mut source = MockSource::with_batch(batch(&["cpu.user", "cpu.idle"]));
        let mut sink = MockSink::ok();
        let attempts = sink.attempts();

        let report = deliver(&config(path.clone()), &mut source, &mut sink)
            .await
            .unwrap();

        assert_eq!(report.fresh_metrics, 2);
        assert_eq!(report.backlog_attempted, 0);
        assert!(report.buffer_available);
        assert_eq!(attempts.lock().unwrap().len(), 1);
        assert_eq!(backlog_len(&path), 0);
    }

    /// Sink outage across three runs, then recovery: every buffered batch
    /// is replayed oldest-first before the recovery run's fresh batch.
    #[tokio::test]
    async fn test_outage_then_recovery_drains_in_order() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("metrics.db");

        for run in 0..3 {
            let name = format!("load.avg{run}");
            let mut source = MockSource::with_batch(batch(&[name.as_str()]));
            let mut sink = MockSink::failing();
            let err = deliver(&config(path.clone()), &mut source, &mut sink)
                .await
                .unwrap_err();
            assert!(matches!(err, DeliveryError::FreshSend { buffered: true, .. }));
        }
        assert_eq!(backlog_len(&path), 3);

        let mut source = MockSource::with_batch(batch(&["load.avg3"]));
        let mut sink = MockSink::ok();
        let attempts = sink.attempts();
        let report = deliver(&config(path.clone()), &mut source, &mut sink)
            .await
            .unwrap();

        assert_eq!(report.backlog_attempted, 3);
        assert_eq!(report.backlog_delivered, 3);
        assert_eq!(backlog_len(&path), 0);

        let attempts = attempts.lock().unwrap();
        let first_names: Vec<String> = attempts
            .iter()
            .map(|b| b.iter().next().unwrap().name.clone())
            .collect();
        assert_eq!(first_names, ["load.avg0", "load.avg1", "load.avg2", "load.avg3"]);
    }

    /// The drain limit bounds replay per run; the remainder waits.
    #[tokio::test]
    async fn test_drain_limit_bounds_each_run() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("metrics.db");

        {
            let mut buffer = DurableBuffer::open(&path, BufferOptions::default()).unwrap();
            for i in 0..5 {
                let name = format!("m{i}");
                buffer.write("mock", &batch(&[name.as_str()])).unwrap();
            }
            buffer.close();
        }

        let limited = DeliveryConfig {
            buffer_path: path.clone(),
            buffer_options: BufferOptions::default(),
            drain_limit: 2,
        };

        let mut source = MockSource::with_batch(batch(&["fresh"]));
        let mut sink = MockSink::ok();
        let report = deliver(&limited, &mut source, &mut sink).await.unwrap();
        assert_eq!(report.backlog_attempted, 2);
        assert_eq!(backlog_len(&path), 3);

        let mut source = MockSource::with_batch(batch(&["fresh"]));
        let mut sink = MockSink::ok();
        let report = deliver(&limited, &mut source, &mut sink).await.unwrap();
        assert_eq!(report.backlog_attempted, 2);
        assert_eq!(backlog_len(&path), 1);
    }

    /// Another process holds the buffer: the run degrades, still attempts
    /// the fresh send, and persists nothing.
    #[tokio::test]
    async fn test_held_buffer_degrades_run() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("metrics.db");
        let _held = DurableBuffer::open(&path, BufferOptions::default()).unwrap();

        let degraded = DeliveryConfig {
            buffer_path: path.clone(),
            buffer_options: BufferOptions {
                lock_wait: Duration::from_millis(100),
                ..Default::default()
            },
            drain_limit: 10,
        };

        // healthy sink: delivery succeeds without the buffer
        let mut source = MockSource::with_batch(batch(&["cpu.user"]));
        let mut sink = MockSink::ok();
        let report = deliver(&degraded, &mut source, &mut sink).await.unwrap();
        assert!(!report.buffer_available);
        assert_eq!(report.fresh_metrics, 1);

        // failing sink: the batch is reported lost, not silently dropped
        let mut source = MockSource::with_batch(batch(&["cpu.user"]));
        let mut sink = MockSink::failing();
        let err = deliver(&degraded, &mut source, &mut sink).await.unwrap_err();
        assert!(matches!(
            err,
            DeliveryError::FreshSend { buffered: false, .. }
        ));
    }

    /// A sink that accepts an entry and then dies before deletion causes a
    /// resend next run: at-least-once, observed from the sink side.
    #[tokio::test]
    async fn test_at_least_once_across_runs() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("metrics.db");

        // run 1: fresh send fails, batch buffered
        let mut source = MockSource::with_batch(batch(&["disk.used"]));
        let mut sink = MockSink::failing();
        let first_attempts = sink.attempts();
        let _ = deliver(&config(path.clone()), &mut source, &mut sink)
            .await
            .unwrap_err();
        assert_eq!(first_attempts.lock().unwrap().len(), 1);

        // runs 2 and 3 share one attempt log: the backlog entry fails once
        // more in run 2, then lands in run 3
        let mut sink = MockSink::fail_n_times(1);
        let attempts = sink.attempts();

        let mut source = MockSource::with_batch(batch(&["fresh2"]));
        let report = deliver(&config(path.clone()), &mut source, &mut sink)
            .await
            .unwrap();
        assert_eq!(report.backlog_attempted, 1);
        assert_eq!(report.backlog_delivered, 0);
        assert_eq!(backlog_len(&path), 1);

        let mut sink = sink.successor();
        let mut source = MockSource::with_batch(batch(&["fresh3"]));
        let report = deliver(&config(path.clone()), &mut source, &mut sink)
            .await
            .unwrap();
        assert_eq!(report.backlog_delivered, 1);
        assert_eq!(backlog_len(&path), 0);

        // the buffered batch was attempted in every run that saw it
        let seen: Vec<String> = attempts
            .lock()
            .unwrap()
            .iter()
            .map(|b| b.iter().next().unwrap().name.clone())
            .collect();
        assert_eq!(seen, ["disk.used", "fresh2", "disk.used", "fresh3"]);
    }

    /// Source failure is terminal: nothing is sent, nothing is buffered,
    /// existing backlog is untouched.
    #[tokio::test]
    async fn test_source_failure_preserves_backlog() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("metrics.db");

        {
            let mut buffer = DurableBuffer::open(&path, BufferOptions::default()).unwrap();
            buffer.write("mock", &batch(&["old"])).unwrap();
            buffer.close();
        }

        let mut source = MockSource::failing("collector crashed");
        let mut sink = MockSink::ok();
        let err = deliver(&config(path.clone()), &mut source, &mut sink)
            .await
            .unwrap_err();

        assert!(matches!(err, DeliveryError::SourceFetch { .. }));
        assert!(sink.attempts().lock().unwrap().is_empty());
        assert_eq!(backlog_len(&path), 1);
    }

    /// Buffered batches survive arbitrary interleavings of open and close,
    /// and keys keep ascending across reopens.
    #[tokio::test]
    async fn test_backlog_survives_reopen_with_ascending_keys() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("metrics.db");

        let mut keys = Vec::new();
        for i in 0..4 {
            let mut buffer = DurableBuffer::open(&path, BufferOptions::default()).unwrap();
            let name = format!("m{i}");
            keys.push(buffer.write("mock", &batch(&[name.as_str()])).unwrap());
            buffer.close();
        }

        let mut windows = keys.windows(2);
        assert!(windows.all(|w| w[0] < w[1]));

        let buffer = DurableBuffer::open(&path, BufferOptions::default()).unwrap();
        let entries = buffer.read_oldest("mock", 0).unwrap();
        assert_eq!(entries.len(), 4);
        let read_keys: Vec<_> = entries.iter().map(|(k, _)| *k).collect();
        assert_eq!(read_keys, keys);
    }
}
