//! CommandSource - metrics from an external command's stdout
//!
//! One metric per line: `name value [unix_timestamp]`, whitespace
//! separated. Lines that fail to parse are skipped with a debug log; a
//! plugin emitting one bad line does not poison the batch.

use chrono::{DateTime, TimeZone, Utc};
use contracts::{ContractError, Metric, MetricBatch, Source, SourceKind};
use tracing::{debug, warn};

/// Source that runs a configured command once per invocation
pub struct CommandSource {
    argv: Vec<String>,
}

impl CommandSource {
    /// Create from a whitespace-split command line
    pub fn new(command_line: &str) -> Result<Self, ContractError> {
        let argv: Vec<String> = command_line.split_whitespace().map(String::from).collect();
        if argv.is_empty() {
            return Err(ContractError::config_validation(
                "command.command",
                "empty command line",
            ));
        }
        Ok(Self { argv })
    }

    async fn run_command(&self) -> Result<String, ContractError> {
        let output = tokio::process::Command::new(&self.argv[0])
            .args(&self.argv[1..])
            .output()
            .await
            .map_err(|e| {
                ContractError::source_fetch(
                    SourceKind::Command.as_str(),
                    format!("failed to run '{}': {e}", self.argv[0]),
                )
            })?;

        if !output.status.success() {
            // stdout is still parsed; plugins may emit partial results
            warn!(
                command = %self.argv[0],
                status = %output.status,
                "command exited non-zero"
            );
        }

        String::from_utf8(output.stdout).map_err(|e| {
            ContractError::source_fetch(
                SourceKind::Command.as_str(),
                format!("command output is not utf-8: {e}"),
            )
        })
    }

    fn parse_output(stdout: &str, now: DateTime<Utc>) -> MetricBatch {
        let mut batch = MetricBatch::new();
        for line in stdout.lines() {
            let fields: Vec<&str> = line.split_whitespace().collect();
            if fields.len() < 2 {
                if !fields.is_empty() {
                    debug!(line, "skipping line without a value field");
                }
                continue;
            }

            let value: f64 = match fields[1].parse() {
                Ok(v) => v,
                Err(e) => {
                    debug!(line, error = %e, "skipping line with unparsable value");
                    continue;
                }
            };

            let time = if fields.len() > 2 {
                match fields[2].parse::<i64>() {
                    Ok(secs) => match Utc.timestamp_opt(secs, 0).single() {
                        Some(t) => t,
                        None => {
                            debug!(line, "skipping line with out-of-range timestamp");
                            continue;
                        }
                    },
                    Err(e) => {
                        debug!(line, error = %e, "skipping line with unparsable timestamp");
                        continue;
                    }
                }
            } else {
                now
            };

            batch.push(Metric::new(fields[0], time, value));
        }
        batch
    }
}

impl Source for CommandSource {
    fn kind(&self) -> SourceKind {
        SourceKind::Command
    }

    async fn fetch(&mut self) -> Result<MetricBatch, ContractError> {
        let stdout = self.run_command().await?;
        let batch = Self::parse_output(&stdout, Utc::now());
        debug!(metrics = batch.len(), "command source fetched");
        Ok(batch)
    }

    async fn teardown(&mut self) {
        // no held resources; the command exits within fetch
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::MetricValue;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_parse_name_value_lines() {
        let batch = CommandSource::parse_output("cpu.user 42.5\ncpu.idle 57.5\n", now());
        assert_eq!(batch.len(), 2);
        let metrics: Vec<_> = batch.iter().collect();
        assert_eq!(metrics[0].name, "cpu.user");
        assert_eq!(metrics[0].value, MetricValue::Number(42.5));
        assert_eq!(metrics[0].time, now());
    }

    #[test]
    fn test_parse_explicit_timestamp() {
        let batch = CommandSource::parse_output("disk.used 12.0 1714560000\n", now());
        assert_eq!(batch.len(), 1);
        let metric = batch.iter().next().unwrap();
        assert_eq!(metric.time.timestamp(), 1714560000);
    }

    #[test]
    fn test_parse_skips_garbage_lines() {
        let out = "cpu.user 42.5\nnoise\nbad not-a-number\nlate 1.0 not-a-ts\ncpu.idle 57.5\n";
        let batch = CommandSource::parse_output(out, now());
        assert_eq!(batch.len(), 2);
    }

    #[test]
    fn test_empty_command_rejected() {
        assert!(CommandSource::new("   ").is_err());
    }

    #[tokio::test]
    async fn test_fetch_runs_command() {
        let mut source = CommandSource::new("echo cpu.user 42.5").unwrap();
        let batch = source.fetch().await.unwrap();
        assert_eq!(batch.len(), 1);
        assert_eq!(batch.iter().next().unwrap().name, "cpu.user");
    }

    #[tokio::test]
    async fn test_fetch_missing_binary_fails() {
        let mut source = CommandSource::new("/nonexistent/collector").unwrap();
        let err = source.fetch().await.unwrap_err();
        assert!(matches!(err, ContractError::SourceFetch { .. }));
    }
}
