//! MackerelSink - service metrics over the Mackerel HTTP API
//!
//! Posts numeric metrics to `/api/v0/services/{service}/tsdb`. Text values
//! have no representation in the service-metrics API and are skipped with a
//! warning.

use std::time::Duration;

use contracts::{ContractError, MetricBatch, MetricValue, Sink};
use serde::Serialize;
use tracing::{debug, warn};

const DEFAULT_API_BASE: &str = "https://api.mackerelio.com";

#[derive(Serialize)]
struct ServiceMetricValue<'a> {
    name: &'a str,
    time: i64,
    value: f64,
}

/// Sink that posts batches to a Mackerel service
pub struct MackerelSink {
    name: String,
    client: reqwest::Client,
    api_base: String,
    api_key: String,
    service: String,
}

impl MackerelSink {
    /// Create a sink posting to the given service
    pub fn new(api_key: impl Into<String>, service: impl Into<String>) -> Result<Self, ContractError> {
        Self::with_api_base(api_key, service, DEFAULT_API_BASE)
    }

    /// Create a sink against a non-default API endpoint (used by tests)
    pub fn with_api_base(
        api_key: impl Into<String>,
        service: impl Into<String>,
        api_base: impl Into<String>,
    ) -> Result<Self, ContractError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| ContractError::sink_connection("mackerel", e.to_string()))?;

        Ok(Self {
            name: "mackerel".to_string(),
            client,
            api_base: api_base.into(),
            api_key: api_key.into(),
            service: service.into(),
        })
    }

    fn build_payload<'a>(&self, batch: &'a MetricBatch) -> Vec<ServiceMetricValue<'a>> {
        let mut payload = Vec::with_capacity(batch.len());
        for metric in batch {
            match metric.value {
                MetricValue::Number(value) => payload.push(ServiceMetricValue {
                    name: &metric.name,
                    time: metric.time.timestamp(),
                    value,
                }),
                MetricValue::Text(_) => {
                    warn!(
                        sink = %self.name,
                        metric = %metric.name,
                        "text value has no service-metric representation; skipped"
                    );
                }
            }
        }
        payload
    }
}

impl Sink for MackerelSink {
    fn name(&self) -> &str {
        &self.name
    }

    async fn send(&mut self, batch: &MetricBatch) -> Result<(), ContractError> {
        let payload = self.build_payload(batch);
        if payload.is_empty() {
            debug!(sink = %self.name, "no numeric metrics in batch; nothing to post");
            return Ok(());
        }

        let url = format!(
            "{}/api/v0/services/{}/tsdb",
            self.api_base.trim_end_matches('/'),
            self.service
        );

        let response = self
            .client
            .post(&url)
            .header("X-Api-Key", &self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| ContractError::sink_connection(&self.name, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ContractError::sink_send(
                &self.name,
                format!("api replied {status}: {body}"),
            ));
        }

        debug!(sink = %self.name, metrics = payload.len(), "service metrics posted");
        Ok(())
    }
}
