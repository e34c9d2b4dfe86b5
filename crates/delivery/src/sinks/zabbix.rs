//! ZabbixSink - zabbix sender (trapper) protocol over TCP
//!
//! One connection per send. The payload is the JSON sender request framed
//! with the `ZBXD\x01` header and a little-endian u64 body length; the
//! server's reply carries a `processed: N; failed: M` info string.

use std::sync::OnceLock;

use contracts::{ContractError, MetricBatch, MetricValue, Sink};
use regex::Regex;
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::debug;

const HEADER: &[u8; 5] = b"ZBXD\x01";

/// Covers both "processed: 1; failed: 0" and the older
/// "Processed 1 Failed 0" info wording
fn info_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)processed:?\s*(\d+)[;,]?\s*failed:?\s*(\d+)").expect("valid regex literal")
    })
}

#[derive(Serialize)]
struct SenderItem<'a> {
    host: &'a str,
    key: &'a str,
    value: String,
    clock: i64,
}

#[derive(Serialize)]
struct SenderRequest<'a> {
    request: &'static str,
    data: Vec<SenderItem<'a>>,
}

#[derive(Deserialize)]
struct SenderResponse {
    response: String,
    info: String,
}

/// Sink that pushes batches to a Zabbix server/proxy trapper port
pub struct ZabbixSink {
    name: String,
    server: String,
    port: u16,
    host: String,
}

impl ZabbixSink {
    /// Create a sink for `server:port`, reporting items under `host`
    pub fn new(server: impl Into<String>, port: u16, host: impl Into<String>) -> Self {
        Self {
            name: "zabbix".to_string(),
            server: server.into(),
            port,
            host: host.into(),
        }
    }

    fn build_request<'a>(&'a self, batch: &'a MetricBatch) -> SenderRequest<'a> {
        let data = batch
            .iter()
            .map(|m| SenderItem {
                host: &self.host,
                key: &m.name,
                value: render_value(&m.value),
                clock: m.time.timestamp(),
            })
            .collect();

        SenderRequest {
            request: "sender data",
            data,
        }
    }

    fn frame(body: &[u8]) -> Vec<u8> {
        let mut packet = Vec::with_capacity(HEADER.len() + 8 + body.len());
        packet.extend_from_slice(HEADER);
        packet.extend_from_slice(&(body.len() as u64).to_le_bytes());
        packet.extend_from_slice(body);
        packet
    }

    fn parse_info(&self, info: &str) -> Option<(u64, u64)> {
        let caps = info_regex().captures(info)?;
        let processed = caps.get(1)?.as_str().parse().ok()?;
        let failed = caps.get(2)?.as_str().parse().ok()?;
        Some((processed, failed))
    }

    async fn exchange(&self, packet: &[u8]) -> Result<SenderResponse, ContractError> {
        let mut stream = TcpStream::connect((self.server.as_str(), self.port))
            .await
            .map_err(|e| {
                ContractError::sink_connection(
                    &self.name,
                    format!("connect {}:{}: {e}", self.server, self.port),
                )
            })?;

        stream
            .write_all(packet)
            .await
            .map_err(|e| ContractError::sink_send(&self.name, format!("write: {e}")))?;

        let mut header = [0u8; 5];
        stream
            .read_exact(&mut header)
            .await
            .map_err(|e| ContractError::sink_send(&self.name, format!("read header: {e}")))?;
        if &header != HEADER {
            return Err(ContractError::sink_send(&self.name, "invalid response header"));
        }

        let mut len = [0u8; 8];
        stream
            .read_exact(&mut len)
            .await
            .map_err(|e| ContractError::sink_send(&self.name, format!("read length: {e}")))?;
        let len = u64::from_le_bytes(len) as usize;

        let mut body = vec![0u8; len];
        stream
            .read_exact(&mut body)
            .await
            .map_err(|e| ContractError::sink_send(&self.name, format!("read body: {e}")))?;

        serde_json::from_slice(&body)
            .map_err(|e| ContractError::sink_send(&self.name, format!("decode response: {e}")))
    }
}

impl Sink for ZabbixSink {
    fn name(&self) -> &str {
        &self.name
    }

    async fn send(&mut self, batch: &MetricBatch) -> Result<(), ContractError> {
        let request = self.build_request(batch);
        let body = serde_json::to_vec(&request)
            .map_err(|e| ContractError::sink_send(&self.name, format!("encode request: {e}")))?;

        let response = self.exchange(&Self::frame(&body)).await?;

        if response.response != "success" {
            return Err(ContractError::sink_send(
                &self.name,
                format!("server replied '{}': {}", response.response, response.info),
            ));
        }

        match self.parse_info(&response.info) {
            Some((processed, failed)) => {
                debug!(processed, failed, "zabbix server accepted batch");
                if processed == 0 {
                    return Err(ContractError::sink_send(
                        &self.name,
                        format!("server processed no items: {}", response.info),
                    ));
                }
                Ok(())
            }
            None => Err(ContractError::sink_send(
                &self.name,
                format!("unrecognized response info: {}", response.info),
            )),
        }
    }
}

/// Numbers are rounded to four decimals (server-side item formats are
/// typically fixed-precision); text passes through untouched
fn render_value(value: &MetricValue) -> String {
    match value {
        MetricValue::Number(n) => format!("{n:.4}"),
        MetricValue::Text(s) => s.clone(),
    }
}
