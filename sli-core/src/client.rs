use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::{header::CONTENT_TYPE, StatusCode};
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::debug;

use crate::errors::{Result, SliError};

/// In-cluster Prometheus used when a project has no external instance
pub const DEFAULT_PROMETHEUS_URL: &str = "http://prometheus-service.monitoring.svc.cluster.local:8080";

#[derive(Clone, Debug)]
pub struct MetricsConfig {
    pub base_url: String,    // may embed user:password@
    pub timeout_ms: u64,     // per-query timeout
    pub accept_invalid_certs: bool,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_PROMETHEUS_URL.to_string(),
            timeout_ms: 5000,
            accept_invalid_certs: false,
        }
    }
}

/// Instant query response, `GET /api/v1/query`.
///
/// Missing and `null` fields both decode to their empty value.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct PromResponse {
    #[serde(default, deserialize_with = "null_as_default")]
    pub data: PromData,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct PromData {
    #[serde(default, rename = "resultType", deserialize_with = "null_as_default")]
    pub result_type: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub result: Vec<PromSample>,
}

/// One vector sample; `value` is `[timestamp, "number"]`
#[derive(Clone, Debug, Default, Deserialize)]
pub struct PromSample {
    #[serde(default, deserialize_with = "null_as_default")]
    pub metric: HashMap<String, String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub value: Vec<Value>,
}

fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl PromResponse {
    /// Value of the first sample.
    ///
    /// An empty result vector is how Prometheus reports "no samples" (an
    /// error rate of zero, for instance), so it reads as `0.0`. A value that
    /// is not a number also reads as `0.0`; see [`parse_or_default`].
    pub fn scalar(&self) -> f64 {
        self.data
            .result
            .first()
            .and_then(|sample| sample.value.get(1))
            .map(parse_or_default)
            .unwrap_or(0.0)
    }
}

/// Parse a sample value, treating anything unparseable as absent data (`0.0`).
///
/// Intentionally permissive: Prometheus encodes values as strings, and an
/// unexpected encoding is not reported as a fault.
pub fn parse_or_default(value: &Value) -> f64 {
    match value {
        Value::String(s) => s.parse::<f64>().unwrap_or(0.0),
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        _ => 0.0,
    }
}

#[derive(Clone)]
pub struct MetricsClient {
    cfg: MetricsConfig,
    http: reqwest::Client,
}

impl MetricsClient {
    pub fn new(cfg: MetricsConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(cfg.timeout_ms))
            .danger_accept_invalid_certs(cfg.accept_invalid_certs)
            .build()?;
        Ok(Self { cfg, http })
    }

    /// Run an instant query evaluated at `time` (Unix seconds)
    pub async fn query_instant(&self, query: &str, time: i64) -> Result<PromResponse> {
        let url = format!("{}/api/v1/query", self.cfg.base_url.trim_end_matches('/'));
        let time = time.to_string();

        let resp = self
            .http
            .get(&url)
            .query(&[("query", query), ("time", time.as_str())])
            .header(CONTENT_TYPE, "application/json")
            .send()
            .await?;

        let status = resp.status();
        if status != StatusCode::OK {
            debug!(status = status.as_u16(), "prometheus returned non-success status");
            return Err(SliError::NonSuccessStatus(status.as_u16()));
        }

        let body = resp.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }

    /// Fetch the single scalar an SLI query evaluates to at `end`
    pub async fn fetch_scalar(&self, query: &str, end: DateTime<Utc>) -> Result<f64> {
        let resp = self.query_instant(query, end.timestamp()).await?;
        Ok(resp.scalar())
    }
}
