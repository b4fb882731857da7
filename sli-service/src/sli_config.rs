//! Custom SLI queries from the configuration service

use std::collections::HashMap;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::{debug, info};

pub const SLI_RESOURCE_URI: &str = "prometheus/sli.yaml";

/// `prometheus/sli.yaml`
#[derive(Debug, Default, Deserialize)]
pub struct SliConfig {
    #[serde(default)]
    #[allow(dead_code)]
    pub spec_version: String,
    #[serde(default)]
    pub indicators: HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Resource {
    #[serde(default)]
    #[allow(dead_code)]
    resource_uri: String,
    #[serde(default)]
    resource_content: String,
}

#[async_trait]
pub trait ConfigurationStore: Send + Sync {
    /// Indicator name -> query template; empty when nothing is configured
    async fn get_sli_configuration(
        &self,
        project: &str,
        stage: &str,
        service: &str,
    ) -> Result<HashMap<String, String>>;
}

/// Reads `prometheus/sli.yaml` at project, stage and service level.
/// Later levels override keys of earlier ones.
pub struct HttpConfigurationStore {
    base_url: String,
    http: reqwest::Client,
}

impl HttpConfigurationStore {
    pub fn new(base_url: impl Into<String>, timeout_ms: u64) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .build()?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
        })
    }

    fn resource_urls(&self, project: &str, stage: &str, service: &str) -> [String; 3] {
        let uri = urlencoding::encode(SLI_RESOURCE_URI);
        let project_url = format!("{}/v1/project/{}", self.base_url, project);
        let stage_url = format!("{}/stage/{}", project_url, stage);
        let service_url = format!("{}/service/{}", stage_url, service);
        [
            format!("{}/resource/{}", project_url, uri),
            format!("{}/resource/{}", stage_url, uri),
            format!("{}/resource/{}", service_url, uri),
        ]
    }

    async fn fetch_resource(&self, url: &str) -> Result<Option<String>> {
        let resp = self
            .http
            .get(url)
            .send()
            .await
            .with_context(|| format!("configuration service unreachable: {}", url))?;

        if resp.status() == StatusCode::NOT_FOUND {
            debug!("no SLI resource at {}", url);
            return Ok(None);
        }
        let resource: Resource = resp
            .error_for_status()
            .with_context(|| format!("failed to fetch SLI resource {}", url))?
            .json()
            .await
            .with_context(|| format!("invalid resource payload from {}", url))?;

        Ok(Some(decode_resource_content(&resource.resource_content)))
    }
}

#[async_trait]
impl ConfigurationStore for HttpConfigurationStore {
    async fn get_sli_configuration(
        &self,
        project: &str,
        stage: &str,
        service: &str,
    ) -> Result<HashMap<String, String>> {
        info!("Checking for custom SLI queries");
        let mut queries = HashMap::new();
        for url in self.resource_urls(project, stage, service) {
            if let Some(content) = self.fetch_resource(&url).await? {
                let config = parse_sli_config(&content)
                    .with_context(|| format!("invalid {} at {}", SLI_RESOURCE_URI, url))?;
                queries.extend(config.indicators);
            }
        }
        Ok(queries)
    }
}

/// Resource content is base64 on current configuration services and plain
/// text on older ones.
pub fn decode_resource_content(content: &str) -> String {
    BASE64
        .decode(content.trim())
        .ok()
        .and_then(|bytes| String::from_utf8(bytes).ok())
        .unwrap_or_else(|| content.to_string())
}

pub fn parse_sli_config(content: &str) -> Result<SliConfig> {
    if content.trim().is_empty() {
        return Ok(SliConfig::default());
    }
    Ok(serde_yaml::from_str(content)?)
}
