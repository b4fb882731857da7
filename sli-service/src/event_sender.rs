use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;

use crate::event::CloudEvent;

const CLOUDEVENTS_JSON: &str = "application/cloudevents+json";

#[async_trait]
pub trait EventSender: Send + Sync {
    async fn send(&self, event: &CloudEvent) -> Result<()>;
}

/// Posts structured-mode CloudEvents to the event broker
pub struct HttpEventSender {
    url: String,
    http: reqwest::Client,
}

impl HttpEventSender {
    pub fn new(url: impl Into<String>, timeout_ms: u64) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .build()?;
        Ok(Self {
            url: url.into(),
            http,
        })
    }
}

#[async_trait]
impl EventSender for HttpEventSender {
    async fn send(&self, event: &CloudEvent) -> Result<()> {
        let body = serde_json::to_vec(event)?;
        self.http
            .post(&self.url)
            .header(CONTENT_TYPE, CLOUDEVENTS_JSON)
            .body(body)
            .send()
            .await
            .with_context(|| format!("event broker unreachable: {}", self.url))?
            .error_for_status()
            .with_context(|| format!("event broker rejected {}", event.event_type))?;
        Ok(())
    }
}
