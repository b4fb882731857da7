//! CloudEvents envelope and get-sli event payloads

use std::collections::HashMap;

use chrono::Utc;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use sli_core::{IndicatorResult, LabelFilter};
use uuid::Uuid;

pub const SERVICE_NAME: &str = "prometheus-sli-service";
pub const SLI_PROVIDER: &str = "prometheus";

pub const GET_SLI_TRIGGERED: &str = "sh.keptn.event.get-sli.triggered";
pub const GET_SLI_STARTED: &str = "sh.keptn.event.get-sli.started";
pub const GET_SLI_FINISHED: &str = "sh.keptn.event.get-sli.finished";

const SPEC_VERSION: &str = "1.0";
const APPLICATION_JSON: &str = "application/json";

/// Structured-mode CloudEvent with the Keptn extensions
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CloudEvent {
    pub specversion: String,
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: String,
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datacontenttype: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shkeptncontext: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub triggeredid: Option<String>,
    #[serde(default)]
    pub data: Value,
}

impl CloudEvent {
    /// New outbound event answering `triggered`
    pub fn reply<T: Serialize>(
        event_type: &str,
        triggered: &CloudEvent,
        data: &T,
    ) -> serde_json::Result<Self> {
        Ok(Self {
            specversion: SPEC_VERSION.to_string(),
            id: Uuid::new_v4().to_string(),
            event_type: event_type.to_string(),
            source: SERVICE_NAME.to_string(),
            datacontenttype: Some(APPLICATION_JSON.to_string()),
            time: Some(Utc::now().to_rfc3339()),
            shkeptncontext: triggered.shkeptncontext.clone(),
            triggeredid: Some(triggered.id.clone()),
            data: serde_json::to_value(data)?,
        })
    }

    pub fn data_as<T: DeserializeOwned>(&self) -> serde_json::Result<T> {
        serde_json::from_value(self.data.clone())
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct GetSliTriggeredEventData {
    pub project: String,
    pub stage: String,
    pub service: String,
    #[serde(default)]
    pub labels: HashMap<String, String>,
    #[serde(rename = "getSLI")]
    pub get_sli: GetSli,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetSli {
    #[serde(default)]
    pub sli_provider: String,
    pub start: String,
    pub end: String,
    #[serde(default)]
    pub indicators: Vec<String>,
    #[serde(default)]
    pub custom_filters: Vec<LabelFilter>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Succeeded,
    Errored,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Pass,
    Fail,
}

/// Fields shared by started and finished events
#[derive(Clone, Debug, Serialize)]
pub struct EventData {
    pub project: String,
    pub stage: String,
    pub service: String,
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub labels: HashMap<String, String>,
    pub status: Status,
    pub result: Outcome,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub message: String,
}

impl EventData {
    pub fn succeeded(triggered: &GetSliTriggeredEventData) -> Self {
        Self {
            project: triggered.project.clone(),
            stage: triggered.stage.clone(),
            service: triggered.service.clone(),
            labels: triggered.labels.clone(),
            status: Status::Succeeded,
            result: Outcome::Pass,
            message: String::new(),
        }
    }

    pub fn errored(triggered: &GetSliTriggeredEventData, message: impl Into<String>) -> Self {
        Self {
            status: Status::Errored,
            result: Outcome::Fail,
            message: message.into(),
            ..Self::succeeded(triggered)
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct GetSliStartedEventData {
    #[serde(flatten)]
    pub event: EventData,
}

#[derive(Clone, Debug, Serialize)]
pub struct GetSliFinishedEventData {
    #[serde(flatten)]
    pub event: EventData,
    #[serde(rename = "getSLI")]
    pub get_sli: GetSliFinished,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GetSliFinished {
    pub start: String,
    pub end: String,
    pub indicator_values: Vec<IndicatorResult>,
}
