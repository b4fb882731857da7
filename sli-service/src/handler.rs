//! get-sli event processing
//!
//! started event -> endpoint and custom query lookup -> per-indicator fetch
//! -> finished event. Lookup failures abort the batch and are reported in an
//! errored finished event; indicator failures are reported per indicator.

use std::sync::Arc;

use anyhow::{anyhow, bail, Context, Result};
use sli_core::{retrieve_indicators, IndicatorResult, MetricsClient, MetricsConfig, QueryContext};
use tracing::{error, info, warn};

use crate::credentials::{resolve_api_url, CredentialStore};
use crate::event::{
    CloudEvent, EventData, GetSliFinished, GetSliFinishedEventData, GetSliStartedEventData,
    GetSliTriggeredEventData, GET_SLI_FINISHED, GET_SLI_STARTED, GET_SLI_TRIGGERED, SLI_PROVIDER,
};
use crate::event_sender::EventSender;
use crate::sli_config::ConfigurationStore;

#[derive(Clone, Debug)]
pub struct HandlerSettings {
    pub default_prometheus_url: String,
    pub metrics_timeout_ms: u64,
    pub accept_invalid_certs: bool,
    pub fetch_concurrency: usize,
}

pub struct SliHandler {
    credentials: Arc<dyn CredentialStore>,
    configuration: Arc<dyn ConfigurationStore>,
    sender: Arc<dyn EventSender>,
    settings: HandlerSettings,
}

impl SliHandler {
    pub fn new(
        credentials: Arc<dyn CredentialStore>,
        configuration: Arc<dyn ConfigurationStore>,
        sender: Arc<dyn EventSender>,
        settings: HandlerSettings,
    ) -> Self {
        Self {
            credentials,
            configuration,
            sender,
            settings,
        }
    }

    /// Entry point for every received event
    pub async fn handle_event(&self, event: CloudEvent) -> Result<()> {
        if event.event_type != GET_SLI_TRIGGERED {
            bail!("received unknown event type");
        }
        self.process_event(event).await
    }

    async fn process_event(&self, event: CloudEvent) -> Result<()> {
        let data: GetSliTriggeredEventData = event
            .data_as()
            .context("could not decode get-sli.triggered data")?;

        if event.shkeptncontext.is_none() {
            bail!("could not determine keptnContext of input event");
        }

        if data.get_sli.sli_provider != SLI_PROVIDER {
            info!(
                "SLI provider {} is not handled by this service",
                data.get_sli.sli_provider
            );
            return Ok(());
        }

        let started = GetSliStartedEventData {
            event: EventData::succeeded(&data),
        };
        if let Err(e) = self.emit(GET_SLI_STARTED, &event, &started).await {
            warn!("failed to send get-sli.started event: {:#}", e);
        }

        let finished = match self.retrieve_metrics(&data).await {
            Ok(indicator_values) => {
                finished_data(EventData::succeeded(&data), &data, indicator_values)
            }
            Err(e) => {
                error!("failed to retrieve metrics: {:#}", e);
                finished_data(EventData::errored(&data, format!("{:#}", e)), &data, Vec::new())
            }
        };

        self.emit(GET_SLI_FINISHED, &event, &finished).await
    }

    /// Resolve endpoint and custom queries, then fetch every indicator
    pub async fn retrieve_metrics(
        &self,
        data: &GetSliTriggeredEventData,
    ) -> Result<Vec<IndicatorResult>> {
        info!("Retrieving Prometheus metrics");

        let api_url = resolve_api_url(
            self.credentials.as_ref(),
            &data.project,
            &self.settings.default_prometheus_url,
        )
        .await?;

        let client = MetricsClient::new(MetricsConfig {
            base_url: api_url,
            timeout_ms: self.settings.metrics_timeout_ms,
            accept_invalid_certs: self.settings.accept_invalid_certs,
        })
        .map_err(|e| anyhow!("could not create prometheus client: {}", e))?;

        let custom_queries = self
            .configuration
            .get_sli_configuration(&data.project, &data.stage, &data.service)
            .await
            .with_context(|| format!("Failed to get custom queries for project {}", data.project))?;

        let ctx = QueryContext::new(&data.project, &data.stage, &data.service)
            .with_filters(data.get_sli.custom_filters.clone())
            .with_custom_queries(custom_queries);

        Ok(retrieve_indicators(
            &client,
            &ctx,
            &data.get_sli.indicators,
            &data.get_sli.start,
            &data.get_sli.end,
            self.settings.fetch_concurrency,
        )
        .await)
    }

    async fn emit<T: serde::Serialize + Sync>(
        &self,
        event_type: &str,
        triggered: &CloudEvent,
        data: &T,
    ) -> Result<()> {
        let event = CloudEvent::reply(event_type, triggered, data)?;
        self.sender.send(&event).await
    }
}

fn finished_data(
    event: EventData,
    data: &GetSliTriggeredEventData,
    indicator_values: Vec<IndicatorResult>,
) -> GetSliFinishedEventData {
    GetSliFinishedEventData {
        event,
        get_sli: GetSliFinished {
            start: data.get_sli.start.clone(),
            end: data.get_sli.end.clone(),
            indicator_values,
        },
    }
}
