//! Per-indicator fetching and aggregation into results

use futures::{stream, StreamExt};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::client::MetricsClient;
use crate::errors::Result;
use crate::query::{build_query, QueryContext};
use crate::time_window::TimeWindow;

pub const NAN_MESSAGE: &str = "SLI value is NaN";
/// `+Inf`/`-Inf` samples have no JSON number representation
pub const INFINITE_MESSAGE: &str = "SLI value is infinite";

/// Outcome for one requested indicator
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct IndicatorResult {
    pub metric: String,
    pub value: f64,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl IndicatorResult {
    pub fn ok(metric: &str, value: f64) -> Self {
        Self {
            metric: metric.to_string(),
            value,
            success: true,
            message: None,
        }
    }

    pub fn failed(metric: &str, message: impl Into<String>) -> Self {
        Self {
            metric: metric.to_string(),
            value: 0.0,
            success: false,
            message: Some(message.into()),
        }
    }
}

/// Build and run the query for a single indicator
pub async fn get_sli_value(
    client: &MetricsClient,
    indicator: &str,
    ctx: &QueryContext,
    start: &str,
    end: &str,
) -> Result<f64> {
    let window = TimeWindow::parse(start, end)?;
    let query = build_query(indicator, ctx, &window)?;
    debug!(indicator, %query, "querying prometheus");
    client.fetch_scalar(&query, window.end).await
}

/// Fetch every indicator, one result per name in request order.
///
/// A failing indicator never aborts the batch. `concurrency` bounds the
/// number of queries in flight; `1` fetches sequentially.
pub async fn retrieve_indicators(
    client: &MetricsClient,
    ctx: &QueryContext,
    indicators: &[String],
    start: &str,
    end: &str,
    concurrency: usize,
) -> Vec<IndicatorResult> {
    stream::iter(indicators.iter())
        .map(|indicator| async move {
            info!(indicator = %indicator, "fetching indicator");
            match get_sli_value(client, indicator, ctx, start, end).await {
                Ok(value) if value.is_nan() => {
                    warn!(indicator = %indicator, "{}", NAN_MESSAGE);
                    IndicatorResult::failed(indicator, NAN_MESSAGE)
                }
                Ok(value) if value.is_infinite() => {
                    warn!(indicator = %indicator, value, "{}", INFINITE_MESSAGE);
                    IndicatorResult::failed(indicator, INFINITE_MESSAGE)
                }
                Ok(value) => IndicatorResult::ok(indicator, value),
                Err(e) => {
                    warn!(indicator = %indicator, error = %e, "indicator could not be retrieved");
                    IndicatorResult::failed(indicator, e.to_string())
                }
            }
        })
        .buffered(concurrency.max(1))
        .boxed()
        .collect()
        .await
}
