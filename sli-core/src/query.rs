//! PromQL query construction for service-level indicators

use std::collections::HashMap;

use crate::errors::{Result, SliError};
use crate::filter::{strip_quotes, FilterExpression, LabelFilter};
use crate::time_window::TimeWindow;

pub const THROUGHPUT: &str = "throughput";
pub const ERROR_RATE: &str = "error_rate";
pub const REQUEST_LATENCY_P50: &str = "request_latency_p50";
pub const REQUEST_LATENCY_P90: &str = "request_latency_p90";
pub const REQUEST_LATENCY_P95: &str = "request_latency_p95";

const JOB_LABEL: &str = "job";

/// Indicators with a built-in query shape
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Indicator {
    Throughput,
    ErrorRate,
    /// Two-digit percentile, inserted after `0.`
    RequestLatency(&'static str),
}

impl Indicator {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            THROUGHPUT => Some(Indicator::Throughput),
            ERROR_RATE => Some(Indicator::ErrorRate),
            REQUEST_LATENCY_P50 => Some(Indicator::RequestLatency("50")),
            REQUEST_LATENCY_P90 => Some(Indicator::RequestLatency("90")),
            REQUEST_LATENCY_P95 => Some(Indicator::RequestLatency("95")),
            _ => None,
        }
    }

    /// Render the query for a filter expression and a duration such as `30s`
    pub fn query(&self, filter: &str, duration: &str) -> String {
        match self {
            Indicator::Throughput => {
                format!("sum(rate(http_requests_total{{{filter}}}[{duration}]))")
            }
            Indicator::ErrorRate => format!(
                "sum(rate(http_requests_total{{{filter},status!~'2..'}}[{duration}]))/sum(rate(http_requests_total{{{filter}}}[{duration}]))"
            ),
            Indicator::RequestLatency(percentile) => format!(
                "histogram_quantile(0.{percentile},sum(rate(http_response_time_milliseconds_bucket{{{filter}}}[{duration}]))by(le))"
            ),
        }
    }
}

/// Identity, filters and custom queries shared by every indicator of a batch.
#[derive(Clone, Debug, Default)]
pub struct QueryContext {
    pub project: String,
    pub stage: String,
    pub service: String,
    pub filters: Vec<LabelFilter>,
    /// indicator name -> query template
    pub custom_queries: HashMap<String, String>,
}

impl QueryContext {
    pub fn new(
        project: impl Into<String>,
        stage: impl Into<String>,
        service: impl Into<String>,
    ) -> Self {
        Self {
            project: project.into(),
            stage: stage.into(),
            service: service.into(),
            ..Default::default()
        }
    }

    pub fn with_filters(mut self, filters: Vec<LabelFilter>) -> Self {
        self.filters = filters;
        self
    }

    pub fn with_custom_queries(mut self, custom_queries: HashMap<String, String>) -> Self {
        self.custom_queries = custom_queries;
        self
    }

    /// `{service}-{project}-{stage}`
    pub fn default_job(&self) -> String {
        format!("{}-{}-{}", self.service, self.project, self.stage)
    }

    /// Label selector body used by the built-in queries.
    ///
    /// An explicit `job` filter replaces the default job matcher and every
    /// other filter. Otherwise the default job matcher comes first, followed
    /// by the filters in input order.
    pub fn filter_expression(&self) -> String {
        if let Some(job) = self.filters.iter().find(|f| f.key == JOB_LABEL) {
            return FilterExpression::new().exact(JOB_LABEL, &job.value).build();
        }

        self.filters
            .iter()
            .fold(
                FilterExpression::new().exact(JOB_LABEL, &self.default_job()),
                |expr, filter| expr.filter(filter),
            )
            .build()
    }

    /// Substitute placeholders in a custom query template.
    ///
    /// `$DURATION_SECONDS` receives the unit as well (`30s`). Filter values
    /// are only injected where the template names them as `$<key>`.
    pub fn render_template(&self, template: &str, duration: &str) -> String {
        let mut query = template
            .replace("$DURATION_SECONDS", duration)
            .replace("$SERVICE", &self.service)
            .replace("$PROJECT", &self.project)
            .replace("$STAGE", &self.stage);

        let mut filters: Vec<&LabelFilter> = self.filters.iter().collect();
        filters.sort_by(|a, b| b.key.len().cmp(&a.key.len()));
        for filter in filters {
            query = query.replace(&format!("${}", filter.key), &strip_quotes(&filter.value));
        }
        query
    }
}

/// Map an indicator name to a full PromQL query.
///
/// A custom template registered under the name wins over the built-in query
/// of the same name.
pub fn build_query(indicator: &str, ctx: &QueryContext, window: &TimeWindow) -> Result<String> {
    let duration = window.duration_string();

    if let Some(template) = ctx.custom_queries.get(indicator) {
        return Ok(ctx.render_template(template, &duration));
    }

    match Indicator::from_name(indicator) {
        Some(builtin) => Ok(builtin.query(&ctx.filter_expression(), &duration)),
        None => Err(SliError::UnsupportedIndicator(indicator.to_string())),
    }
}
