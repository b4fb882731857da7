//! SLI-Core
//!
//! Translates service-level indicator names into PromQL queries and reads a
//! single scalar back from the Prometheus instant query API.
//!
//! - `filter`: label filters and the filter expression builder
//! - `time_window`: evaluation window parsing and duration rendering
//! - `query`: built-in indicator queries and custom query templates
//! - `client`: Prometheus HTTP client and response extraction
//! - `retrieval`: per-indicator batch aggregation

pub mod errors;

mod filter;
pub use filter::{strip_quotes, FilterExpression, LabelFilter};

mod time_window;
pub use time_window::{parse_timestamp, TimeWindow};

mod query;
pub use query::{
    build_query, Indicator, QueryContext, ERROR_RATE, REQUEST_LATENCY_P50, REQUEST_LATENCY_P90,
    REQUEST_LATENCY_P95, THROUGHPUT,
};

mod client;
pub use client::{
    parse_or_default, MetricsClient, MetricsConfig, PromData, PromResponse, PromSample,
    DEFAULT_PROMETHEUS_URL,
};

mod retrieval;
pub use retrieval::{
    get_sli_value, retrieve_indicators, IndicatorResult, INFINITE_MESSAGE, NAN_MESSAGE,
};

#[cfg(test)]
mod query_test;
