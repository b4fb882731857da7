use std::path::PathBuf;

use clap::Parser;
use sli_core::DEFAULT_PROMETHEUS_URL;

#[derive(Debug, Parser, Clone)]
#[command(name = "prometheus-sli-service")]
#[command(about = "Prometheus SLI provider - answers get-sli events with indicator values", long_about = None)]
#[command(version)]
pub struct ServiceArgs {
    /// Port on which to listen for cloudevents
    #[arg(long, env = "RCV_PORT", default_value_t = 8080)]
    pub port: u16,

    /// Path on which to listen for cloudevents
    #[arg(long, env = "RCV_PATH", default_value = "/")]
    pub path: String,

    /// Configuration service base URL (SLI query overrides)
    #[arg(
        long,
        env = "CONFIGURATION_SERVICE",
        default_value = "http://configuration-service:8080"
    )]
    pub configuration_service: String,

    /// Event broker URL for started/finished events
    #[arg(long, env = "EVENTBROKER", default_value = "http://event-broker/keptn")]
    pub event_broker: String,

    /// Directory where prometheus-credentials-<project> secrets are mounted
    #[arg(
        long,
        env = "PROMETHEUS_SECRETS_DIR",
        default_value = "/etc/prometheus-credentials"
    )]
    pub secrets_dir: PathBuf,

    /// Prometheus used when a project has no credentials secret
    #[arg(long, env = "PROMETHEUS_DEFAULT_URL", default_value = DEFAULT_PROMETHEUS_URL)]
    pub default_prometheus_url: String,

    /// Timeout for a single Prometheus query in milliseconds
    #[arg(long, env = "METRICS_TIMEOUT_MS", default_value_t = 5000)]
    pub metrics_timeout_ms: u64,

    /// Timeout for configuration service and event broker calls in milliseconds
    #[arg(long, env = "REQUEST_TIMEOUT_MS", default_value_t = 5000)]
    pub request_timeout_ms: u64,

    /// Skip TLS certificate verification towards Prometheus
    #[arg(long, env = "PROMETHEUS_INSECURE_SKIP_VERIFY", default_value_t = false)]
    pub insecure_skip_tls_verify: bool,

    /// Number of indicator queries in flight per event
    #[arg(long, env = "SLI_FETCH_CONCURRENCY", default_value_t = 1)]
    pub fetch_concurrency: usize,
}
