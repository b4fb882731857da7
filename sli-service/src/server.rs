use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{error, info, info_span, Instrument};

use crate::config::ServiceArgs;
use crate::credentials::FileCredentialStore;
use crate::event::{CloudEvent, GET_SLI_TRIGGERED};
use crate::event_sender::HttpEventSender;
use crate::handler::{HandlerSettings, SliHandler};
use crate::sli_config::HttpConfigurationStore;

#[derive(Serialize)]
struct HealthDto {
    status: &'static str,
}

pub fn create_handler(args: &ServiceArgs) -> Result<Arc<SliHandler>> {
    let credentials = FileCredentialStore::new(&args.secrets_dir);
    let configuration =
        HttpConfigurationStore::new(&args.configuration_service, args.request_timeout_ms)?;
    let sender = HttpEventSender::new(&args.event_broker, args.request_timeout_ms)?;

    if args.insecure_skip_tls_verify {
        info!("TLS certificate verification towards Prometheus is disabled");
    }

    Ok(Arc::new(SliHandler::new(
        Arc::new(credentials),
        Arc::new(configuration),
        Arc::new(sender),
        HandlerSettings {
            default_prometheus_url: args.default_prometheus_url.clone(),
            metrics_timeout_ms: args.metrics_timeout_ms,
            accept_invalid_certs: args.insecure_skip_tls_verify,
            fetch_concurrency: args.fetch_concurrency,
        },
    )))
}

pub fn build_router(path: &str, handler: Arc<SliHandler>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route(path, post(receive_event))
        .with_state(handler)
        .layer(TraceLayer::new_for_http())
}

pub async fn run(args: ServiceArgs) -> Result<()> {
    info!("Initializing {}", crate::event::SERVICE_NAME);

    let handler = create_handler(&args)?;
    let router = build_router(&args.path, handler);

    let addr = SocketAddr::from(([0, 0, 0, 0], args.port));
    info!("Listening for cloudevents on http://{}{}", addr, args.path);

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    axum::serve(listener, router.into_make_service()).await?;

    Ok(())
}

async fn health() -> Json<HealthDto> {
    Json(HealthDto { status: "ok" })
}

/// Accept a structured-mode CloudEvent and process it in the background
async fn receive_event(
    State(handler): State<Arc<SliHandler>>,
    body: Bytes,
) -> (StatusCode, String) {
    let event = match accept_event(&body) {
        Ok(event) => event,
        Err(rejection) => return rejection,
    };

    let span = info_span!(
        "get_sli",
        keptn_context = event.shkeptncontext.as_deref().unwrap_or_default(),
        event_id = %event.id,
    );
    tokio::spawn(
        async move {
            if let Err(e) = handler.handle_event(event).await {
                error!("failed to process event: {:#}", e);
            }
        }
        .instrument(span),
    );

    (StatusCode::ACCEPTED, String::new())
}

/// Decode and validate an inbound event before any processing starts
pub fn accept_event(body: &[u8]) -> Result<CloudEvent, (StatusCode, String)> {
    let event: CloudEvent = serde_json::from_slice(body)
        .map_err(|e| (StatusCode::BAD_REQUEST, format!("invalid cloudevent: {}", e)))?;

    if event.event_type != GET_SLI_TRIGGERED {
        return Err((
            StatusCode::BAD_REQUEST,
            "received unknown event type".to_string(),
        ));
    }
    Ok(event)
}
