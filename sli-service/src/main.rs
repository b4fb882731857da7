mod config;
mod credentials;
mod event;
mod event_sender;
mod handler;
mod server;
mod sli_config;


use anyhow::Result;
use clap::Parser;

use crate::config::ServiceArgs;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing/logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = ServiceArgs::parse();
    server::run(args).await
}
