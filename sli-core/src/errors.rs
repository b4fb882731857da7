use std::error::Error as _;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, SliError>;

/// Failures local to a single indicator.
///
/// The `Display` text is what ends up in the indicator's result message.
#[derive(Debug, Error)]
pub enum SliError {
    #[error("unsupported SLI: {0}")]
    UnsupportedIndicator(String),

    #[error("unable to parse timestamp: {0}")]
    TimeParse(String),

    #[error("transport error: {}", transport_message(.0))]
    Transport(#[from] reqwest::Error),

    #[error("metric could not be received: status {0}")]
    NonSuccessStatus(u16),

    #[error("malformed response: {0}")]
    MalformedResponse(#[from] serde_json::Error),
}

/// reqwest's top-level text omits the cause, append the source chain
fn transport_message(err: &reqwest::Error) -> String {
    let mut message = if err.is_timeout() {
        format!("request timed out: {}", err)
    } else {
        err.to_string()
    };
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
