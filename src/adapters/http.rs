//! Shared blocking HTTP plumbing for the upstream providers.

use std::time::Duration;

use reqwest::blocking::{Client, Response};
use reqwest::StatusCode;

use crate::domain::error::TraderError;

pub fn build_blocking_client(
    service: &str,
    timeout: Duration,
    user_agent: &str,
) -> Result<Client, TraderError> {
    Client::builder()
        .timeout(timeout)
        .user_agent(user_agent)
        .build()
        .map_err(|e| TraderError::upstream(service, format!("failed to build HTTP client: {e}")))
}

/// Transport failures are transient; everything reqwest reports here happens
/// before a usable response exists.
pub fn transport_error(service: &str, err: reqwest::Error) -> TraderError {
    TraderError::upstream(service, err)
}

/// Map a status code to the error taxonomy. `None` means the response is usable.
pub fn classify_status(service: &str, status: StatusCode) -> Option<TraderError> {
    if status.is_success() {
        None
    } else if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
        Some(TraderError::upstream(service, format!("HTTP {status}")))
    } else {
        Some(TraderError::payload(service, format!("HTTP {status}")))
    }
}

/// Body text of a successful response.
pub fn read_body(service: &str, response: Response) -> Result<String, TraderError> {
    if let Some(err) = classify_status(service, response.status()) {
        return Err(err);
    }
    response.text().map_err(|e| transport_error(service, e))
}
