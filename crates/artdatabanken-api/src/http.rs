//! Request plumbing shared by the API clients

use std::time::Duration;

use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::auth::Credentials;
use crate::error::{ApiError, Result};

/// Build an HTTP client that sends the credentials with every request
pub(crate) fn build_client(credentials: &Credentials, timeout: Duration) -> Result<reqwest::Client> {
    debug!(credentials = ?credentials, timeout = ?timeout, "Building HTTP client");
    let headers = credentials.headers()?;
    let client = reqwest::Client::builder()
        .timeout(timeout)
        .default_headers(headers)
        .build()?;
    Ok(client)
}

pub(crate) fn normalize_root_url(root_url: &str) -> String {
    root_url.trim_end_matches('/').to_string()
}

/// Send a request and return status and body. Only transport failures are errors here.
async fn execute(request: RequestBuilder) -> Result<(StatusCode, String)> {
    let response = request.send().await?;
    let status = response.status();
    let url = response.url().to_string();
    let body = response.text().await?;

    debug!(url = %url, status = status.as_u16(), body = %body, "HTTP response");

    if !status.is_success() {
        warn!(url = %url, status = status.as_u16(), "Request failed");
    }

    Ok((status, body))
}

fn decode<T: DeserializeOwned>(status: StatusCode, body: String) -> Result<T> {
    if !status.is_success() {
        return Err(ApiError::Remote {
            status: status.as_u16(),
            body,
        });
    }
    Ok(serde_json::from_str(&body)?)
}

/// Send a request and decode a JSON success body
pub(crate) async fn fetch_json<T: DeserializeOwned>(request: RequestBuilder) -> Result<T> {
    let (status, body) = execute(request).await?;
    decode(status, body)
}

/// Like [`fetch_json`], but a 404 is `Ok(None)`
pub(crate) async fn fetch_optional_json<T: DeserializeOwned>(
    request: RequestBuilder,
) -> Result<Option<T>> {
    let (status, body) = execute(request).await?;
    if status == StatusCode::NOT_FOUND {
        return Ok(None);
    }
    decode(status, body).map(Some)
}
