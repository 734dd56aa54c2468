use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use shared::error::{Service, TripError};
use url::Url;

use crate::config::Settings;

pub(crate) fn build_client(settings: &Settings) -> Result<Client> {
    Client::builder()
        .timeout(Duration::from_secs(settings.request_timeout_secs))
        .user_agent(settings.user_agent.clone())
        .build()
        .context("failed to build HTTP client")
}

/// Validates `raw` as an absolute http(s) URL and strips any trailing slash so
/// routes can be appended with `format!`.
pub(crate) fn normalize_base_url(raw: &str) -> Result<String> {
    let parsed = Url::parse(raw.trim()).with_context(|| format!("invalid URL '{raw}'"))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        anyhow::bail!("unsupported URL scheme '{}' in '{raw}'", parsed.scheme());
    }
    Ok(parsed.as_str().trim_end_matches('/').to_string())
}

pub(crate) fn transport_error(service: Service, err: reqwest::Error) -> TripError {
    if err.is_decode() {
        TripError::parse(service, err.to_string())
    } else {
        TripError::network(service, err.to_string())
    }
}

pub(crate) async fn decode_json<T: DeserializeOwned>(
    service: Service,
    response: Response,
) -> Result<T, TripError> {
    let bytes = response
        .bytes()
        .await
        .map_err(|err| transport_error(service, err))?;
    serde_json::from_slice(&bytes).map_err(|err| TripError::parse(service, err.to_string()))
}
