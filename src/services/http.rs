use std::time::Duration;

use reqwest::{Client, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use tracing::Instrument;
use uuid::Uuid;

use crate::core::config::{ApiSettings, ConfigError};
use crate::core::metrics::record_request;
use crate::services::errors::{extract_error_message, ClientError};

pub(crate) const REQUEST_ID_HEADER: &str = "X-Request-Id";

/// Shared HTTP plumbing for the grading REST API.
///
/// Cheap to clone: the underlying `reqwest::Client` pools connections.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: Url,
}

impl ApiClient {
    pub fn from_settings(settings: &ApiSettings) -> Result<Self, ClientError> {
        let client = build_http_client(settings)?;
        let base_url = parse_base_url("AUTOGRADE_API_URL", &settings.base_url)?;
        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub(crate) fn get(&self, segments: &[&str]) -> Result<RequestBuilder, ClientError> {
        Ok(self.client.get(join_segments(&self.base_url, segments)?))
    }

    pub(crate) fn post(&self, segments: &[&str]) -> Result<RequestBuilder, ClientError> {
        Ok(self.client.post(join_segments(&self.base_url, segments)?))
    }

    pub(crate) async fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        endpoint: &'static str,
        fallback: &'static str,
    ) -> Result<T, ClientError> {
        execute_json(request, endpoint, fallback).await
    }
}

pub(crate) fn build_http_client(settings: &ApiSettings) -> Result<Client, ClientError> {
    Client::builder()
        .connect_timeout(Duration::from_secs(settings.connect_timeout_seconds))
        .timeout(Duration::from_secs(settings.request_timeout_seconds))
        .user_agent(concat!("autograde/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|source| ClientError::Transport { endpoint: "client.build".to_string(), source })
}

pub(crate) fn parse_base_url(field: &'static str, raw: &str) -> Result<Url, ClientError> {
    let url = Url::parse(raw)
        .map_err(|_| ConfigError::InvalidUrl { field, value: raw.to_string() })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidUrl { field, value: raw.to_string() }.into());
    }
    Ok(url)
}

/// Appends percent-encoded path segments to `base`, keeping its own path.
pub(crate) fn join_segments(base: &Url, segments: &[&str]) -> Result<Url, ClientError> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| ConfigError::InvalidUrl { field: "base_url", value: base.to_string() })?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

/// Sends `request` and decodes a 2xx JSON body into `T`.
///
/// Non-2xx responses become [`ClientError::Status`] carrying the server's
/// `detail`, or `fallback` when the body has none. No retries.
pub(crate) async fn execute_json<T: DeserializeOwned>(
    request: RequestBuilder,
    endpoint: &'static str,
    fallback: &'static str,
) -> Result<T, ClientError> {
    let request_id = Uuid::new_v4();
    let span = tracing::debug_span!("api_request", endpoint, request_id = %request_id);

    async move {
        let response =
            match request.header(REQUEST_ID_HEADER, request_id.to_string()).send().await {
                Ok(response) => response,
                Err(source) => {
                    tracing::warn!(error = %source, "API request failed before a response arrived");
                    record_request(endpoint, "transport_error");
                    return Err(ClientError::Transport { endpoint: endpoint.to_string(), source });
                }
            };

        let status = response.status();
        let body = response.bytes().await.map_err(|source| {
            record_request(endpoint, "transport_error");
            ClientError::Transport { endpoint: endpoint.to_string(), source }
        })?;

        if !status.is_success() {
            let message = extract_error_message(&body).unwrap_or_else(|| fallback.to_string());
            tracing::warn!(status = status.as_u16(), %message, "API returned an error response");
            record_request(endpoint, "http_error");
            return Err(ClientError::Status { status: status.as_u16(), message });
        }

        let parsed = serde_json::from_slice::<T>(&body).map_err(|source| {
            tracing::warn!(error = %source, "API response did not match the expected shape");
            record_request(endpoint, "decode_error");
            ClientError::Decode { endpoint: endpoint.to_string(), source }
        })?;

        tracing::debug!(status = status.as_u16(), "API request succeeded");
        record_request(endpoint, "success");
        Ok(parsed)
    }
    .instrument(span)
    .await
}
