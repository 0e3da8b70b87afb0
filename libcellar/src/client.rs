//! Pre-configured HTTP client for the wine backend
//!
//! `ApiClient` owns the base URL and the default headers from `[api]` in the
//! config file. The API modules build requests through it and hand them back
//! to [`ApiClient::send_json`], which turns transport failures, non-success
//! statuses and undecodable bodies into [`ApiError`]s.

use std::sync::Arc;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;

use crate::config::ApiConfig;
use crate::error::{ApiError, ConfigError, Result};

#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    config: Arc<ApiConfig>,
}

impl ApiClient {
    /// Build a client from the `[api]` config section
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if a configured header name or
    /// value is not valid HTTP.
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let headers = build_headers(config)?;
        let http = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| ConfigError::InvalidValue {
                field: "api".to_string(),
                reason: format!("failed to build HTTP client: {}", e),
            })?;

        Ok(Self {
            http,
            config: Arc::new(config.clone()),
        })
    }

    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    /// Join a path onto the base URL
    pub fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.config.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// Start a request against the backend
    pub fn request(&self, method: Method, path: &str) -> RequestBuilder {
        tracing::debug!(method = method.as_str(), path, "Building request");
        self.http.request(method, self.url(path))
    }

    /// Send a request and decode its JSON body
    ///
    /// `context` names the operation in error messages (e.g. "post review").
    pub async fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        context: &str,
    ) -> Result<T> {
        let response = request
            .send()
            .await
            .map_err(|e| ApiError::Network(format!("{} failed: {}", context, e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = error_message(&body)
                .or_else(|| status.canonical_reason().map(str::to_string))
                .unwrap_or_else(|| "unknown error".to_string());
            return Err(
                ApiError::from_status(status.as_u16(), format!("{}: {}", context, message)).into(),
            );
        }

        tracing::debug!(status = status.as_u16(), context, "Request succeeded");

        response
            .json::<T>()
            .await
            .map_err(|e| ApiError::Decode(format!("{}: {}", context, e)).into())
    }
}

fn build_headers(config: &ApiConfig) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    headers.insert("accept", HeaderValue::from_static("application/json"));

    for (name, value) in &config.headers {
        let invalid = |reason: String| ConfigError::InvalidValue {
            field: format!("api.headers.{}", name),
            reason,
        };
        let header_name =
            HeaderName::from_bytes(name.as_bytes()).map_err(|e| invalid(e.to_string()))?;
        let header_value = HeaderValue::from_str(value).map_err(|e| invalid(e.to_string()))?;
        headers.insert(header_name, header_value);
    }

    Ok(headers)
}

/// Pull a human-readable message out of an error body
///
/// The backend answers errors with `{"message": "..."}`; anything else is
/// passed through as plain text.
fn error_message(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }

    match serde_json::from_str::<serde_json::Value>(trimmed) {
        Ok(value) => value
            .get("message")
            .and_then(|m| m.as_str())
            .map(str::to_string)
            .or_else(|| Some(trimmed.to_string())),
        Err(_) => Some(trimmed.to_string()),
    }
}
