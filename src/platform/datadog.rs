// ddlog - platform/datadog.rs
//
// Blocking HTTP client for the Datadog log list endpoint.
//
// One call = one POST. Transport failures, non-2xx answers and undecodable
// bodies are returned to the caller as-is; retry policy belongs to the tail
// loop. No timeout is applied unless configured.

use crate::core::model::{QueryRequest, QueryResponse, QueryWindow};
use crate::core::source::LogSource;
use crate::platform::config::AppConfig;
use crate::util::constants;
use crate::util::error::ApiError;
use reqwest::blocking::Client;
use std::time::Duration;

/// Client for one endpoint and one pair of keys.
pub struct DatadogClient {
    http: Client,
    endpoint: String,
    api_key: String,
    app_key: String,
}

impl DatadogClient {
    pub fn new(
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        app_key: impl Into<String>,
        timeout: Option<Duration>,
    ) -> Result<Self, ApiError> {
        let mut builder = Client::builder().user_agent(format!(
            "{}/{}",
            constants::APP_NAME,
            constants::APP_VERSION
        ));
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder
            .build()
            .map_err(|source| ApiError::Transport { source })?;

        Ok(Self {
            http,
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            app_key: app_key.into(),
        })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, ApiError> {
        Self::new(
            config.endpoint.clone(),
            config.api_key.clone(),
            config.app_key.clone(),
            config.request_timeout,
        )
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// First page of `query` over `window`.
    pub fn query(&self, query: &str, window: &QueryWindow) -> Result<QueryResponse, ApiError> {
        self.execute(&QueryRequest::new(query, window, None))
    }

    /// Page of `query` over `window` starting at a continuation token.
    pub fn query_with_continuation(
        &self,
        query: &str,
        window: &QueryWindow,
        continuation: &str,
    ) -> Result<QueryResponse, ApiError> {
        self.execute(&QueryRequest::new(query, window, Some(continuation)))
    }

    fn execute(&self, request: &QueryRequest) -> Result<QueryResponse, ApiError> {
        tracing::debug!(
            endpoint = %self.endpoint,
            query = %request.query,
            from = %request.time.from,
            to = %request.time.to,
            start_at = request.start_at.as_deref().unwrap_or(""),
            "Posting log query"
        );

        let response = self
            .http
            .post(&self.endpoint)
            .header(constants::API_KEY_HEADER, &self.api_key)
            .header(constants::APP_KEY_HEADER, &self.app_key)
            .json(request)
            .send()
            .map_err(|source| ApiError::Transport { source })?;

        let status = response.status();
        let body = response
            .text()
            .map_err(|source| ApiError::Transport { source })?;

        if !status.is_success() {
            tracing::debug!(status = status.as_u16(), "Log query rejected");
            return Err(ApiError::HttpStatus {
                status: status.as_u16(),
                body: body_preview(&body),
            });
        }

        let decoded = decode_response(&body)?;
        tracing::debug!(
            entries = decoded.logs.len(),
            has_more = decoded.continuation().is_some(),
            "Log query answered"
        );
        Ok(decoded)
    }
}

impl LogSource for DatadogClient {
    fn search(
        &self,
        query: &str,
        window: &QueryWindow,
        continuation: Option<&str>,
    ) -> Result<QueryResponse, ApiError> {
        match continuation {
            Some(token) => self.query_with_continuation(query, window, token),
            None => self.query(query, window),
        }
    }
}

/// Decode a response body.
pub fn decode_response(body: &str) -> Result<QueryResponse, ApiError> {
    serde_json::from_str(body).map_err(|source| ApiError::Decode { source })
}

/// Trimmed body cut to `MAX_ERROR_BODY_PREVIEW` bytes on a char boundary.
fn body_preview(body: &str) -> String {
    let body = body.trim();
    if body.len() <= constants::MAX_ERROR_BODY_PREVIEW {
        return body.to_string();
    }
    let mut end = constants::MAX_ERROR_BODY_PREVIEW;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &body[..end])
}
