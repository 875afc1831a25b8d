use crate::config::{ApiConfig, RunMode};
use crate::error::{reason_phrase, FieldOpsError, Result};
use reqwest::{Method, Request, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Thin authenticated wrapper around the backend's REST API.
///
/// Transport failures are retried `retries` times with no delay; HTTP error
/// statuses are returned as-is.
#[derive(Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    base_url: Url,
    token: Option<String>,
    retries: u32,
    mode: RunMode,
}

impl ApiClient {
    pub fn new(config: &ApiConfig, mode: RunMode) -> Result<Self> {
        let mut base = config.base_url.trim().to_string();
        if !base.ends_with('/') {
            base.push('/');
        }
        let base_url = Url::parse(&base).map_err(|e| {
            FieldOpsError::Config(format!("Invalid api.base_url '{}': {}", config.base_url, e))
        })?;

        Ok(Self {
            client: reqwest::Client::new(),
            base_url,
            token: config.bearer_token().map(str::to_string),
            retries: config.retries,
            mode,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Resolve `path` (no leading slash) against the base URL and append
    /// `query` pairs.
    pub fn endpoint(&self, path: &str, query: &[(&str, String)]) -> Result<Url> {
        let mut url = self
            .base_url
            .join(path)
            .map_err(|e| FieldOpsError::Validation(format!("Invalid endpoint '{}': {}", path, e)))?;
        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (name, value) in query {
                pairs.append_pair(name, value);
            }
        }
        Ok(url)
    }

    pub fn get_request(&self, url: Url) -> Result<Request> {
        self.authorized(self.client.request(Method::GET, url))
            .build()
            .map_err(|e| FieldOpsError::Validation(format!("Failed to build request: {}", e)))
    }

    pub fn post_json_request<B: Serialize + ?Sized>(&self, url: Url, body: &B) -> Result<Request> {
        self.authorized(self.client.request(Method::POST, url))
            .json(body)
            .build()
            .map_err(|e| FieldOpsError::Validation(format!("Failed to build request: {}", e)))
    }

    fn authorized(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Send `request` and decode a JSON body. `what` names the resource in
    /// error messages.
    pub async fn send_json<T: DeserializeOwned>(&self, request: Request, what: &str) -> Result<T> {
        let method = request.method().clone();
        let url = request.url().clone();
        let mut attempt = 0;

        let response = loop {
            let outgoing = request.try_clone().ok_or_else(|| {
                FieldOpsError::Validation(format!("Request for {} cannot be replayed", what))
            })?;

            match self.client.execute(outgoing).await {
                Ok(response) => break response,
                Err(e) if attempt < self.retries && is_transport_error(&e) => {
                    attempt += 1;
                    tracing::warn!(%method, %url, attempt, error = %e, "Transport error, retrying");
                }
                Err(e) => {
                    return Err(FieldOpsError::Network(format!("{} {}: {}", method, url, e)));
                }
            }
        };

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            self.report_failure(status.as_u16(), &url);
            return Err(FieldOpsError::from_status(status.as_u16(), body, what));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| FieldOpsError::Network(format!("{} {}: {}", method, url, e)))?;

        serde_json::from_slice(&bytes)
            .map_err(|e| FieldOpsError::Parse(format!("Failed to parse {}: {}", what, e)))
    }

    fn report_failure(&self, status: u16, url: &Url) {
        match (self.mode, reason_phrase(status)) {
            (RunMode::Development, Some(reason)) => {
                tracing::warn!(status, %url, reason, "Backend request failed");
            }
            _ => tracing::debug!(status, %url, "Backend request failed"),
        }
    }

    /// True when the backend answers at all, whatever the status.
    pub async fn test_connection(&self) -> Result<bool> {
        let request = self.get_request(self.base_url.clone())?;
        match self.client.execute(request).await {
            Ok(response) => Ok(!response.status().is_server_error()),
            Err(e) => Err(FieldOpsError::Network(e.to_string())),
        }
    }
}

fn is_transport_error(e: &reqwest::Error) -> bool {
    e.is_connect() || e.is_timeout() || e.is_request()
}
