//! HTTP transport contract and the reqwest-backed implementation.
//!
//! Managers never talk to the network directly; they depend on the
//! [`Transport`] trait, which issues one HTTP verb and hands back the
//! response metadata together with the JSON-decoded body. Timeouts and
//! connection handling belong to the transport, never to the managers.

use crate::config::ClientConfig;
use crate::error::{Error, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, ACCEPT};
use reqwest::{Method, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use std::time::Duration;
use url::Url;

const USER_AGENT: &str = concat!("nectar-allocation-rust/", env!("CARGO_PKG_VERSION"));

/// Default request timeout for the allocation API.
pub const DEFAULT_TIMEOUT: u64 = 30;

/// Response header names that may carry the server-issued request
/// identifier, in priority order.
pub const REQUEST_ID_HEADERS: [&str; 3] = [
    "openstack-request-id",
    "x-openstack-request-id",
    "x-compute-request-id",
];

/// Metadata extracted from one HTTP response.
///
/// This is the opaque handle the rest of the client sees: enough to track
/// request identifiers and statuses without holding the reqwest response.
#[derive(Debug, Clone)]
pub struct ResponseMeta {
    status: u16,
    headers: HeaderMap,
}

impl ResponseMeta {
    /// Create metadata from a status code and response headers.
    #[must_use]
    pub fn new(status: u16, headers: HeaderMap) -> Self {
        Self { status, headers }
    }

    /// HTTP status code of the response.
    #[must_use]
    pub fn status(&self) -> u16 {
        self.status
    }

    /// Response headers.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Extract the request identifier, checking the known header name
    /// variants in priority order.
    #[must_use]
    pub fn request_id(&self) -> Option<&str> {
        REQUEST_ID_HEADERS
            .iter()
            .find_map(|name| self.headers.get(*name))
            .and_then(|value| value.to_str().ok())
    }
}

/// HTTP request/response abstraction consumed by managers.
///
/// Each method issues exactly one blocking round trip and returns the
/// response metadata together with the JSON-decoded body. A 204 response,
/// or one with an empty body, decodes to [`Value::Null`]. Non-2xx statuses
/// are raised as errors carrying status, method and URL.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Issue a GET request.
    async fn get(
        &self,
        url: &str,
        headers: Option<&HeaderMap>,
        params: &[(String, String)],
    ) -> Result<(ResponseMeta, Value)>;

    /// Issue a POST request with an optional JSON body.
    async fn post(
        &self,
        url: &str,
        data: Option<&Value>,
        headers: Option<&HeaderMap>,
    ) -> Result<(ResponseMeta, Value)>;

    /// Issue a PATCH request.
    async fn patch(
        &self,
        url: &str,
        data: &Value,
        headers: Option<&HeaderMap>,
    ) -> Result<(ResponseMeta, Value)>;

    /// Issue a PUT request.
    async fn put(
        &self,
        url: &str,
        data: &Value,
        headers: Option<&HeaderMap>,
    ) -> Result<(ResponseMeta, Value)>;

    /// Issue a DELETE request.
    async fn delete(
        &self,
        url: &str,
        headers: Option<&HeaderMap>,
    ) -> Result<(ResponseMeta, Value)>;
}

/// Builder for [`HttpTransport`].
#[derive(Debug, Clone)]
pub struct HttpTransportBuilder {
    base_url: String,
    timeout: Duration,
    user_agent: String,
    project_id: Option<String>,
    token: Option<SecretString>,
}

impl HttpTransportBuilder {
    /// Create a builder for the specified base URL.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT),
            user_agent: USER_AGENT.to_string(),
            project_id: None,
            token: None,
        }
    }

    /// Override the request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Override the User-Agent header.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Scope every request to a project via the X-PROJECT-ID header.
    #[must_use]
    pub fn with_project_id(mut self, project_id: impl Into<String>) -> Self {
        self.project_id = Some(project_id.into());
        self
    }

    /// Attach a pre-issued auth token via the X-Auth-Token header.
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(SecretString::from(token.into()));
        self
    }

    /// Build the transport.
    pub fn build(self) -> Result<HttpTransport> {
        let mut base = self.base_url;
        if !base.ends_with('/') {
            base.push('/');
        }
        let base_url = Url::parse(&base)?;
        if base_url.cannot_be_a_base() {
            return Err(Error::InvalidEndpoint(base));
        }

        let client = reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(self.user_agent)
            .build()?;

        Ok(HttpTransport {
            client,
            base_url,
            project_id: self.project_id,
            token: self.token,
        })
    }
}

/// Reqwest-backed [`Transport`] implementation.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: Url,
    project_id: Option<String>,
    token: Option<SecretString>,
}

impl HttpTransport {
    /// Construct a transport directly from the base URL.
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        HttpTransportBuilder::new(base_url).build()
    }

    /// Construct a transport from a validated client configuration.
    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        let mut builder =
            HttpTransportBuilder::new(config.endpoint.clone()).with_timeout(config.timeout());
        if let Some(project_id) = &config.project_id {
            builder = builder.with_project_id(project_id.clone());
        }
        if let Some(token) = config.token() {
            builder = builder.with_token(token.expose_secret());
        }
        builder.build()
    }

    /// Return the base URL.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Resolve a request URL against the base. Absolute URLs (pagination
    /// `next` links) are used verbatim; paths are joined onto the base.
    fn resolve(&self, url: &str) -> Result<Url> {
        if url.starts_with("http://") || url.starts_with("https://") {
            return Ok(Url::parse(url)?);
        }
        Ok(self.base_url.join(url.trim_start_matches('/'))?)
    }

    async fn request(
        &self,
        method: Method,
        url: &str,
        data: Option<&Value>,
        headers: Option<&HeaderMap>,
        params: &[(String, String)],
    ) -> Result<(ResponseMeta, Value)> {
        let target = self.resolve(url)?;
        tracing::debug!(method = %method, url = %target, "allocation API request");

        let mut request = self
            .client
            .request(method.clone(), target.clone())
            .header(ACCEPT, "application/json");
        if !params.is_empty() {
            request = request.query(params);
        }
        if let Some(extra) = headers {
            request = request.headers(extra.clone());
        }
        if let Some(project_id) = &self.project_id {
            request = request.header("X-PROJECT-ID", project_id);
        }
        if let Some(token) = &self.token {
            request = request.header("X-Auth-Token", token.expose_secret());
        }
        if let Some(body) = data {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        let meta = ResponseMeta::new(status.as_u16(), response.headers().clone());

        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(map_status_to_error(
                status,
                method.as_str(),
                target.as_str(),
                text,
            ));
        }

        if status == StatusCode::NO_CONTENT {
            return Ok((meta, Value::Null));
        }

        let text = response.text().await?;
        if text.trim().is_empty() {
            return Ok((meta, Value::Null));
        }
        let body = serde_json::from_str(&text).map_err(|err| {
            Error::DecodeError(format!("invalid JSON from {target}: {err}"))
        })?;

        Ok((meta, body))
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(
        &self,
        url: &str,
        headers: Option<&HeaderMap>,
        params: &[(String, String)],
    ) -> Result<(ResponseMeta, Value)> {
        self.request(Method::GET, url, None, headers, params).await
    }

    async fn post(
        &self,
        url: &str,
        data: Option<&Value>,
        headers: Option<&HeaderMap>,
    ) -> Result<(ResponseMeta, Value)> {
        self.request(Method::POST, url, data, headers, &[]).await
    }

    async fn patch(
        &self,
        url: &str,
        data: &Value,
        headers: Option<&HeaderMap>,
    ) -> Result<(ResponseMeta, Value)> {
        self.request(Method::PATCH, url, Some(data), headers, &[])
            .await
    }

    async fn put(
        &self,
        url: &str,
        data: &Value,
        headers: Option<&HeaderMap>,
    ) -> Result<(ResponseMeta, Value)> {
        self.request(Method::PUT, url, Some(data), headers, &[])
            .await
    }

    async fn delete(
        &self,
        url: &str,
        headers: Option<&HeaderMap>,
    ) -> Result<(ResponseMeta, Value)> {
        self.request(Method::DELETE, url, None, headers, &[]).await
    }
}

fn map_status_to_error(status: StatusCode, method: &str, url: &str, text: String) -> Error {
    if status == StatusCode::NOT_FOUND {
        return Error::not_found("resource", format!("{method} {url}"));
    }
    Error::Http {
        status: status.as_u16(),
        method: method.to_string(),
        url: url.to_string(),
        message: text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    fn headers_with(name: &'static str, value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(name, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn request_id_prefers_unprefixed_header() {
        let mut headers = headers_with("x-openstack-request-id", "req-low");
        headers.insert(
            "openstack-request-id",
            HeaderValue::from_static("req-high"),
        );
        let meta = ResponseMeta::new(200, headers);
        assert_eq!(meta.request_id(), Some("req-high"));
    }

    #[test]
    fn request_id_falls_back_to_compute_header() {
        let meta = ResponseMeta::new(200, headers_with("x-compute-request-id", "req-c"));
        assert_eq!(meta.request_id(), Some("req-c"));
    }

    #[test]
    fn request_id_absent() {
        let meta = ResponseMeta::new(204, HeaderMap::new());
        assert_eq!(meta.request_id(), None);
    }

    #[test]
    fn resolve_joins_relative_paths_onto_base() {
        let transport = HttpTransport::new("http://api.example.com/rest/api/v1").unwrap();
        let url = transport.resolve("/allocations/42/").unwrap();
        assert_eq!(url.as_str(), "http://api.example.com/rest/api/v1/allocations/42/");
    }

    #[test]
    fn resolve_keeps_absolute_next_links() {
        let transport = HttpTransport::new("http://api.example.com/v1").unwrap();
        let url = transport
            .resolve("http://api.example.com/v1/allocations/?page=2")
            .unwrap();
        assert_eq!(url.as_str(), "http://api.example.com/v1/allocations/?page=2");
    }

    #[test]
    fn map_status_404_is_not_found() {
        let err = map_status_to_error(
            StatusCode::NOT_FOUND,
            "GET",
            "http://api/allocations/9/",
            String::new(),
        );
        assert!(matches!(err, Error::NotFound { .. }));
    }

    #[test]
    fn map_status_other_carries_method_and_url() {
        let err = map_status_to_error(
            StatusCode::CONFLICT,
            "POST",
            "http://api/quotas/",
            "busy".to_string(),
        );
        match err {
            Error::Http {
                status,
                method,
                url,
                message,
            } => {
                assert_eq!(status, 409);
                assert_eq!(method, "POST");
                assert_eq!(url, "http://api/quotas/");
                assert_eq!(message, "busy");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn builder_rejects_garbage_url() {
        assert!(HttpTransportBuilder::new("not a url").build().is_err());
    }
}
