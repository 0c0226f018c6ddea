use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use reqwest::{Method, StatusCode};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

use super::common::{unwrap_envelope, ApiErrorDetails, ApiErrorResponse, ApiQueryParams};
use super::error::ApiError;
use super::SaseApi;

pub const DEFAULT_HOSTNAME: &str = "portal.prod.fortisase.com";

#[derive(Clone, Debug)]
pub struct ClientConfig {
    pub hostname: String,
    pub access_token: String,
    /// Skip TLS certificate verification
    pub insecure: bool,
    pub timeout_seconds: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            hostname: DEFAULT_HOSTNAME.to_string(),
            access_token: String::new(),
            insecure: false,
            timeout_seconds: 30,
        }
    }
}

/// FortiSASE API client
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    http_client: reqwest::Client,
    base_url: url::Url,
    auth_header: String,
}

impl Client {
    pub fn new(config: ClientConfig) -> Result<Self, ApiError> {
        let http_client = reqwest::Client::builder()
            .danger_accept_invalid_certs(config.insecure)
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self {
            inner: Arc::new(ClientInner {
                http_client,
                base_url: base_url(&config.hostname)?,
                auth_header: format!("Bearer {}", config.access_token),
            }),
        })
    }

    pub fn base_url(&self) -> &str {
        self.inner.base_url.as_str()
    }

    /// `<base><path>[/<mkey>][?query]`; an empty mkey addresses the
    /// collection itself
    fn url(&self, path: &str, mkey: &str, query: &ApiQueryParams) -> String {
        let base = self.inner.base_url.as_str().trim_end_matches('/');
        let mut url = format!("{}/{}", base, path.trim_start_matches('/'));
        if !mkey.is_empty() {
            url.push('/');
            url.push_str(&urlencoding::encode(mkey));
        }
        url.push_str(&query.to_query_string());
        url
    }

    async fn execute(
        &self,
        method: Method,
        url: String,
        body: Option<&Value>,
    ) -> Result<Value, ApiError> {
        tracing::debug!("{} request to: {}", method, url);
        if let Some(Value::Object(map)) = body {
            tracing::debug!(
                "request body keys: {:?}",
                map.keys().map(String::as_str).collect::<Vec<_>>()
            );
        }

        let mut request = self
            .inner
            .http_client
            .request(method, &url)
            .header(AUTHORIZATION, &self.inner.auth_header);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        tracing::debug!("Response status: {}", status);

        if status.is_success() {
            return self.parse_success_response(response).await;
        }

        match status {
            StatusCode::UNAUTHORIZED => Err(ApiError::AuthError),
            StatusCode::NOT_FOUND => Err(ApiError::NotFound(url)),
            _ => self.handle_error_response(response).await,
        }
    }

    async fn parse_success_response(&self, response: reqwest::Response) -> Result<Value, ApiError> {
        let text = response.text().await?;
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }

        match serde_json::from_str::<Value>(&text) {
            Ok(body) => Ok(unwrap_envelope(body)),
            Err(e) => {
                tracing::error!("Failed to deserialize response: {}, body: {}", e, text);
                Err(ApiError::ParseError(format!(
                    "Failed to parse response: {}",
                    e
                )))
            }
        }
    }

    async fn handle_error_response(&self, response: reqwest::Response) -> Result<Value, ApiError> {
        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        tracing::error!("API error response ({}): {}", status, text);

        let details = match serde_json::from_str::<ApiErrorResponse>(&text) {
            Ok(err_resp) if !err_resp.is_empty() => {
                Some(Box::new(ApiErrorDetails::from(err_resp)))
            }
            _ => None,
        };

        Err(ApiError::ApiError {
            status,
            message: text,
            details,
        })
    }
}

#[async_trait]
impl SaseApi for Client {
    async fn read(&self, path: &str, mkey: &str, query: &ApiQueryParams) -> Result<Value, ApiError> {
        let url = self.url(path, mkey, query);
        self.execute(Method::GET, url, None).await
    }

    async fn create(
        &self,
        path: &str,
        body: &Value,
        query: &ApiQueryParams,
    ) -> Result<Value, ApiError> {
        let url = self.url(path, "", query);
        self.execute(Method::POST, url, Some(body)).await
    }

    async fn update(
        &self,
        path: &str,
        mkey: &str,
        body: &Value,
        query: &ApiQueryParams,
    ) -> Result<Value, ApiError> {
        let url = self.url(path, mkey, query);
        self.execute(Method::PUT, url, Some(body)).await
    }

    async fn delete(&self, path: &str, mkey: &str, query: &ApiQueryParams) -> Result<(), ApiError> {
        let url = self.url(path, mkey, query);
        self.execute(Method::DELETE, url, None).await.map(|_| ())
    }
}

/// Hostnames without a scheme are served over https
fn base_url(hostname: &str) -> Result<url::Url, ApiError> {
    let hostname = hostname.trim().trim_end_matches('/');
    if hostname.is_empty() {
        return Err(ApiError::InvalidUrl("hostname is empty".to_string()));
    }

    let with_scheme = if hostname.contains("://") {
        hostname.to_string()
    } else {
        format!("https://{}", hostname)
    };

    url::Url::parse(&with_scheme).map_err(|e| ApiError::InvalidUrl(format!("{}: {}", hostname, e)))
}
