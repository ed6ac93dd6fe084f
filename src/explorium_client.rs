use crate::config::Config;
use crate::endpoints::CREDENTIALS_TEST_PATH;
use crate::errors::AppError;
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

/// Transport-agnostic description of one call to the remote API.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    /// Path relative to the API base URL, e.g. `/v1/businesses/match`.
    pub path: String,
    pub body: Option<Value>,
    pub query: Vec<(String, String)>,
}

impl HttpRequest {
    pub fn post(path: impl Into<String>, body: Value) -> Self {
        Self {
            method: HttpMethod::Post,
            path: path.into(),
            body: Some(body),
            query: Vec::new(),
        }
    }

    pub fn get(path: impl Into<String>, query: Vec<(String, String)>) -> Self {
        Self {
            method: HttpMethod::Get,
            path: path.into(),
            body: None,
            query,
        }
    }
}

/// Authenticated HTTP capability the operations depend on.
///
/// Implementations return the parsed JSON body on 2xx and
/// `AppError::UpstreamError` carrying status and body otherwise.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn send(&self, request: HttpRequest) -> Result<Value, AppError>;
}

/// `HttpTransport` backed by reqwest, authenticating with the `api_key` header.
#[derive(Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
    base_url: String,
    credentials_url: String,
    api_key: String,
}

impl ReqwestTransport {
    /// Creates a new `ReqwestTransport`.
    ///
    /// # Arguments
    ///
    /// * `config` - Base URLs, API key and request timeout.
    pub fn new(config: &Config) -> Result<Self, AppError> {
        if config.api_key.trim().is_empty() {
            return Err(AppError::Unauthorized("Explorium API key is empty".to_string()));
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.http_timeout_secs))
            .build()
            .map_err(|e| {
                AppError::TransportError(format!("Failed to create Explorium client: {}", e))
            })?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            credentials_url: config.credentials_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }

    /// Checks the API key against the credit service.
    ///
    /// # Returns
    ///
    /// * `Result<Value, AppError>` - The credits payload, or `Unauthorized` on 401/403.
    pub async fn verify_credentials(&self) -> Result<Value, AppError> {
        let url = format!("{}{}", self.credentials_url, CREDENTIALS_TEST_PATH);
        tracing::info!("Verifying Explorium credentials: {}", url);

        let response = self
            .client
            .get(&url)
            .header("api_key", &self.api_key)
            .send()
            .await
            .map_err(|e| AppError::TransportError(format!("Credential check failed: {}", e)))?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN
        {
            return Err(AppError::Unauthorized(format!(
                "Explorium rejected the API key ({})",
                status
            )));
        }
        read_json(response).await
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<Value, AppError> {
        let url = format!("{}{}", self.base_url, request.path);
        tracing::info!("Explorium {:?} {}", request.method, request.path);

        let builder = match request.method {
            HttpMethod::Get => self.client.get(&url),
            HttpMethod::Post => self.client.post(&url),
        };
        let mut builder = builder
            .header("api_key", &self.api_key)
            .header("Content-Type", "application/json");
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(|e| {
            AppError::TransportError(format!("Explorium request to {} failed: {}", request.path, e))
        })?;

        read_json(response).await
    }
}

async fn read_json(response: reqwest::Response) -> Result<Value, AppError> {
    let status = response.status();
    let text = response
        .text()
        .await
        .map_err(|e| AppError::TransportError(format!("Failed to read response body: {}", e)))?;

    if !status.is_success() {
        tracing::error!("Explorium returned error {}: {}", status, text);
        let body = if text.trim().is_empty() {
            None
        } else {
            Some(serde_json::from_str(&text).unwrap_or(Value::String(text)))
        };
        return Err(AppError::UpstreamError {
            status: status.as_u16(),
            body,
        });
    }

    if text.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(&text).map_err(|e| {
        AppError::TransportError(format!("Failed to parse Explorium response: {}", e))
    })
}


#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_client_creation() {
        let config = Config::with_base_url("https://example.com/", "token");
        let transport = ReqwestTransport::new(&config).unwrap();
        assert_eq!(transport.base_url, "https://example.com");
    }

    #[tokio::test]
    async fn test_client_rejects_blank_key() {
        let config = Config::with_base_url("https://example.com", "  ");
        assert!(matches!(
            ReqwestTransport::new(&config),
            Err(AppError::Unauthorized(_))
        ));
    }
}
