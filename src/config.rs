use crate::merger::EnrichmentFailurePolicy;
use serde::Deserialize;

pub const DEFAULT_BASE_URL: &str = "https://api.explorium.ai";
pub const DEFAULT_CREDENTIALS_URL: &str = "http://app.explorium.ai/api";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub port: u16,
    pub api_key: String,
    pub base_url: String,
    pub credentials_url: String,
    pub http_timeout_secs: u64,
    pub enrichment_failure_policy: EnrichmentFailurePolicy,
    pub continue_on_fail: bool,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let config = Self {
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number between 1-65535"))?,
            api_key: std::env::var("EXPLORIUM_API_KEY")
                .map_err(|_| anyhow::anyhow!("EXPLORIUM_API_KEY environment variable required"))
                .and_then(|key| {
                    if key.trim().is_empty() {
                        anyhow::bail!("EXPLORIUM_API_KEY cannot be empty");
                    }
                    Ok(key)
                })?,
            base_url: validate_http_url(
                "EXPLORIUM_BASE_URL",
                std::env::var("EXPLORIUM_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.into()),
            )?,
            credentials_url: validate_http_url(
                "EXPLORIUM_CREDENTIALS_URL",
                std::env::var("EXPLORIUM_CREDENTIALS_URL")
                    .unwrap_or_else(|_| DEFAULT_CREDENTIALS_URL.into()),
            )?,
            http_timeout_secs: std::env::var("HTTP_TIMEOUT_SECS")
                .unwrap_or_else(|_| "30".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("HTTP_TIMEOUT_SECS must be a positive integer"))?,
            enrichment_failure_policy: std::env::var("ENRICHMENT_FAILURE_POLICY")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .map(|s| s.parse())
                .transpose()?
                .unwrap_or_default(),
            continue_on_fail: std::env::var("CONTINUE_ON_FAIL")
                .ok()
                .map(|s| matches!(s.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
                .unwrap_or(false),
        };

        // Log successful configuration load (without sensitive values)
        tracing::info!("Configuration loaded successfully");
        tracing::debug!("Explorium Base URL: {}", config.base_url);
        tracing::debug!(
            "Enrichment failure policy: {:?}",
            config.enrichment_failure_policy
        );
        tracing::debug!("Server Port: {}", config.port);

        Ok(config)
    }

    /// Configuration pointing at an arbitrary base URL, used by tests and tools.
    pub fn with_base_url(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            port: 3000,
            api_key: api_key.into(),
            credentials_url: base_url.clone(),
            base_url,
            http_timeout_secs: 30,
            enrichment_failure_policy: EnrichmentFailurePolicy::default(),
            continue_on_fail: false,
        }
    }
}

fn validate_http_url(name: &str, value: String) -> anyhow::Result<String> {
    let trimmed = value.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        anyhow::bail!("{} cannot be empty", name);
    }
    let parsed = url::Url::parse(trimmed)
        .map_err(|e| anyhow::anyhow!("{} is not a valid URL: {}", name, e))?;
    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        anyhow::bail!("{} must start with http:// or https://", name);
    }
    Ok(trimmed.to_string())
}
