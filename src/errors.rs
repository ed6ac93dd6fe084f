use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use std::fmt;

/// Application-specific error types.
#[derive(Debug, Clone)]
pub enum AppError {
    /// A raw JSON input field could not be parsed.
    InvalidInput(String),
    /// JSON inputs were supplied but merged into an object with no keys.
    EmptyInput(String),
    /// A required identifier, ID or event type is missing.
    ValidationError(String),
    /// The requested operation does not exist.
    UnknownOperation(String),
    /// The `(type, enrichment)` pair has no bulk endpoint.
    UnknownEnrichmentType(String),
    /// Non-2xx response from the remote API.
    UpstreamError {
        /// HTTP status returned by the remote API.
        status: u16,
        /// Parsed response body, or the raw text wrapped in a JSON string.
        body: Option<Value>,
    },
    /// The request never produced a response (connect, timeout, decode).
    TransportError(String),
    /// Missing or rejected API credentials.
    Unauthorized(String),
    /// Error with context chain for better debugging.
    WithContext {
        /// The underlying source of the error.
        source: Box<AppError>,
        /// Additional context message.
        context: String,
    },
}

impl AppError {
    /// Returns the innermost error, skipping any context wrappers.
    pub fn root(&self) -> &AppError {
        match self {
            AppError::WithContext { source, .. } => source.root(),
            other => other,
        }
    }

    /// Whether this error was raised before any network call was attempted.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self.root(),
            AppError::InvalidInput(_)
                | AppError::EmptyInput(_)
                | AppError::ValidationError(_)
                | AppError::UnknownOperation(_)
                | AppError::UnknownEnrichmentType(_)
        )
    }
}

impl fmt::Display for AppError {
    /// Formats the error for display.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
            AppError::EmptyInput(msg) => write!(f, "Empty input: {}", msg),
            AppError::ValidationError(msg) => write!(f, "Validation error: {}", msg),
            AppError::UnknownOperation(op) => write!(f, "Operation {} not found", op),
            AppError::UnknownEnrichmentType(msg) => {
                write!(f, "Unknown enrichment type: {}", msg)
            }
            AppError::UpstreamError { status, body } => {
                write!(f, "Request failed with status: {}.", status)?;
                if let Some(body) = body {
                    let pretty =
                        serde_json::to_string_pretty(body).unwrap_or_else(|_| body.to_string());
                    write!(f, "\ndata: {}", pretty)?;
                }
                Ok(())
            }
            AppError::TransportError(msg) => write!(f, "Transport error: {}", msg),
            AppError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            AppError::WithContext { source, context } => {
                write!(f, "{}: {}", context, source)
            }
        }
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    /// Converts the error into an HTTP response.
    ///
    /// Input errors map to 4xx, remote failures to 5xx. The full message is
    /// returned in every case because it carries the upstream diagnostics.
    fn into_response(self) -> Response {
        let status = match self.root() {
            AppError::InvalidInput(_) | AppError::EmptyInput(_) | AppError::ValidationError(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::UnknownOperation(_) | AppError::UnknownEnrichmentType(_) => {
                StatusCode::NOT_FOUND
            }
            AppError::UpstreamError { status, .. } => {
                tracing::error!("Upstream error: status {}", status);
                StatusCode::BAD_GATEWAY
            }
            AppError::TransportError(msg) => {
                tracing::error!("Transport error: {}", msg);
                StatusCode::SERVICE_UNAVAILABLE
            }
            AppError::Unauthorized(msg) => {
                tracing::warn!("Unauthorized access: {}", msg);
                StatusCode::UNAUTHORIZED
            }
            AppError::WithContext { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if let AppError::WithContext { context, source } = &self {
            tracing::error!("Error with context: {} -> {}", context, source);
        }

        let body = Json(json!({
            "error": self.to_string(),
        }));

        (status, body).into_response()
    }
}

impl From<reqwest::Error> for AppError {
    /// Converts a `reqwest::Error` into an `AppError`.
    fn from(err: reqwest::Error) -> Self {
        AppError::TransportError(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::InvalidInput(err.to_string())
    }
}

/// Extension trait for adding context to errors.
/// Similar to `anyhow::Context` but for our `AppError` type.
pub trait ResultExt<T> {
    /// Add context to an error.
    ///
    /// # Arguments
    ///
    /// * `context` - The context message to add.
    fn context(self, context: impl Into<String>) -> Result<T, AppError>;

    /// Add context lazily (only evaluated on error).
    ///
    /// # Arguments
    ///
    /// * `f` - A closure that produces the context message.
    fn with_context<F>(self, f: F) -> Result<T, AppError>
    where
        F: FnOnce() -> String;
}

impl<T> ResultExt<T> for Result<T, AppError> {
    fn context(self, context: impl Into<String>) -> Result<T, AppError> {
        self.map_err(|e| AppError::WithContext {
            source: Box::new(e),
            context: context.into(),
        })
    }

    fn with_context<F>(self, f: F) -> Result<T, AppError>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| AppError::WithContext {
            source: Box::new(e),
            context: f(),
        })
    }
}
