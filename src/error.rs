//! Error types for bootproxy.
//!
//! [`BootProxyError`] covers startup and CLI failures (config loading,
//! validation, binding, health checks). [`BootError`] is request-scoped:
//! every failure inside the boot handler becomes one of its variants and is
//! rendered as an HTTP response, never a process exit. [`ValidationError`]
//! describes a single config validation failure.

use std::path::PathBuf;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

#[derive(Debug, Clone)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
    pub suggestion: Option<String>,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "  {}: {}", self.field, self.message)?;
        if let Some(ref suggestion) = self.suggestion {
            write!(f, " ({suggestion})")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

fn format_errors(errors: &[ValidationError]) -> String {
    use std::fmt::Write;
    let mut buf = String::new();
    for (i, e) in errors.iter().enumerate() {
        if i > 0 {
            buf.push('\n');
        }
        // write! to String is infallible
        let _ = write!(buf, "{e}");
    }
    buf
}

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum BootProxyError {
    #[error("Config file not found: {}", path.display())]
    ConfigFileNotFound { path: PathBuf },

    #[error("Config parse error in {path}:\n  {source}")]
    ConfigParse {
        path: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Config validation failed:\n{}", format_errors(.errors))]
    ConfigValidation { errors: Vec<ValidationError> },

    #[error("Unsupported config format: '{0}'")]
    UnsupportedFormat(String),

    #[error("Invalid address: {0}")]
    AddressParse(#[from] std::net::AddrParseError),

    #[error("Invalid URI: {source}")]
    UriParse {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("HTTP request failed: {source}")]
    HttpRequest {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("File already exists: {}", path.display())]
    FileExists { path: PathBuf },

    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("Health check failed with status {0}")]
    HealthCheckFailed(hyper::StatusCode),
}

/// Failure of a single boot request.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum BootError {
    #[error("Invalid store_uri query")]
    InvalidStoreUri,

    #[error("Invalid OS parameter")]
    InvalidOs(String),

    #[error("could not build upstream request: {0}")]
    UpstreamRequest(String),

    #[error("could not contact api: {source}")]
    UpstreamUnavailable {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("could not follow api redirect: {0}")]
    UpstreamRedirect(String),

    #[error("api did not answer within {0}ms")]
    UpstreamTimeout(u64),

    #[error("could not read api response: {source}")]
    UpstreamRead {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("could not encode boot config: {0}")]
    Encode(#[from] serde_json::Error),
}

impl BootError {
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::InvalidStoreUri | Self::InvalidOs(_) => StatusCode::BAD_REQUEST,
            Self::UpstreamRequest(_)
            | Self::UpstreamUnavailable { .. }
            | Self::UpstreamRedirect(_)
            | Self::UpstreamRead { .. } => StatusCode::BAD_GATEWAY,
            Self::UpstreamTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
            Self::Encode(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        matches!(self, Self::InvalidStoreUri | Self::InvalidOs(_))
    }
}

impl IntoResponse for BootError {
    fn into_response(self) -> Response {
        let body = if self.is_client_error() {
            self.to_string()
        } else {
            // Upstream details stay in the logs
            self.status()
                .canonical_reason()
                .unwrap_or("Upstream failure")
                .to_string()
        };
        (self.status(), body).into_response()
    }
}
