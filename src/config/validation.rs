//! Configuration validation with detailed error reporting.
//!
//! The [`validate`] function checks a parsed [`Config`] for malformed URLs,
//! unsupported schemes, slash placement that would produce broken URLs when
//! concatenated, and a zero timeout. Returns every [`ValidationError`] found,
//! with suggestions where a fix is obvious.

use url::Url;

use super::model::Config;
use crate::error::ValidationError;

/// Validate an absolute http(s) URL. Returns `Ok(())` or a human-readable error.
pub fn validate_http_url(url: &str) -> Result<(), String> {
    match Url::parse(url) {
        Ok(parsed) => {
            let scheme = parsed.scheme();
            if scheme != "http" && scheme != "https" {
                Err(format!(
                    "unsupported scheme '{scheme}' (expected http or https)"
                ))
            } else {
                Ok(())
            }
        }
        Err(_) => Err(format!("'{url}' is not a valid URL")),
    }
}

pub fn validate(config: &Config) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let base_url = &config.upstream.base_url;
    if let Err(msg) = validate_http_url(base_url) {
        errors.push(ValidationError {
            field: "upstream.base_url".into(),
            message: msg,
            suggestion: None,
        });
    } else if !base_url.ends_with('/') {
        errors.push(ValidationError {
            field: "upstream.base_url".into(),
            message: "must end with '/' (the platform segment is appended directly)".into(),
            suggestion: Some(format!("did you mean '{base_url}/'?")),
        });
    }

    if config.upstream.timeout == 0 {
        errors.push(ValidationError {
            field: "upstream.timeout".into(),
            message: "timeout must be greater than 0".into(),
            suggestion: Some("the default is 5000ms".into()),
        });
    }

    let local = &config.rewrite.local_boot_uri;
    if let Err(msg) = validate_http_url(local) {
        errors.push(ValidationError {
            field: "rewrite.local_boot_uri".into(),
            message: msg,
            suggestion: None,
        });
    } else if local.ends_with('/') {
        errors.push(ValidationError {
            field: "rewrite.local_boot_uri".into(),
            message: "must not end with '/' (the request path is appended directly)".into(),
            suggestion: Some(format!("did you mean '{}'?", local.trim_end_matches('/'))),
        });
    }

    if let Err(msg) = validate_http_url(&config.rewrite.store_uri) {
        errors.push(ValidationError {
            field: "rewrite.store_uri".into(),
            message: msg,
            suggestion: None,
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[must_use]
pub fn format_validation_report(path: &str, config: &Config) -> String {
    let lines = [
        format!("  upstream:       {}", config.upstream.base_url),
        format!("  timeout:        {}ms", config.upstream.timeout),
        format!("  local boot uri: {}", config.rewrite.local_boot_uri),
        format!("  store uri:      {}", config.rewrite.store_uri),
    ];
    format!("{} is valid\n{}", path, lines.join("\n"))
}
