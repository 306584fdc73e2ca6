//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, hop limit, worker count)
//! - Check the base path is an absolute http(s) URL
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ClientConfig → Result<(), Vec<ValidationError>>

use std::fmt;

use url::Url;

use crate::config::schema::ClientConfig;

/// One semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field.
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

pub fn validate_config(config: &ClientConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if let Some(base_path) = &config.base_path {
        match Url::parse(base_path) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {}
            Ok(url) => errors.push(ValidationError::new(
                "base_path",
                format!("unsupported scheme '{}'", url.scheme()),
            )),
            Err(e) => errors.push(ValidationError::new(
                "base_path",
                format!("not an absolute URL: {}", e),
            )),
        }
    }

    for name in config.base_headers.keys() {
        if name.trim().is_empty() {
            errors.push(ValidationError::new("base_headers", "header name is empty"));
        }
    }

    if config.timeouts.connect_ms == 0 {
        errors.push(ValidationError::new("timeouts.connect_ms", "must be greater than 0"));
    }
    if config.timeouts.read_ms == Some(0) {
        errors.push(ValidationError::new("timeouts.read_ms", "must be greater than 0"));
    }

    if config.redirects.allow && config.redirects.max_hops == 0 {
        errors.push(ValidationError::new(
            "redirects.max_hops",
            "must be greater than 0 when redirects are allowed",
        ));
    }

    if config.workers.threads == 0 {
        errors.push(ValidationError::new("workers.threads", "must be greater than 0"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
