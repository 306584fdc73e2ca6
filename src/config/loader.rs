//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::ClientConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Parse and validate configuration from TOML text.
pub fn parse_config(content: &str) -> Result<ClientConfig, ConfigError> {
    let config: ClientConfig = toml::from_str(content)?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<ClientConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config = parse_config(&content)?;

    tracing::info!(
        path = %path.display(),
        base_path = ?config.base_path,
        max_hops = config.redirects.max_hops,
        "Configuration loaded"
    );
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_empty_file_uses_defaults() {
        assert_eq!(parse_config("").unwrap(), ClientConfig::default());
    }

    #[test]
    fn test_full_file() {
        let config = parse_config(
            r#"
            base_path = "https://api.example.test/v1"
            base_params = [["api_key", "k"]]

            [base_headers]
            User-Agent = "fuel-test"

            [timeouts]
            connect_ms = 2000
            read_ms = 5000

            [redirects]
            max_hops = 3

            [workers]
            threads = 2

            [logging]
            json = true
            "#,
        )
        .unwrap();

        assert_eq!(config.base_path.as_deref(), Some("https://api.example.test/v1"));
        assert_eq!(config.base_params, vec![("api_key".to_string(), "k".to_string())]);
        assert_eq!(config.base_headers.get("User-Agent").map(String::as_str), Some("fuel-test"));
        assert_eq!(config.timeouts.read_ms, Some(5000));
        assert_eq!(config.redirects.max_hops, 3);
        assert!(config.redirects.allow);
        assert_eq!(config.workers.threads, 2);
        assert!(config.logging.json);
        assert_eq!(config.logging.filter, "fuel=info");
    }

    #[test]
    fn test_syntax_and_semantic_errors() {
        assert!(matches!(parse_config("timeouts = ["), Err(ConfigError::Parse(_))));
        assert!(matches!(
            parse_config("[workers]\nthreads = 0"),
            Err(ConfigError::Validation(errors)) if errors.len() == 1
        ));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[redirects]\nallow = false").unwrap();
        let config = load_config(file.path()).unwrap();
        assert!(!config.redirects.allow);

        let missing = load_config(Path::new("/nonexistent/fuel.toml"));
        assert!(matches!(missing, Err(ConfigError::Io(_))));
    }
}
