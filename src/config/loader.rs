//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::GatewayConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Parse and validate configuration from TOML text.
pub fn parse_config(content: &str) -> Result<GatewayConfig, ConfigError> {
    let config: GatewayConfig = toml::from_str(content)?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<GatewayConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    parse_config(&content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_config() {
        let config = parse_config(
            r#"
            [listener]
            bind_address = "127.0.0.1:8000"

            [[routes]]
            name = "path_param"
            method = "GET"
            prefix = "/gateway_endpoint"
            gateway_path = "/path_param/{random_int}"
            service_url = "http://microservice.localtest.me:8002"
            service_path = "/v1/path_param/{random_int}"
            override_headers = false
            query_params = ["random_int"]
            "#,
        )
        .unwrap();
        assert_eq!(config.routes.len(), 1);
        assert!(!config.routes[0].override_headers);
    }

    #[test]
    fn test_parse_error() {
        let err = parse_config("[[routes]]\nname = 1").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_validation_error_message_lists_problems() {
        let err = parse_config(
            r#"
            [[routes]]
            name = "a"
            method = "GET"
            gateway_path = "/a"
            service_url = "not a url"
            timeout_secs = 0
            "#,
        )
        .unwrap_err();
        let message = err.to_string();
        assert!(message.starts_with("Validation failed: "));
        assert!(message.contains("service_url 'not a url'"));
        assert!(message.contains("timeout_secs"));
    }

    #[test]
    fn test_missing_file() {
        let err = load_config(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn test_bundled_sample_config() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("gateway.toml");
        let config = load_config(&path).unwrap();
        assert_eq!(config.routes.len(), 10);
        assert!(config
            .routes
            .iter()
            .all(|r| r.prefix == "/gateway_endpoint"));
    }
}
