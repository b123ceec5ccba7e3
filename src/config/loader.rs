use std::path::Path;

use config::{Config, Environment, File, FileFormat};
use eyre::{Context, Result};

use crate::config::models::GatewayConfig;

/// Load configuration from an optional file plus the `GATEWAY_*` environment
/// overlay. Supports multiple file formats: YAML, JSON, TOML, etc.
pub async fn load_config(config_path: Option<&str>) -> Result<GatewayConfig> {
    load_config_sync(config_path)
}

/// Load configuration synchronously.
///
/// Environment variables override file values; nested fields use `__`, e.g.
/// `GATEWAY_RATE_LIMIT__REQUESTS=50`. Anything not supplied falls back to the
/// serde defaults in [`GatewayConfig`].
pub fn load_config_sync(config_path: Option<&str>) -> Result<GatewayConfig> {
    let mut builder = Config::builder();

    if let Some(path) = config_path {
        let format = match Path::new(path).extension().and_then(|ext| ext.to_str()) {
            Some("yaml") | Some("yml") => FileFormat::Yaml,
            Some("json") => FileFormat::Json,
            Some("toml") => FileFormat::Toml,
            Some("ini") => FileFormat::Ini,
            _ => FileFormat::Yaml, // Default to YAML
        };
        builder = builder.add_source(File::new(path, format));
    }

    let settings = builder
        .add_source(
            Environment::with_prefix("GATEWAY")
                .separator("__")
                .try_parsing(true),
        )
        .build()
        .wrap_err("Failed to build configuration")?;

    let gateway_config: GatewayConfig = settings
        .try_deserialize()
        .wrap_err("Failed to deserialize gateway configuration")?;

    Ok(gateway_config)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::NamedTempFile;

    use super::*;

    #[tokio::test]
    async fn test_load_yaml_config() {
        let yaml_content = r#"
listen_addr: "127.0.0.1:4000"
registry_url: "http://registry:8500/v1/catalog/service"
jwt_secret: "test-secret"
rate_limit:
  requests: 5
  period: "1m"
routes:
  - prefix: "/api"
    service: "api-service"
  - prefix: "/api/admin"
    service: "admin-service"
    require_auth: true
"#;

        let mut temp_file = NamedTempFile::with_suffix(".yaml").unwrap();
        write!(temp_file, "{}", yaml_content).unwrap();

        let config = load_config(temp_file.path().to_str()).await.unwrap();
        assert_eq!(config.listen_addr, "127.0.0.1:4000");
        assert_eq!(config.rate_limit.requests, 5);
        assert_eq!(config.routes.len(), 2);
        assert!(config.routes[1].require_auth);
    }

    #[tokio::test]
    async fn test_load_toml_config() {
        let toml_content = r#"
listen_addr = "0.0.0.0:3000"
forward_timeout_secs = 5

[[routes]]
prefix = "/auth"
service = "auth-service"
"#;

        let mut temp_file = NamedTempFile::with_suffix(".toml").unwrap();
        write!(temp_file, "{}", toml_content).unwrap();

        let config = load_config(temp_file.path().to_str()).await.unwrap();
        assert_eq!(config.listen_addr, "0.0.0.0:3000");
        assert_eq!(config.forward_timeout_secs, 5);
        assert_eq!(config.routes.len(), 1);
        // Unspecified sections keep their defaults.
        assert_eq!(config.rate_limit.requests, 100);
    }

    #[tokio::test]
    async fn test_missing_file_defaults() {
        let config = load_config(None).await.unwrap();
        assert_eq!(config.listen_addr, "127.0.0.1:3000");
        assert!(!config.routes.is_empty());
    }
}
