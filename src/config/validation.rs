use std::{collections::HashSet, net::SocketAddr};

use url::Url;

use crate::config::models::{GatewayConfig, RateLimitConfig, RouteRuleConfig};

/// Validation result type alias
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Validation error types
#[derive(Debug, thiserror::Error, Clone)]
pub enum ValidationError {
    #[error("Missing required field: {field}")]
    MissingField { field: String },

    #[error("Invalid field '{field}': {message}")]
    InvalidField { field: String, message: String },

    #[error("Invalid listen address '{address}': {reason}")]
    InvalidListenAddress { address: String, reason: String },

    #[error("Route conflict detected: {message}")]
    RouteConflict { message: String },

    #[error("Validation failed: {message}")]
    ValidationFailed { message: String },
}

/// Gateway configuration validator
pub struct GatewayConfigValidator;

impl GatewayConfigValidator {
    /// Validate the entire gateway configuration.
    pub fn validate(config: &GatewayConfig) -> ValidationResult<()> {
        let mut errors = Vec::new();

        if let Err(e) = Self::validate_listen_address(&config.listen_addr) {
            errors.push(e);
        }

        if let Err(e) = Self::validate_url(&config.registry_url, "registry_url") {
            errors.push(e);
        }

        if let Err(e) = Self::validate_url(&config.broker_url, "broker_url") {
            errors.push(e);
        }

        if config.forward_timeout_secs == 0 {
            errors.push(ValidationError::InvalidField {
                field: "forward_timeout_secs".to_string(),
                message: "Forwarding timeout must be greater than 0".to_string(),
            });
        }

        if let Err(mut rate_errors) = Self::validate_rate_limit(&config.rate_limit) {
            errors.append(&mut rate_errors);
        }

        if config.routes.is_empty() {
            errors.push(ValidationError::MissingField {
                field: "routes".to_string(),
            });
        } else {
            for route in &config.routes {
                if let Err(mut route_errors) = Self::validate_single_route(route) {
                    errors.append(&mut route_errors);
                }
            }
            if let Err(conflict_errors) = Self::check_route_conflicts(&config.routes) {
                errors.extend(conflict_errors);
            }
        }

        if config.routes.iter().any(|r| r.require_auth) && config.jwt_secret.is_empty() {
            errors.push(ValidationError::MissingField {
                field: "jwt_secret".to_string(),
            });
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::ValidationFailed {
                message: Self::format_multiple_errors(errors),
            })
        }
    }

    /// Validate listen address format
    fn validate_listen_address(address: &str) -> ValidationResult<()> {
        if address.parse::<SocketAddr>().is_err() {
            return Err(ValidationError::InvalidListenAddress {
                address: address.to_string(),
                reason: "Must be in format 'IP:PORT' (e.g., '127.0.0.1:3000' or '0.0.0.0:8080')"
                    .to_string(),
            });
        }
        Ok(())
    }

    fn validate_url(value: &str, field: &str) -> ValidationResult<()> {
        if Url::parse(value).is_err() {
            return Err(ValidationError::InvalidField {
                field: field.to_string(),
                message: format!("'{value}' is not a valid URL"),
            });
        }
        Ok(())
    }

    fn validate_rate_limit(rate_limit: &RateLimitConfig) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if rate_limit.requests == 0 {
            errors.push(ValidationError::InvalidField {
                field: "rate_limit.requests".to_string(),
                message: "Rate limit threshold must be greater than 0".to_string(),
            });
        }

        if let Err(e) = humantime::parse_duration(&rate_limit.period) {
            errors.push(ValidationError::InvalidField {
                field: "rate_limit.period".to_string(),
                message: format!("'{}' is not a valid duration: {e}", rate_limit.period),
            });
        }

        if rate_limit.api_key_header.is_empty() {
            errors.push(ValidationError::MissingField {
                field: "rate_limit.api_key_header".to_string(),
            });
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }

    /// Validate a single route rule
    fn validate_single_route(route: &RouteRuleConfig) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if !route.prefix.starts_with('/') {
            errors.push(ValidationError::InvalidField {
                field: format!("route prefix: {}", route.prefix),
                message: "Route prefixes must start with '/'".to_string(),
            });
        }

        if route.service.is_empty() {
            errors.push(ValidationError::MissingField {
                field: format!("route '{}' service", route.prefix),
            });
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }

    /// Duplicate prefixes would make the declaration-order tie-break silently
    /// shadow a rule; reject them outright.
    fn check_route_conflicts(routes: &[RouteRuleConfig]) -> Result<(), Vec<ValidationError>> {
        let mut seen = HashSet::new();
        let mut errors = Vec::new();

        for route in routes {
            if !seen.insert(route.prefix.as_str()) {
                errors.push(ValidationError::RouteConflict {
                    message: format!("prefix '{}' is declared more than once", route.prefix),
                });
            }
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }

    /// Format multiple validation errors into a single report.
    fn format_multiple_errors(errors: Vec<ValidationError>) -> String {
        if errors.len() == 1 {
            return errors[0].to_string();
        }

        let mut message = format!("Found {} validation errors:\n", errors.len());
        for (i, error) in errors.iter().enumerate() {
            message.push_str(&format!("  {}. {}\n", i + 1, error));
        }
        message
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::models::GatewayConfig;

    fn minimal_valid_config() -> GatewayConfig {
        GatewayConfig {
            jwt_secret: "secret".to_string(),
            ..GatewayConfig::default()
        }
    }

    #[test]
    fn validate_accepts_default_config_with_secret() {
        assert!(GatewayConfigValidator::validate(&minimal_valid_config()).is_ok());
    }

    #[test]
    fn validate_rejects_bad_listen_address() {
        let mut config = minimal_valid_config();
        config.listen_addr = "not-an-address".to_string();
        assert!(GatewayConfigValidator::validate(&config).is_err());
    }

    #[test]
    fn validate_rejects_empty_route_table() {
        let mut config = minimal_valid_config();
        config.routes.clear();
        assert!(GatewayConfigValidator::validate(&config).is_err());
    }

    #[test]
    fn validate_rejects_prefix_without_leading_slash() {
        let mut config = minimal_valid_config();
        config.routes[0].prefix = "auth".to_string();
        assert!(GatewayConfigValidator::validate(&config).is_err());
    }

    #[test]
    fn validate_rejects_duplicate_prefixes() {
        let mut config = minimal_valid_config();
        let duplicate = config.routes[0].clone();
        config.routes.push(duplicate);
        assert!(GatewayConfigValidator::validate(&config).is_err());
    }

    #[test]
    fn validate_rejects_zero_rate_limit() {
        let mut config = minimal_valid_config();
        config.rate_limit.requests = 0;
        assert!(GatewayConfigValidator::validate(&config).is_err());
    }

    #[test]
    fn validate_rejects_unparseable_window() {
        let mut config = minimal_valid_config();
        config.rate_limit.period = "every-so-often".to_string();
        assert!(GatewayConfigValidator::validate(&config).is_err());
    }

    #[test]
    fn validate_requires_secret_when_a_route_is_gated() {
        let mut config = minimal_valid_config();
        config.jwt_secret = String::new();
        let err = GatewayConfigValidator::validate(&config).unwrap_err();
        assert!(err.to_string().contains("jwt_secret"));
    }

    #[test]
    fn validate_rejects_invalid_broker_url() {
        let mut config = minimal_valid_config();
        config.broker_url = "not a url".to_string();
        assert!(GatewayConfigValidator::validate(&config).is_err());
    }
}
