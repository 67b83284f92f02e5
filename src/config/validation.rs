//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Reject malformed backend addresses before the pool is built
//! - Validate value ranges (intervals and timeouts > 0)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ProxyConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use thiserror::Error;
use url::Url;

use crate::config::schema::ProxyConfig;

/// A single semantic problem found in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("at least one backend is required")]
    NoBackends,

    #[error("backend `{address}` is not a valid URL: {reason}")]
    InvalidBackend { address: String, reason: String },

    #[error("backend `{0}` must use http")]
    UnsupportedScheme(String),

    #[error("backend `{0}` has no host")]
    MissingHost(String),

    #[error("health check path `{0}` must start with `/`")]
    InvalidHealthPath(String),

    #[error("`{0}` must be greater than zero")]
    Zero(&'static str),
}

/// Validate a configuration, collecting every problem found.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.backends.is_empty() {
        errors.push(ValidationError::NoBackends);
    }

    for address in &config.backends {
        if let Err(e) = check_backend(address) {
            errors.push(e);
        }
    }

    if config.health_check.enabled {
        if config.health_check.interval_secs == 0 {
            errors.push(ValidationError::Zero("health_check.interval_secs"));
        }
        if config.health_check.timeout_secs == 0 {
            errors.push(ValidationError::Zero("health_check.timeout_secs"));
        }
        if !config.health_check.path.starts_with('/') {
            errors.push(ValidationError::InvalidHealthPath(config.health_check.path.clone()));
        }
    }

    if config.retries.max_attempts == 0 {
        errors.push(ValidationError::Zero("retries.max_attempts"));
    }
    if config.timeouts.forward_secs == 0 {
        errors.push(ValidationError::Zero("timeouts.forward_secs"));
    }
    if config.timeouts.connect_secs == 0 {
        errors.push(ValidationError::Zero("timeouts.connect_secs"));
    }
    if config.listener.max_body_bytes == 0 {
        errors.push(ValidationError::Zero("listener.max_body_bytes"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Parse one backend address the same way the pool will.
pub fn check_backend(address: &str) -> Result<Url, ValidationError> {
    let url = Url::parse(address).map_err(|e| ValidationError::InvalidBackend {
        address: address.to_string(),
        reason: e.to_string(),
    })?;

    if url.scheme() != "http" {
        return Err(ValidationError::UnsupportedScheme(address.to_string()));
    }
    if url.host_str().is_none() {
        return Err(ValidationError::MissingHost(address.to_string()));
    }

    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&ProxyConfig::default()).is_ok());
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = ProxyConfig::default();
        config.backends = vec![
            "not a url".to_string(),
            "ftp://127.0.0.1:21".to_string(),
            "http://127.0.0.1:6000".to_string(),
        ];
        config.retries.max_attempts = 0;
        config.health_check.interval_secs = 0;

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 4);
        assert!(matches!(errors[0], ValidationError::InvalidBackend { .. }));
        assert_eq!(errors[1], ValidationError::UnsupportedScheme("ftp://127.0.0.1:21".into()));
        assert!(errors.contains(&ValidationError::Zero("retries.max_attempts")));
        assert!(errors.contains(&ValidationError::Zero("health_check.interval_secs")));
    }

    #[test]
    fn test_empty_backends() {
        let mut config = ProxyConfig::default();
        config.backends.clear();
        assert_eq!(validate_config(&config).unwrap_err(), vec![ValidationError::NoBackends]);
    }

    #[test]
    fn test_disabled_health_check_skips_interval() {
        let mut config = ProxyConfig::default();
        config.health_check.enabled = false;
        config.health_check.interval_secs = 0;
        config.health_check.path = "health".to_string();
        assert!(validate_config(&config).is_ok());

        config.health_check.enabled = true;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![
                ValidationError::Zero("health_check.interval_secs"),
                ValidationError::InvalidHealthPath("health".to_string()),
            ]
        );
    }
}
