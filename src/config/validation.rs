//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, attempts > 0, ratios in range)
//! - Detect duplicate network ids and unparsable endpoint URLs
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ClientConfig → Result<(), Vec<ValidationError>>

use std::collections::HashSet;

use thiserror::Error;
use url::Url;

use crate::config::schema::ClientConfig;

/// A single semantic problem found in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("dispatch.max_concurrent must be at least 1")]
    ZeroConcurrency,

    #[error("dispatch.max_total_attempts must be at least 1 when set")]
    ZeroTotalAttempts,

    #[error("health.unhealthy_threshold must be at least 1")]
    ZeroUnhealthyThreshold,

    #[error("health.healthy_ratio must be within [0, 1]")]
    HealthyRatioOutOfRange,

    #[error("health_check.{0} must be greater than zero")]
    ZeroHealthCheckSetting(&'static str),

    #[error("network id must not be empty")]
    EmptyNetworkId,

    #[error("duplicate network id '{0}'")]
    DuplicateNetwork(String),

    #[error("network '{network}': invalid rpc url '{url}'")]
    InvalidUrl { network: String, url: String },

    #[error("network '{0}': retry_attempts must be at least 1")]
    ZeroRetryAttempts(String),

    #[error("network '{0}': request_timeout_ms must be greater than zero")]
    ZeroRequestTimeout(String),
}

/// Validate a parsed configuration.
pub fn validate_config(config: &ClientConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.dispatch.max_concurrent == 0 {
        errors.push(ValidationError::ZeroConcurrency);
    }
    if config.dispatch.max_total_attempts == Some(0) {
        errors.push(ValidationError::ZeroTotalAttempts);
    }
    if config.health.unhealthy_threshold == 0 {
        errors.push(ValidationError::ZeroUnhealthyThreshold);
    }
    if !(0.0..=1.0).contains(&config.health.healthy_ratio) {
        errors.push(ValidationError::HealthyRatioOutOfRange);
    }
    if config.health_check.enabled {
        if config.health_check.interval_secs == 0 {
            errors.push(ValidationError::ZeroHealthCheckSetting("interval_secs"));
        }
        if config.health_check.timeout_secs == 0 {
            errors.push(ValidationError::ZeroHealthCheckSetting("timeout_secs"));
        }
    }

    let mut seen = HashSet::new();
    for network in &config.networks {
        if network.id.trim().is_empty() {
            errors.push(ValidationError::EmptyNetworkId);
        } else if !seen.insert(network.id.as_str()) {
            errors.push(ValidationError::DuplicateNetwork(network.id.clone()));
        }

        for url in &network.rpc_urls {
            if Url::parse(url).is_err() {
                errors.push(ValidationError::InvalidUrl {
                    network: network.id.clone(),
                    url: url.clone(),
                });
            }
        }

        if network.retry_attempts == 0 {
            errors.push(ValidationError::ZeroRetryAttempts(network.id.clone()));
        }
        if network.request_timeout_ms == 0 {
            errors.push(ValidationError::ZeroRequestTimeout(network.id.clone()));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::NetworkConfig;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&ClientConfig::default()).is_ok());
    }

    #[test]
    fn test_collects_every_error() {
        let mut config = ClientConfig::default();
        config.dispatch.max_concurrent = 0;
        config.health.healthy_ratio = 1.5;

        let mut bad = NetworkConfig::new("1", vec!["not a url".into()]);
        bad.retry_attempts = 0;
        config.networks.push(bad);
        config.networks.push(NetworkConfig::new("1", vec![]));

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 5);
        assert!(errors.contains(&ValidationError::ZeroConcurrency));
        assert!(errors.contains(&ValidationError::HealthyRatioOutOfRange));
        assert!(errors.contains(&ValidationError::DuplicateNetwork("1".into())));
        assert!(errors.contains(&ValidationError::ZeroRetryAttempts("1".into())));
    }

    #[test]
    fn test_disabled_health_check_skips_interval_checks() {
        let mut config = ClientConfig::default();
        config.health_check.enabled = false;
        config.health_check.interval_secs = 0;
        assert!(validate_config(&config).is_ok());
    }
}
