use log::info;

use crate::config::{RoutingRules, Settings};
use crate::error::ConfigError;

pub const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error", "off"];

pub fn validate(rules: &RoutingRules, health_check: bool) -> Result<(), ConfigError> {
    info!("Starting routing rules validation...");

    for (prefix, rule) in rules {
        for upstream in &rule.upstreams {
            // --- Validate address ---
            if upstream.url.is_empty() {
                return Err(ConfigError::EmptyAddress {
                    prefix: prefix.clone(),
                });
            }

            // --- Validate weight ---
            if upstream.weight == 0 {
                return Err(ConfigError::InvalidWeight {
                    prefix: prefix.clone(),
                    address: upstream.url.clone(),
                });
            }

            // --- Validate health check endpoint ---
            // Filtering would silently exclude an upstream nobody ever probes.
            if health_check && upstream.healthcheck_endpoint.is_none() {
                return Err(ConfigError::MissingHealthcheckEndpoint {
                    prefix: prefix.clone(),
                    address: upstream.url.clone(),
                });
            }
        }
    }

    info!("Routing rules validation passed ({} prefixes)", rules.len());

    Ok(())
}

pub fn validate_settings(settings: &Settings) -> Result<(), ConfigError> {
    if settings.routing_file.is_empty() {
        return Err(ConfigError::InvalidSetting(
            "routing file path is empty".to_string(),
        ));
    }

    if settings.port == 0 {
        return Err(ConfigError::InvalidSetting(
            "port must be between 1 and 65535".to_string(),
        ));
    }

    if settings.health_check_timeout_secs == 0 {
        return Err(ConfigError::InvalidSetting(
            "health check timeout must be at least 1 second".to_string(),
        ));
    }

    if settings.health_check_interval_secs == 0 {
        return Err(ConfigError::InvalidSetting(
            "health check interval must be at least 1 second".to_string(),
        ));
    }

    if !VALID_LOG_LEVELS
        .iter()
        .any(|lvl| lvl.eq_ignore_ascii_case(&settings.log_level))
    {
        return Err(ConfigError::InvalidSetting(format!(
            "invalid log level: {}",
            settings.log_level
        )));
    }

    Ok(())
}
