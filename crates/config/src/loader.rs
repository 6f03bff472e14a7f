use std::fs;

use log::info;

use crate::config::RoutingRules;
use crate::error::ConfigError;

pub fn read_routing_rules(filename: &str) -> Result<RoutingRules, ConfigError> {
    info!("Reading routing file at {}", filename);

    let text = fs::read_to_string(filename).map_err(|source| ConfigError::Read {
        path: filename.to_string(),
        source,
    })?;

    parse_routing_rules(&text, filename)
}

/// Parses routing rules from JSON text. `origin` only names the source in errors.
pub fn parse_routing_rules(text: &str, origin: &str) -> Result<RoutingRules, ConfigError> {
    serde_json::from_str(text).map_err(|source| ConfigError::Parse {
        path: origin.to_string(),
        source,
    })
}
