use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::default::{
    get_default_health_check_interval_secs, get_default_health_check_timeout_secs,
    get_default_log_level, get_default_port, get_default_routing_file,
};

// key = path prefix, e.g. "/test1"
pub type RoutingRules = HashMap<String, RoutingRule>;

#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
pub struct RoutingRule {
    #[serde(default)]
    pub upstreams: Vec<Upstream>,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Upstream {
    #[serde(alias = "address")]
    pub url: String, // "http://10.20.10.10"

    pub weight: u32,

    #[serde(default, alias = "probe_address", skip_serializing_if = "Option::is_none")]
    pub healthcheck_endpoint: Option<String>, // "http://10.20.10.10/health"
}

impl Upstream {
    pub fn new(url: &str, weight: u32, healthcheck_endpoint: Option<&str>) -> Self {
        Self {
            url: url.to_string(),
            weight,
            healthcheck_endpoint: healthcheck_endpoint.map(str::to_string),
        }
    }
}

/// Process-level settings, filled from flags and environment by the binary.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub routing_file: String,

    pub port: u16,

    /// Route only to upstreams whose last probe succeeded.
    pub health_check: bool,

    pub health_check_timeout_secs: u64,

    pub health_check_interval_secs: u64,

    pub log_level: String, // "trace, debug, info, warn, error, off"
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            routing_file: get_default_routing_file(),
            port: get_default_port(),
            health_check: false,
            health_check_timeout_secs: get_default_health_check_timeout_secs(),
            health_check_interval_secs: get_default_health_check_interval_secs(),
            log_level: get_default_log_level(),
        }
    }
}
