//! Routing table, weighted distributions and prefix resolution.

use std::{
    collections::HashMap,
    sync::atomic::{AtomicBool, Ordering},
};

use steer_config::config::{RoutingRules, Upstream as UpstreamConfig};

pub mod distribution;
pub mod resolver;

pub use distribution::{Distributions, PrefixDistribution, WeightedDistribution, build};
pub use resolver::{Resolution, Router, resolve};

/// One candidate destination for a prefix.
///
/// Everything but the health flag is fixed at startup. The flag is only
/// written by the health refresher and starts out `false`.
#[derive(Debug)]
pub struct Upstream {
    address: String,
    weight: u32,
    probe_address: Option<String>,
    healthy: AtomicBool,
}

impl Upstream {
    pub fn new(address: impl Into<String>, weight: u32, probe_address: Option<String>) -> Self {
        Self {
            address: address.into(),
            weight,
            probe_address,
            healthy: AtomicBool::new(false),
        }
    }

    pub fn from_config(upstream: &UpstreamConfig) -> Self {
        Self::new(
            upstream.url.clone(),
            upstream.weight,
            upstream.healthcheck_endpoint.clone(),
        )
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn weight(&self) -> u32 {
        self.weight
    }

    pub fn probe_address(&self) -> Option<&str> {
        self.probe_address.as_deref()
    }

    pub fn is_healthy(&self) -> bool {
        self.healthy.load(Ordering::Acquire)
    }

    /// Stores the new flag and returns the previous one.
    pub fn set_healthy(&self, healthy: bool) -> bool {
        self.healthy.swap(healthy, Ordering::AcqRel)
    }

    /// Whether this upstream may be selected under the given filtering mode.
    ///
    /// With filtering on, an upstream nobody probes is never eligible.
    pub fn is_eligible(&self, health_filter: bool) -> bool {
        !health_filter || (self.probe_address.is_some() && self.is_healthy())
    }
}

#[derive(Debug, Default)]
pub struct RoutingRule {
    upstreams: Vec<Upstream>,
}

impl RoutingRule {
    pub fn new(upstreams: Vec<Upstream>) -> Self {
        Self { upstreams }
    }

    pub fn upstreams(&self) -> &[Upstream] {
        &self.upstreams
    }

    pub fn eligible(&self, health_filter: bool) -> impl Iterator<Item = &Upstream> {
        self.upstreams
            .iter()
            .filter(move |upstream| upstream.is_eligible(health_filter))
    }
}

/// Prefix -> rule mapping. The key set never changes after construction.
#[derive(Debug, Default)]
pub struct RoutingTable {
    rules: HashMap<String, RoutingRule>,
}

impl RoutingTable {
    pub fn new(rules: HashMap<String, RoutingRule>) -> Self {
        Self { rules }
    }

    pub fn from_rules(rules: &RoutingRules) -> Self {
        let rules = rules
            .iter()
            .map(|(prefix, rule)| {
                let upstreams = rule.upstreams.iter().map(Upstream::from_config).collect();
                (prefix.clone(), RoutingRule::new(upstreams))
            })
            .collect();
        Self { rules }
    }

    pub fn lookup(&self, prefix: &str) -> Option<&RoutingRule> {
        self.rules.get(prefix)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &RoutingRule)> {
        self.rules
            .iter()
            .map(|(prefix, rule)| (prefix.as_str(), rule))
    }

    /// Every upstream in the table, paired with its prefix.
    pub fn upstreams(&self) -> impl Iterator<Item = (&str, &Upstream)> {
        self.iter().flat_map(|(prefix, rule)| {
            rule.upstreams()
                .iter()
                .map(move |upstream| (prefix, upstream))
        })
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use steer_config::config::RoutingRule as RuleConfig;

    use super::*;

    fn config_rules() -> RoutingRules {
        let mut rules = RoutingRules::new();
        rules.insert(
            "/test1".to_string(),
            RuleConfig {
                upstreams: vec![
                    UpstreamConfig::new("http://a", 1, Some("http://a/health")),
                    UpstreamConfig::new("http://b", 2, None),
                ],
            },
        );
        rules.insert("/empty".to_string(), RuleConfig::default());
        rules
    }

    #[test]
    fn table_is_built_from_config() {
        let table = RoutingTable::from_rules(&config_rules());

        assert_eq!(table.len(), 2);
        let rule = table.lookup("/test1").unwrap();
        assert_eq!(rule.upstreams().len(), 2);
        assert_eq!(rule.upstreams()[0].address(), "http://a");
        assert_eq!(rule.upstreams()[0].probe_address(), Some("http://a/health"));
        assert_eq!(rule.upstreams()[1].weight(), 2);
        assert!(table.lookup("/empty").unwrap().upstreams().is_empty());
        assert!(table.lookup("/missing").is_none());
    }

    #[test]
    fn upstreams_start_unhealthy() {
        let table = RoutingTable::from_rules(&config_rules());
        assert!(table.upstreams().all(|(_, upstream)| !upstream.is_healthy()));
    }

    #[test]
    fn set_healthy_returns_previous_value() {
        let upstream = Upstream::new("http://a", 1, Some("http://a/health".to_string()));

        assert!(!upstream.set_healthy(true));
        assert!(upstream.is_healthy());
        assert!(upstream.set_healthy(false));
        assert!(!upstream.is_healthy());
    }

    #[test]
    fn eligibility_follows_filter_mode() {
        let probed = Upstream::new("http://a", 1, Some("http://a/health".to_string()));
        let unprobed = Upstream::new("http://b", 1, None);

        assert!(probed.is_eligible(false));
        assert!(unprobed.is_eligible(false));
        assert!(!probed.is_eligible(true));

        probed.set_healthy(true);
        unprobed.set_healthy(true);
        assert!(probed.is_eligible(true));
        assert!(!unprobed.is_eligible(true));
    }

    #[test]
    fn upstreams_iterates_every_prefix() {
        let table = RoutingTable::from_rules(&config_rules());
        let mut seen: Vec<(&str, &str)> = table
            .upstreams()
            .map(|(prefix, upstream)| (prefix, upstream.address()))
            .collect();
        seen.sort();

        assert_eq!(seen, vec![("/test1", "http://a"), ("/test1", "http://b")]);
    }
}
