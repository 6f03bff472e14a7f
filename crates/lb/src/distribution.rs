// Weighted distributions over eligible upstreams, one per prefix.
use std::collections::HashMap;

use log::debug;
use rand::Rng;

use crate::RoutingTable;

/// Discrete distribution over addresses, proportional to integer weights.
///
/// `[0, total)` is split into contiguous ranges, one per address, each as
/// wide as that address's weight. A uniform draw in `[0, total)` lands in
/// exactly one range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeightedDistribution {
    addresses: Vec<String>,
    // running totals; the last entry is the total weight
    cumulative: Vec<u64>,
}

impl WeightedDistribution {
    /// Returns `None` when no choice carries a positive weight.
    pub fn new<I, S>(choices: I) -> Option<Self>
    where
        I: IntoIterator<Item = (S, u32)>,
        S: Into<String>,
    {
        let mut addresses = Vec::new();
        let mut cumulative = Vec::new();
        let mut total = 0u64;

        for (address, weight) in choices {
            if weight == 0 {
                continue;
            }
            total += u64::from(weight);
            addresses.push(address.into());
            cumulative.push(total);
        }

        if addresses.is_empty() {
            return None;
        }

        Some(Self {
            addresses,
            cumulative,
        })
    }

    pub fn total_weight(&self) -> u64 {
        self.cumulative.last().copied().unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.addresses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.addresses.is_empty()
    }

    pub fn addresses(&self) -> impl Iterator<Item = &str> {
        self.addresses.iter().map(String::as_str)
    }

    pub fn sample_with<R: Rng + ?Sized>(&self, rng: &mut R) -> &str {
        let point = rng.gen_range(0..self.total_weight());
        let idx = self.cumulative.partition_point(|&running| running <= point);
        &self.addresses[idx]
    }

    pub fn sample(&self) -> &str {
        self.sample_with(&mut rand::thread_rng())
    }
}

/// What a prefix resolves against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrefixDistribution {
    Weighted(WeightedDistribution),
    /// The prefix exists but none of its upstreams is currently eligible.
    NoEligibleUpstream,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Distributions {
    by_prefix: HashMap<String, PrefixDistribution>,
}

impl Distributions {
    pub fn get(&self, prefix: &str) -> Option<&PrefixDistribution> {
        self.by_prefix.get(prefix)
    }

    /// Eligible addresses for `prefix`, sorted. `None` if the prefix is unknown.
    pub fn eligible(&self, prefix: &str) -> Option<Vec<&str>> {
        let mut addresses: Vec<&str> = match self.by_prefix.get(prefix)? {
            PrefixDistribution::Weighted(distribution) => distribution.addresses().collect(),
            PrefixDistribution::NoEligibleUpstream => Vec::new(),
        };
        addresses.sort_unstable();
        Some(addresses)
    }

    pub fn len(&self) -> usize {
        self.by_prefix.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_prefix.is_empty()
    }
}

/// Builds one distribution per prefix from the table's current health state.
///
/// Filtering off: every upstream is eligible. Filtering on: only upstreams
/// that declare a probe address and are currently healthy.
pub fn build(table: &RoutingTable, health_filter: bool) -> Distributions {
    let by_prefix: HashMap<String, PrefixDistribution> = table
        .iter()
        .map(|(prefix, rule)| {
            let choices = rule
                .eligible(health_filter)
                .map(|upstream| (upstream.address(), upstream.weight()));

            let distribution = match WeightedDistribution::new(choices) {
                Some(weighted) => PrefixDistribution::Weighted(weighted),
                None => PrefixDistribution::NoEligibleUpstream,
            };
            (prefix.to_string(), distribution)
        })
        .collect();

    debug!(
        "Built distributions for {} prefixes ({} without eligible upstreams)",
        by_prefix.len(),
        by_prefix
            .values()
            .filter(|d| matches!(d, PrefixDistribution::NoEligibleUpstream))
            .count()
    );

    Distributions { by_prefix }
}
