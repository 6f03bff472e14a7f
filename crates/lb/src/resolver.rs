use std::sync::Arc;

use arc_swap::ArcSwap;
use log::{debug, info};
use rand::Rng;

use crate::{
    RoutingTable,
    distribution::{Distributions, PrefixDistribution, build},
};

/// Outcome of resolving a prefix. Misses are ordinary values, not errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Selected(String),
    PrefixNotFound,
    NoEligibleUpstream,
}

pub fn resolve(prefix: &str, distributions: &Distributions) -> Resolution {
    resolve_with(prefix, distributions, &mut rand::thread_rng())
}

pub fn resolve_with<R: Rng + ?Sized>(
    prefix: &str,
    distributions: &Distributions,
    rng: &mut R,
) -> Resolution {
    match distributions.get(prefix) {
        None => Resolution::PrefixNotFound,
        Some(PrefixDistribution::NoEligibleUpstream) => Resolution::NoEligibleUpstream,
        Some(PrefixDistribution::Weighted(distribution)) => {
            Resolution::Selected(distribution.sample_with(rng).to_string())
        }
    }
}

/// Routing table plus the distributions last built from it.
///
/// Readers sample from an immutable snapshot; `rebuild` swaps in a fresh one.
/// The health refresher calls `rebuild` whenever it flips a flag, so a
/// resolution sees health at most one refresh cycle old.
pub struct Router {
    table: Arc<RoutingTable>,
    health_filter: bool,
    distributions: ArcSwap<Distributions>,
}

impl Router {
    pub fn new(table: Arc<RoutingTable>, health_filter: bool) -> Self {
        let distributions = build(&table, health_filter);
        info!(
            "Router ready: {} prefixes, health filtering {}",
            table.len(),
            if health_filter { "on" } else { "off" }
        );

        Self {
            table,
            health_filter,
            distributions: ArcSwap::from_pointee(distributions),
        }
    }

    pub fn table(&self) -> &Arc<RoutingTable> {
        &self.table
    }

    pub fn health_filter(&self) -> bool {
        self.health_filter
    }

    pub fn distributions(&self) -> Arc<Distributions> {
        self.distributions.load_full()
    }

    pub fn rebuild(&self) {
        let distributions = build(&self.table, self.health_filter);
        self.distributions.store(Arc::new(distributions));
        debug!("Distributions rebuilt");
    }

    pub fn resolve(&self, prefix: &str) -> Resolution {
        self.resolve_with(prefix, &mut rand::thread_rng())
    }

    pub fn resolve_with<R: Rng + ?Sized>(&self, prefix: &str, rng: &mut R) -> Resolution {
        let distributions = self.distributions.load();
        let resolution = resolve_with(prefix, &distributions, rng);
        debug!("Resolved {} -> {:?}", prefix, resolution);
        resolution
    }
}
