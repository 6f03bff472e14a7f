use std::{sync::Arc, time::Duration};

use futures::future::join_all;
use log::{debug, info, warn};
use steer_lb::Router;
use tokio::{
    task::JoinHandle,
    time::{self, MissedTickBehavior},
};

use crate::probe::Probe;

/// Periodically probes every upstream that declares a probe address and
/// writes the outcome into its health flag.
///
/// Upstreams without a probe address are never touched. When a cycle flips
/// at least one flag the router's distributions are rebuilt.
pub struct HealthRefresher<P> {
    router: Arc<Router>,
    probe: P,
    interval: Duration,
}

impl<P: Probe + 'static> HealthRefresher<P> {
    pub fn new(router: Arc<Router>, probe: P, interval: Duration) -> Self {
        Self {
            router,
            probe,
            interval,
        }
    }

    /// Runs one probe cycle and returns how many health flags changed.
    pub async fn refresh_once(&self) -> usize {
        let table = self.router.table();

        let checks = table.upstreams().filter_map(|(prefix, upstream)| {
            let probe_address = upstream.probe_address()?;
            Some(async move {
                let healthy = self.probe.probe(probe_address).await;
                (prefix, upstream, healthy)
            })
        });
        let results = join_all(checks).await;

        let mut changed = 0;
        for (prefix, upstream, healthy) in results {
            let was_healthy = upstream.set_healthy(healthy);
            if was_healthy == healthy {
                continue;
            }
            changed += 1;
            if healthy {
                info!("Upstream {} for {} became healthy", upstream.address(), prefix);
            } else {
                warn!("Upstream {} for {} became unhealthy", upstream.address(), prefix);
            }
        }

        if changed > 0 {
            self.router.rebuild();
        }
        changed
    }

    /// Probes, waits one interval, repeats. The first cycle starts immediately.
    pub async fn run(&self) {
        info!("Starting health refresher with interval: {:?}", self.interval);

        let mut ticker = time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            let changed = self.refresh_once().await;
            debug!("Health refresh cycle done, {} flags changed", changed);
        }
    }

    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(async move { self.run().await })
    }
}
