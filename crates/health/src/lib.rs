//! Upstream reachability probes and the background loop that applies them.

pub mod probe;
pub mod refresher;

pub use probe::{HttpProbe, Probe};
pub use refresher::HealthRefresher;
