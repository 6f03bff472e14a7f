//! Routing-file model, loading and startup validation.

pub mod config;
pub mod default;
pub mod error;
pub mod loader;
pub mod validator;

pub use config::{RoutingRule, RoutingRules, Settings, Upstream};
pub use error::ConfigError;
