use thiserror::Error;

/// Fatal configuration problems. The process must not serve with any of these.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read routing file '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("could not parse routing file '{path}': {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("upstream '{address}' under prefix '{prefix}' has invalid weight 0")]
    InvalidWeight { prefix: String, address: String },

    #[error("upstream under prefix '{prefix}' has an empty url")]
    EmptyAddress { prefix: String },

    #[error("healthcheck endpoint does not exist in config file for upstream '{address}' under prefix '{prefix}'")]
    MissingHealthcheckEndpoint { prefix: String, address: String },

    #[error("invalid setting: {0}")]
    InvalidSetting(String),
}
