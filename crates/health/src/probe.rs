use std::{future::Future, time::Duration};

use log::debug;

/// A single reachability check. Every failure mode is reported as `false`.
pub trait Probe: Send + Sync {
    fn probe(&self, address: &str) -> impl Future<Output = bool> + Send;
}

/// HTTP GET probe. Healthy means a 2xx answer within the timeout.
#[derive(Clone, Debug)]
pub struct HttpProbe {
    client: reqwest::Client,
}

impl HttpProbe {
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

impl Probe for HttpProbe {
    async fn probe(&self, address: &str) -> bool {
        match self.client.get(address).send().await {
            Ok(response) if response.status().is_success() => true,
            Ok(response) => {
                debug!("Health probe {} answered {}", address, response.status());
                false
            }
            Err(err) => {
                debug!("Health probe {} failed: {}", address, err);
                false
            }
        }
    }
}
