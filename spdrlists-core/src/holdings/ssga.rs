//! State Street Global Advisors holdings provider.
//!
//! Downloads the daily holdings spreadsheet published for each SPDR fund.
//! One GET per fund, redirects followed, no retries. The response status is
//! not checked beyond a warning: whatever body comes back is handed to the
//! spreadsheet parser, which rejects anything that isn't a holdings workbook.

use super::provider::{FetchError, FetchedHoldings, HoldingsSource};
use crate::config::WatchlistConfig;
use std::time::Duration;
use tracing::{debug, warn};

pub struct SsgaProvider {
    client: reqwest::blocking::Client,
    config: WatchlistConfig,
}

impl SsgaProvider {
    pub fn new(config: &WatchlistConfig) -> Result<Self, FetchError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(config.request_timeout_secs.map(Duration::from_secs))
            .user_agent(config.user_agent.as_str())
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()
            .map_err(|e| FetchError::Client(e.to_string()))?;

        Ok(Self {
            client,
            config: config.clone(),
        })
    }
}

impl HoldingsSource for SsgaProvider {
    fn name(&self) -> &str {
        "ssga"
    }

    fn fetch(&self, symbol: &str) -> Result<FetchedHoldings, FetchError> {
        let url = self.config.holdings_url(symbol);
        debug!(%url, "requesting holdings");

        let network = |e: reqwest::Error| FetchError::Network {
            symbol: symbol.to_string(),
            message: e.to_string(),
        };

        let resp = self.client.get(&url).send().map_err(network)?;
        let status = resp.status();
        if !status.is_success() {
            warn!(symbol, %status, "holdings request returned non-success status");
        }

        let bytes = resp.bytes().map_err(network)?;
        debug!(symbol, len = bytes.len(), "holdings downloaded");

        Ok(FetchedHoldings {
            url,
            bytes: bytes.to_vec(),
        })
    }
}
