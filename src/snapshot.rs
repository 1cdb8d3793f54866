/// Initial contract snapshot from the Kalshi REST API
///
/// A failed snapshot never stops startup: the reader falls back to an empty
/// state and lets the stream fill it in.

use anyhow::{Result, anyhow};
use reqwest::{Client, StatusCode};
use tracing::{info, warn};
use url::Url;

use crate::models::{ContractState, MarketResponse};
use crate::settings::SNAPSHOT_TIMEOUT;
use crate::signer::Signer;

pub struct SnapshotFetcher {
    client: Client,
    base_url: Url,
    signer: Signer,
}

impl SnapshotFetcher {
    /// `base_url` is the REST root, e.g. `https://api.elections.kalshi.com/trade-api/v2`
    pub fn new(base_url: Url, signer: Signer) -> Result<Self> {
        let client = Client::builder().timeout(SNAPSHOT_TIMEOUT).build()?;
        Ok(Self {
            client,
            base_url,
            signer,
        })
    }

    /// `{base}/markets/{contract_id}`; its `path()` is what gets signed
    pub fn market_url(&self, contract_id: &str) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| anyhow!("{} cannot be a base URL", self.base_url))?
            .pop_if_empty()
            .push("markets")
            .push(contract_id);
        Ok(url)
    }

    /// Fetch the contract, returning an empty state on any failure
    pub async fn fetch(&self, contract_id: &str) -> ContractState {
        match self.try_fetch(contract_id).await {
            Ok(state) => {
                info!(contract = contract_id, "Fetched initial snapshot");
                state
            }
            Err(e) => {
                warn!(contract = contract_id, error = %e, "Snapshot fetch failed, starting empty");
                ContractState::default()
            }
        }
    }

    async fn try_fetch(&self, contract_id: &str) -> Result<ContractState> {
        let url = self.market_url(contract_id)?;
        let headers = self.signer.auth_headers("GET", url.path())?;

        let mut request = self.client.get(url);
        for (name, value) in headers.pairs() {
            request = request.header(name, value);
        }

        let response = request.send().await?;
        if response.status() != StatusCode::OK {
            return Err(anyhow!("HTTP {}", response.status()));
        }

        let body: MarketResponse = response.json().await?;
        Ok(body.market.map(ContractState::from).unwrap_or_default())
    }
}
