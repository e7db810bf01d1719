use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, instrument};

use crate::core::{CurrencyPair, FeedPayload, RateFeed, RatesError};

/// Daily rates published by the fawazahmed0 currency-api on jsDelivr.
///
/// Every pair is a separate document at `{base_url}/{base}/{quote}.json`.
pub struct CurrencyApiFeed {
    base_url: String,
    client: reqwest::Client,
}

impl CurrencyApiFeed {
    /// `client` is shared by every request the feed issues.
    pub fn new(base_url: &str, client: reqwest::Client) -> Self {
        CurrencyApiFeed {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }

    pub fn build_client() -> reqwest::Result<reqwest::Client> {
        reqwest::Client::builder()
            .user_agent(concat!("kursbot/", env!("CARGO_PKG_VERSION")))
            .build()
    }

    fn pair_url(&self, pair: &CurrencyPair) -> String {
        format!("{}/{}/{}.json", self.base_url, pair.base, pair.quote)
    }
}

#[async_trait]
impl RateFeed for CurrencyApiFeed {
    #[instrument(name = "CurrencyApiFetch", skip(self), fields(pair = %pair))]
    async fn fetch_pair(&self, pair: &CurrencyPair) -> Result<FeedPayload, RatesError> {
        let url = self.pair_url(pair);
        debug!("Requesting currency rate from {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| RatesError::Network {
                pair: pair.to_string(),
                reason: e.to_string(),
            })?;

        if !response.status().is_success() {
            return Err(RatesError::Status {
                pair: pair.to_string(),
                status: response.status().as_u16(),
            });
        }

        let text = response.text().await.map_err(|e| RatesError::Network {
            pair: pair.to_string(),
            reason: e.to_string(),
        })?;

        match serde_json::from_str::<Value>(&text) {
            Ok(Value::Object(payload)) => Ok(payload),
            Ok(_) => Err(RatesError::parse(pair, "expected a JSON object")),
            Err(e) => Err(RatesError::parse(pair, e.to_string())),
        }
    }
}
