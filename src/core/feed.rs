//! Exchange-rate feed abstractions

use async_trait::async_trait;
use serde_json::{Map, Value};

use super::currency::CurrencyPair;
use super::error::RatesError;

/// Decoded JSON object of one pair document, e.g. `{"date": "2024-01-01", "rub": 95.2}`.
pub type FeedPayload = Map<String, Value>;

#[async_trait]
pub trait RateFeed: Send + Sync {
    async fn fetch_pair(&self, pair: &CurrencyPair) -> Result<FeedPayload, RatesError>;
}
