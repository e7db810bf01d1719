use std::time::Duration;
use thiserror::Error;

/// Failures of a single pair fetch or of the whole batch.
#[derive(Error, Debug)]
pub enum RatesError {
    #[error("Request error: {reason} for currency pair: {pair}")]
    Network { pair: String, reason: String },

    #[error("HTTP error: {status} for currency pair: {pair}")]
    Status { pair: String, status: u16 },

    #[error("Failed to parse response for {pair}: {reason}")]
    Parse { pair: String, reason: String },

    #[error("No currency pairs configured")]
    EmptyTable,

    #[error("Timed out after {0:?} waiting for rates")]
    Timeout(Duration),
}

impl RatesError {
    pub fn parse(pair: impl ToString, reason: impl Into<String>) -> Self {
        RatesError::Parse {
            pair: pair.to_string(),
            reason: reason.into(),
        }
    }
}
