//! Core business logic abstractions

pub mod config;
pub mod currency;
pub mod error;
pub mod feed;
pub mod log;

// Re-export main types for cleaner imports
pub use currency::{CurrencyCode, CurrencyPair, RateTable};
pub use error::RatesError;
pub use feed::{FeedPayload, RateFeed};
