//! Fetches the configured pairs concurrently and assembles them into one reply.

use futures::future::try_join_all;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use crate::core::{CurrencyPair, RateFeed, RateTable, RatesError};

/// Formats `"<base label> -> <quote label>: <rate>"` for one pair.
///
/// The rate is written exactly as the feed encoded the number.
pub async fn fetch_rate<F>(
    feed: &F,
    table: &RateTable,
    pair: &CurrencyPair,
) -> Result<String, RatesError>
where
    F: RateFeed + ?Sized,
{
    let payload = feed.fetch_pair(pair).await?;
    let rate = match payload.get(pair.quote.as_str()) {
        Some(Value::Number(rate)) => rate,
        Some(other) => {
            return Err(RatesError::parse(
                pair,
                format!("rate for {} is not a number: {other}", pair.quote),
            ));
        }
        None => {
            return Err(RatesError::parse(
                pair,
                format!("missing rate for {}", pair.quote),
            ));
        }
    };

    Ok(format!(
        "{} -> {}: {}",
        table.label(&pair.base),
        table.label(&pair.quote),
        rate
    ))
}

/// Formats `"Дата: <date>"` from the first pair of the table.
pub async fn fetch_date<F>(feed: &F, table: &RateTable) -> Result<String, RatesError>
where
    F: RateFeed + ?Sized,
{
    let pair = table.date_pair().ok_or(RatesError::EmptyTable)?;
    let payload = feed.fetch_pair(pair).await?;
    match payload.get("date") {
        Some(Value::String(date)) => Ok(format!("Дата: {date}")),
        Some(_) => Err(RatesError::parse(pair, "date is not a string")),
        None => Err(RatesError::parse(pair, "missing date")),
    }
}

/// Date line followed by one line per pair, in table order.
///
/// All requests are in flight at once. The first failure aborts the batch and
/// drops the remaining requests.
pub async fn fetch_all<F>(feed: &F, table: &RateTable) -> Result<Vec<String>, RatesError>
where
    F: RateFeed + ?Sized,
{
    debug!(pairs = table.pairs().len(), "Fetching rates");
    let (date, rates) = futures::try_join!(
        fetch_date(feed, table),
        try_join_all(
            table
                .pairs()
                .iter()
                .map(|pair| fetch_rate(feed, table, pair))
        ),
    )?;

    let mut lines = Vec::with_capacity(rates.len() + 1);
    lines.push(date);
    lines.extend(rates);
    Ok(lines)
}

pub fn assemble_reply(lines: &[String]) -> String {
    lines.join("\n")
}

/// The full reply for one request, or an error when any pair fails or `timeout` elapses.
pub async fn today_rates<F>(
    feed: &F,
    table: &RateTable,
    timeout: Duration,
) -> Result<String, RatesError>
where
    F: RateFeed + ?Sized,
{
    let lines = tokio::time::timeout(timeout, fetch_all(feed, table))
        .await
        .map_err(|_| RatesError::Timeout(timeout))??;
    Ok(assemble_reply(&lines))
}
