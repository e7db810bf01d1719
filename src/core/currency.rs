//! Currency codes, pairs and the fixed table of pairs quoted in every reply

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use super::config::ConfigError;

/// Lowercase three-letter currency code as used in feed URLs and payload keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CurrencyCode(String);

impl CurrencyCode {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for CurrencyCode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() == 3 && s.bytes().all(|b| b.is_ascii_lowercase()) {
            Ok(CurrencyCode(s.to_string()))
        } else {
            Err(ConfigError::InvalidTable(format!(
                "invalid currency code: {s:?}"
            )))
        }
    }
}

impl TryFrom<String> for CurrencyCode {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<CurrencyCode> for String {
    fn from(code: CurrencyCode) -> String {
        code.0
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An ordered `(base, quote)` pair. Serialized as a two element list.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "(CurrencyCode, CurrencyCode)", into = "(CurrencyCode, CurrencyCode)")]
pub struct CurrencyPair {
    pub base: CurrencyCode,
    pub quote: CurrencyCode,
}

impl CurrencyPair {
    pub fn new(base: CurrencyCode, quote: CurrencyCode) -> Self {
        CurrencyPair { base, quote }
    }
}

impl From<(CurrencyCode, CurrencyCode)> for CurrencyPair {
    fn from((base, quote): (CurrencyCode, CurrencyCode)) -> Self {
        CurrencyPair { base, quote }
    }
}

impl From<CurrencyPair> for (CurrencyCode, CurrencyCode) {
    fn from(pair: CurrencyPair) -> Self {
        (pair.base, pair.quote)
    }
}

impl FromStr for CurrencyPair {
    type Err = ConfigError;

    /// Parses `base/quote`, e.g. `usd/rub`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (base, quote) = s
            .split_once('/')
            .ok_or_else(|| ConfigError::InvalidTable(format!("invalid currency pair: {s:?}")))?;
        Ok(CurrencyPair::new(base.parse()?, quote.parse()?))
    }
}

impl fmt::Display for CurrencyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.base, self.quote)
    }
}

const DEFAULT_PAIRS: [(&str, &str); 7] = [
    ("eur", "usd"),
    ("usd", "rub"),
    ("eur", "rub"),
    ("amd", "rub"),
    ("rub", "amd"),
    ("usd", "amd"),
    ("eur", "amd"),
];

const DEFAULT_LABELS: [(&str, &str); 4] = [
    ("usd", "Доллар"),
    ("eur", "Евро"),
    ("rub", "Рубль"),
    ("amd", "Драм"),
];

/// The pairs every request quotes, in reply order, and the display label of each code.
///
/// Labels are only used for formatting reply lines.
#[derive(Debug, Clone, PartialEq)]
pub struct RateTable {
    pairs: Vec<CurrencyPair>,
    labels: HashMap<CurrencyCode, String>,
}

impl RateTable {
    /// Builds a table and checks that it can be used to format a reply.
    pub fn new(
        pairs: Vec<CurrencyPair>,
        labels: HashMap<CurrencyCode, String>,
    ) -> Result<Self, ConfigError> {
        let table = RateTable { pairs, labels };
        table.validate()?;
        Ok(table)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pairs.is_empty() {
            return Err(ConfigError::InvalidTable(
                "at least one currency pair is required".to_string(),
            ));
        }
        for pair in &self.pairs {
            for code in [&pair.base, &pair.quote] {
                if !self.labels.contains_key(code) {
                    return Err(ConfigError::InvalidTable(format!(
                        "no label for currency {code} used in pair {pair}"
                    )));
                }
            }
        }
        Ok(())
    }

    pub fn pairs(&self) -> &[CurrencyPair] {
        &self.pairs
    }

    /// The pair whose payload carries the as-of date for the whole batch.
    pub fn date_pair(&self) -> Option<&CurrencyPair> {
        self.pairs.first()
    }

    /// Display label for `code`, falling back to the code itself.
    pub fn label<'a>(&'a self, code: &'a CurrencyCode) -> &'a str {
        self.labels
            .get(code)
            .map(String::as_str)
            .unwrap_or(code.as_str())
    }

    pub fn default_pairs() -> Vec<CurrencyPair> {
        DEFAULT_PAIRS
            .iter()
            .map(|(base, quote)| {
                CurrencyPair::new(CurrencyCode(base.to_string()), CurrencyCode(quote.to_string()))
            })
            .collect()
    }

    pub fn default_labels() -> HashMap<CurrencyCode, String> {
        DEFAULT_LABELS
            .iter()
            .map(|(code, label)| (CurrencyCode(code.to_string()), label.to_string()))
            .collect()
    }
}

impl Default for RateTable {
    fn default() -> Self {
        RateTable {
            pairs: Self::default_pairs(),
            labels: Self::default_labels(),
        }
    }
}
