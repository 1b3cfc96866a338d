//! Trading history: the append-only transaction and portfolio-value logs.
//!
//! The serialized form is the history file format:
//!
//! ```json
//! {
//!   "transactions": [
//!     {"timestamp": "...", "action": "BUY", "price": 1.0, "btc_holding": 1.0, "capital": 0.0}
//!   ],
//!   "portfolio_history": [
//!     {"timestamp": "...", "portfolio_value": 10000.0}
//!   ]
//! }
//! ```
//!
//! Timestamps are always written as RFC 3339 in UTC with a `Z` suffix.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::crossover::Signal;
use super::error::BotError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    #[serde(with = "utc_timestamp")]
    pub timestamp: DateTime<Utc>,
    pub action: Signal,
    pub price: f64,
    #[serde(rename = "btc_holding")]
    pub holding: f64,
    pub capital: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioSnapshot {
    #[serde(with = "utc_timestamp")]
    pub timestamp: DateTime<Utc>,
    pub portfolio_value: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TradingHistory {
    #[serde(default)]
    pub transactions: Vec<Transaction>,
    #[serde(default)]
    pub portfolio_history: Vec<PortfolioSnapshot>,
}

/// One of the two lists in a [`TradingHistory`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Transactions,
    PortfolioHistory,
}

impl Section {
    pub fn key(&self) -> &'static str {
        match self {
            Section::Transactions => "transactions",
            Section::PortfolioHistory => "portfolio_history",
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Section {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "transactions" | "1" => Ok(Section::Transactions),
            "portfolio_history" | "2" => Ok(Section::PortfolioHistory),
            other => Err(format!(
                "unknown section '{other}' (expected transactions or portfolio_history)"
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum HistoryEntry {
    Transaction(Transaction),
    Snapshot(PortfolioSnapshot),
}

impl HistoryEntry {
    pub fn to_json_pretty(&self) -> String {
        let rendered = match self {
            HistoryEntry::Transaction(t) => serde_json::to_string_pretty(t),
            HistoryEntry::Snapshot(s) => serde_json::to_string_pretty(s),
        };
        rendered.unwrap_or_else(|e| format!("<unprintable entry: {e}>"))
    }
}

impl TradingHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty() && self.portfolio_history.is_empty()
    }

    pub fn record_transaction(&mut self, transaction: Transaction) {
        self.transactions.push(transaction);
    }

    pub fn record_snapshot(&mut self, snapshot: PortfolioSnapshot) {
        self.portfolio_history.push(snapshot);
    }

    pub fn first_value(&self) -> Option<f64> {
        self.portfolio_history.first().map(|s| s.portfolio_value)
    }

    pub fn last_value(&self) -> Option<f64> {
        self.portfolio_history.last().map(|s| s.portfolio_value)
    }

    /// Remove the most recent entry of `section`.
    pub fn drop_last(&mut self, section: Section) -> Result<HistoryEntry, BotError> {
        let removed = match section {
            Section::Transactions => self.transactions.pop().map(HistoryEntry::Transaction),
            Section::PortfolioHistory => self.portfolio_history.pop().map(HistoryEntry::Snapshot),
        };
        removed.ok_or_else(|| BotError::EmptySection {
            section: section.key().to_string(),
        })
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(content: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(content)
    }
}

/// RFC 3339 UTC timestamps. Reading also accepts offset-free ISO-8601
/// strings, which are taken to be UTC.
pub mod utc_timestamp {
    use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer, de};

    pub fn serialize<S: Serializer>(ts: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&ts.to_rfc3339_opts(SecondsFormat::AutoSi, true))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(d)?;
        parse(&raw).map_err(de::Error::custom)
    }

    pub fn parse(raw: &str) -> Result<DateTime<Utc>, String> {
        if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
            return Ok(ts.with_timezone(&Utc));
        }
        NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
            .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f"))
            .map(|naive| naive.and_utc())
            .map_err(|e| format!("invalid timestamp '{raw}': {e}"))
    }
}
