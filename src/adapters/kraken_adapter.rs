//! Kraken public ticker price source.
//!
//! `GET {base_url}/0/public/Ticker?pair=XBTUSD` answers with
//!
//! ```json
//! {"error": [], "result": {"XXBTZUSD": {"c": ["97123.40000", "0.00150000"], ...}}}
//! ```
//!
//! where `c[0]` is the last trade price. Kraken names the pair in the
//! result with its own canonical code, so the single entry is taken as is.

use crate::domain::error::BotError;
use crate::ports::price_port::PricePort;
use reqwest::blocking::Client;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://api.kraken.com";

#[derive(Debug, Deserialize)]
struct TickerResponse {
    #[serde(default)]
    error: Vec<String>,
    #[serde(default)]
    result: HashMap<String, TickerInfo>,
}

#[derive(Debug, Deserialize)]
struct TickerInfo {
    /// Last trade closed: `[price, lot volume]`.
    c: Vec<String>,
}

pub struct KrakenAdapter {
    client: Client,
    base_url: String,
}

impl KrakenAdapter {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, BotError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("smacross/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| BotError::Fetch {
                reason: format!("failed to build HTTP client: {e}"),
            })?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Map a `BASE/QUOTE` symbol to Kraken's pair code (`BTC/USD` -> `XBTUSD`).
    pub fn pair_for(symbol: &str) -> String {
        symbol
            .split('/')
            .map(|part| match part.trim().to_uppercase().as_str() {
                "BTC" => "XBT".to_string(),
                other => other.to_string(),
            })
            .collect()
    }

    fn ticker_url(&self, symbol: &str) -> String {
        format!(
            "{}/0/public/Ticker?pair={}",
            self.base_url,
            Self::pair_for(symbol)
        )
    }
}

/// Extract the last trade price from a ticker response body.
pub fn parse_last_price(body: &str) -> Result<f64, BotError> {
    let response: TickerResponse = serde_json::from_str(body).map_err(|e| BotError::Fetch {
        reason: format!("malformed ticker response: {e}"),
    })?;

    if !response.error.is_empty() {
        return Err(BotError::Fetch {
            reason: response.error.join("; "),
        });
    }

    let info = response
        .result
        .into_values()
        .next()
        .ok_or_else(|| BotError::Fetch {
            reason: "ticker response has no result".into(),
        })?;
    let raw = info.c.first().ok_or_else(|| BotError::Fetch {
        reason: "ticker has no last trade".into(),
    })?;
    let price: f64 = raw.parse().map_err(|_| BotError::Fetch {
        reason: format!("last trade price '{raw}' is not a number"),
    })?;

    if price.is_finite() {
        Ok(price)
    } else {
        Err(BotError::Fetch {
            reason: format!("last trade price '{raw}' is not finite"),
        })
    }
}

impl PricePort for KrakenAdapter {
    fn fetch_last_price(&self, symbol: &str) -> Result<f64, BotError> {
        let url = self.ticker_url(symbol);
        let body = self
            .client
            .get(&url)
            .send()
            .and_then(|resp| resp.error_for_status())
            .and_then(|resp| resp.text())
            .map_err(|e| BotError::Fetch {
                reason: format!("GET {url}: {e}"),
            })?;
        parse_last_price(&body)
    }
}
