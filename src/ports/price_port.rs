//! Price source port trait.

use crate::domain::error::BotError;

pub trait PricePort {
    /// Latest traded price for `symbol` (e.g. `BTC/USD`).
    fn fetch_last_price(&self, symbol: &str) -> Result<f64, BotError>;
}
