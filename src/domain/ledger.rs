//! Portfolio ledger: all-in/all-out cash and asset balances.
//!
//! At rest exactly one of `capital` and `holding` is nonzero: a `BUY`
//! converts all capital into the asset, a `SELL` converts the whole holding
//! back into capital. Every executed trade and every valuation is recorded
//! in the ledger's [`TradingHistory`].

use chrono::{DateTime, Utc};

use super::crossover::Signal;
use super::error::BotError;
use super::history::{PortfolioSnapshot, TradingHistory, Transaction};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Position {
    Flat,
    Long,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Ledger {
    pub capital: f64,
    pub holding: f64,
    pub position: Position,
    pub history: TradingHistory,
}

impl Ledger {
    pub fn new(initial_capital: f64) -> Self {
        Ledger {
            capital: initial_capital,
            holding: 0.0,
            position: Position::Flat,
            history: TradingHistory::new(),
        }
    }

    /// Continue from a previous run. Positions are assumed closed at the
    /// last shutdown, so the ledger starts flat with the last recorded
    /// portfolio value as capital. A last value that is not finite and
    /// positive cannot fund a trade and is replaced by `initial_capital`.
    pub fn resume(history: TradingHistory, initial_capital: f64) -> Self {
        let capital = match history.last_value() {
            Some(value) if value.is_finite() && value > 0.0 => value,
            Some(value) => {
                tracing::warn!(
                    last_value = value,
                    initial_capital,
                    "last recorded portfolio value is unusable; resuming with initial capital"
                );
                initial_capital
            }
            None => initial_capital,
        };
        Ledger {
            capital,
            holding: 0.0,
            position: Position::Flat,
            history,
        }
    }

    pub fn value_at(&self, price: f64) -> f64 {
        self.capital + self.holding * price
    }

    /// Execute `signal` at `price`. Returns the recorded transaction, or
    /// `None` when the signal does not change the position.
    pub fn apply(
        &mut self,
        signal: Option<Signal>,
        price: f64,
        timestamp: DateTime<Utc>,
    ) -> Result<Option<Transaction>, BotError> {
        let Some(signal) = signal else {
            return Ok(None);
        };
        validate_price(price)?;

        match (signal, self.position) {
            (Signal::Buy, Position::Flat) => {
                self.holding = self.capital / price;
                self.capital = 0.0;
                self.position = Position::Long;
            }
            (Signal::Sell, Position::Long) => {
                self.capital = self.holding * price;
                self.holding = 0.0;
                self.position = Position::Flat;
            }
            _ => return Ok(None),
        }

        let transaction = Transaction {
            timestamp,
            action: signal,
            price,
            holding: self.holding,
            capital: self.capital,
        };
        self.history.record_transaction(transaction.clone());
        Ok(Some(transaction))
    }

    /// Record the portfolio value marked at `price`.
    pub fn snapshot(
        &mut self,
        price: f64,
        timestamp: DateTime<Utc>,
    ) -> Result<PortfolioSnapshot, BotError> {
        validate_price(price)?;
        Ok(self.mark(price, timestamp))
    }

    /// Record the portfolio value at a price that already passed
    /// [`validate_price`].
    pub(crate) fn mark(&mut self, price: f64, timestamp: DateTime<Utc>) -> PortfolioSnapshot {
        let snapshot = PortfolioSnapshot {
            timestamp,
            portfolio_value: self.value_at(price),
        };
        self.history.record_snapshot(snapshot.clone());
        snapshot
    }
}

pub fn validate_price(price: f64) -> Result<(), BotError> {
    if price.is_finite() && price > 0.0 {
        Ok(())
    } else {
        Err(BotError::InvalidPrice { price })
    }
}
