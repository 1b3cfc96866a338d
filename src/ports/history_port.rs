//! History store port trait.

use crate::domain::error::BotError;
use crate::domain::history::TradingHistory;

pub trait HistoryPort {
    /// Strict load: a missing store is an empty history, an unreadable one
    /// is `BotError::LoadCorruption`.
    fn load(&self) -> Result<TradingHistory, BotError>;

    /// Replace the stored history with `history`.
    fn save(&self, history: &TradingHistory) -> Result<(), BotError>;

    /// Default implementation: any load failure degrades to an empty
    /// history with a warning.
    fn load_or_empty(&self) -> TradingHistory {
        match self.load() {
            Ok(history) => history,
            Err(e) => {
                tracing::warn!(error = %e, "starting with empty history; existing data will be overwritten");
                TradingHistory::new()
            }
        }
    }
}
