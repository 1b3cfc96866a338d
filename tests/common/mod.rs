#![allow(dead_code)]

use smacross::domain::error::BotError;
use smacross::domain::history::TradingHistory;
use smacross::domain::trader::{BotConfig, StopToken};
use smacross::ports::history_port::HistoryPort;
use smacross::ports::price_port::PricePort;
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::time::Duration;

/// Price source that replays a fixed script and cancels the stop token
/// once the last entry has been served.
pub struct ScriptedPricePort {
    script: RefCell<VecDeque<Option<f64>>>,
    stop: StopToken,
    pub fetches: Cell<usize>,
    pub symbols: RefCell<Vec<String>>,
}

impl ScriptedPricePort {
    /// `None` entries are fetch failures.
    pub fn new(script: Vec<Option<f64>>, stop: &StopToken) -> Self {
        Self {
            script: RefCell::new(script.into()),
            stop: stop.clone(),
            fetches: Cell::new(0),
            symbols: RefCell::new(Vec::new()),
        }
    }

    pub fn prices(prices: &[f64], stop: &StopToken) -> Self {
        Self::new(prices.iter().copied().map(Some).collect(), stop)
    }
}

impl PricePort for ScriptedPricePort {
    fn fetch_last_price(&self, symbol: &str) -> Result<f64, BotError> {
        self.fetches.set(self.fetches.get() + 1);
        self.symbols.borrow_mut().push(symbol.to_string());

        let next = self.script.borrow_mut().pop_front();
        if self.script.borrow().is_empty() {
            self.stop.cancel();
        }
        match next {
            Some(Some(price)) => Ok(price),
            Some(None) => Err(BotError::Fetch {
                reason: "connection reset".into(),
            }),
            None => Err(BotError::Fetch {
                reason: "script exhausted".into(),
            }),
        }
    }
}

/// In-memory history store.
pub struct MemoryHistoryPort {
    pub stored: RefCell<TradingHistory>,
    pub saves: Cell<usize>,
    pub fail_saves: bool,
    pub corrupt: bool,
}

impl MemoryHistoryPort {
    pub fn new() -> Self {
        Self::with_history(TradingHistory::new())
    }

    pub fn with_history(history: TradingHistory) -> Self {
        Self {
            stored: RefCell::new(history),
            saves: Cell::new(0),
            fail_saves: false,
            corrupt: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            fail_saves: true,
            ..Self::new()
        }
    }

    pub fn corrupt() -> Self {
        Self {
            corrupt: true,
            ..Self::new()
        }
    }
}

impl HistoryPort for MemoryHistoryPort {
    fn load(&self) -> Result<TradingHistory, BotError> {
        if self.corrupt {
            return Err(BotError::LoadCorruption {
                path: "memory".into(),
                reason: "expected value at line 1 column 1".into(),
            });
        }
        Ok(self.stored.borrow().clone())
    }

    fn save(&self, history: &TradingHistory) -> Result<(), BotError> {
        self.saves.set(self.saves.get() + 1);
        if self.fail_saves {
            return Err(BotError::Persistence {
                path: "memory".into(),
                reason: "disk full".into(),
            });
        }
        *self.stored.borrow_mut() = history.clone();
        Ok(())
    }
}

/// Default config with no delay between ticks.
pub fn fast_config() -> BotConfig {
    BotConfig {
        fetch_interval: Duration::ZERO,
        ..BotConfig::default()
    }
}
