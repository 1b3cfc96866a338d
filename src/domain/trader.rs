//! Trading loop orchestration.
//!
//! Each tick runs fetch -> window -> crossover -> ledger -> snapshot ->
//! persist, strictly in sequence. A tick whose price cannot be used is
//! skipped entirely: nothing is recorded and nothing is written. The loop
//! ends only when the [`StopToken`] is cancelled, after which a final
//! snapshot at the last known price is recorded and persisted.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use super::crossover::{CrossoverDetector, EqualPolicy, Relation};
use super::error::BotError;
use super::history::{PortfolioSnapshot, TradingHistory, Transaction};
use super::ledger::{Ledger, validate_price};
use super::summary::RunSummary;
use super::window::RollingWindow;
use crate::ports::history_port::HistoryPort;
use crate::ports::price_port::PricePort;

/// Longest uninterrupted sleep between stop-token checks.
const WAIT_SLICE: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, PartialEq)]
pub struct BotConfig {
    pub symbol: String,
    pub fetch_interval: Duration,
    pub sma_window_secs: i64,
    pub initial_capital: f64,
    pub equal_policy: EqualPolicy,
}

impl Default for BotConfig {
    fn default() -> Self {
        BotConfig {
            symbol: "BTC/USD".to_string(),
            fetch_interval: Duration::from_secs(3),
            sma_window_secs: 60,
            initial_capital: 10_000.0,
            equal_policy: EqualPolicy::Reset,
        }
    }
}

/// Cooperative cancellation flag, shared with the signal handler.
///
/// The token is armed while a trading loop is running; an interrupt
/// handler cancels an armed token and otherwise lets the process exit.
#[derive(Debug, Clone, Default)]
pub struct StopToken {
    cancelled: Arc<AtomicBool>,
    armed: Arc<AtomicBool>,
}

impl StopToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear any earlier cancellation and mark a loop as running.
    pub fn arm(&self) {
        self.cancelled.store(false, Ordering::SeqCst);
        self.armed.store(true, Ordering::SeqCst);
    }

    pub fn disarm(&self) {
        self.armed.store(false, Ordering::SeqCst);
    }

    pub fn is_armed(&self) -> bool {
        self.armed.load(Ordering::SeqCst)
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Sleep for `duration`, waking early on cancellation. Returns `true`
    /// if the token was cancelled.
    /// A `duration` past the clock's range waits until cancelled.
    pub fn wait(&self, duration: Duration) -> bool {
        let deadline = Instant::now().checked_add(duration);
        loop {
            if self.is_cancelled() {
                return true;
            }
            let slice = match deadline {
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        return false;
                    }
                    (deadline - now).min(WAIT_SLICE)
                }
                None => WAIT_SLICE,
            };
            thread::sleep(slice);
        }
    }
}

/// What a successful tick did.
#[derive(Debug, Clone, PartialEq)]
pub struct Tick {
    pub price: f64,
    pub average: f64,
    pub relation: Relation,
    pub transaction: Option<Transaction>,
    pub snapshot: PortfolioSnapshot,
}

#[derive(Debug, Clone)]
pub struct Trader {
    config: BotConfig,
    window: RollingWindow,
    detector: CrossoverDetector,
    ledger: Ledger,
    last_price: Option<f64>,
}

impl Trader {
    /// Build a trader over a previously loaded history.
    pub fn new(config: BotConfig, history: TradingHistory) -> Self {
        Trader {
            window: RollingWindow::from_secs(config.sma_window_secs),
            detector: CrossoverDetector::new(config.equal_policy),
            ledger: Ledger::resume(history, config.initial_capital),
            last_price: None,
            config,
        }
    }

    pub fn config(&self) -> &BotConfig {
        &self.config
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn history(&self) -> &TradingHistory {
        &self.ledger.history
    }

    pub fn window(&self) -> &RollingWindow {
        &self.window
    }

    pub fn last_price(&self) -> Option<f64> {
        self.last_price
    }

    /// Run one tick's trading logic on a fetch result.
    pub fn on_price(
        &mut self,
        fetched: Result<f64, BotError>,
        now: DateTime<Utc>,
    ) -> Result<Tick, BotError> {
        let price = fetched?;
        validate_price(price)?;

        self.window.observe(now, price);
        self.last_price = Some(price);
        let average = self
            .window
            .current_average()
            .ok_or(BotError::InsufficientData)?;

        let signal = self.detector.update(price, average);
        let transaction = self.ledger.apply(signal, price, now)?;
        let snapshot = self.ledger.snapshot(price, now)?;

        Ok(Tick {
            price,
            average,
            relation: self.detector.previous_relation(),
            transaction,
            snapshot,
        })
    }

    /// Record the closing snapshot and compute the run summary. Without
    /// any price seen this run there is nothing to mark against, so no
    /// snapshot is added.
    pub fn finish(&mut self, now: DateTime<Utc>) -> RunSummary {
        let final_value = match self.last_price {
            Some(price) => self.ledger.mark(price, now).portfolio_value,
            None => self.ledger.capital,
        };
        RunSummary::compute(&self.ledger.history, final_value, self.config.initial_capital)
    }
}

fn persist(history_port: &dyn HistoryPort, history: &TradingHistory) {
    if let Err(e) = history_port.save(history) {
        tracing::error!(error = %e, "history not persisted; keeping in-memory state");
    }
}

fn log_tick(symbol: &str, tick: &Tick) {
    match &tick.transaction {
        Some(txn) => tracing::info!(
            symbol,
            action = %txn.action,
            price = format_args!("{:.2}", txn.price),
            holding = format_args!("{:.6}", txn.holding),
            capital = format_args!("{:.2}", txn.capital),
            "trade executed"
        ),
        None => tracing::debug!(
            symbol,
            price = tick.price,
            sma = tick.average,
            relation = %tick.relation,
            value = tick.snapshot.portfolio_value,
            "tick"
        ),
    }
}

/// Poll `price_port` every `config.fetch_interval` until `stop` is
/// cancelled. Returns the summary of the finished run.
pub fn run(
    trader: &mut Trader,
    price_port: &dyn PricePort,
    history_port: &dyn HistoryPort,
    stop: &StopToken,
) -> RunSummary {
    let symbol = trader.config().symbol.clone();
    let interval = trader.config().fetch_interval;
    tracing::info!(
        symbol = %symbol,
        window_secs = trader.config().sma_window_secs,
        interval_ms = interval.as_millis() as u64,
        capital = trader.ledger().capital,
        "trading loop started"
    );

    while !stop.is_cancelled() {
        let fetched = price_port.fetch_last_price(&symbol);
        match trader.on_price(fetched, Utc::now()) {
            Ok(tick) => {
                log_tick(&symbol, &tick);
                persist(history_port, trader.history());
            }
            Err(BotError::InsufficientData) => {
                tracing::info!("not enough data to calculate SMA");
            }
            Err(e) => {
                tracing::warn!(error = %e, "tick skipped");
            }
        }

        if stop.wait(interval) {
            break;
        }
    }

    let summary = trader.finish(Utc::now());
    persist(history_port, trader.history());
    tracing::info!(
        final_value = summary.final_value,
        total_return_pct = summary.total_return_pct(),
        "trading loop stopped"
    );
    summary
}
