//! JSON file history store.
//!
//! Saves write a sibling `*.tmp` file and rename it over the target, so
//! readers never observe a half-written document.

use crate::domain::error::BotError;
use crate::domain::history::TradingHistory;
use crate::ports::history_port::HistoryPort;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

pub const DEFAULT_HISTORY_PATH: &str = "trading_history.json";

pub struct JsonHistoryAdapter {
    path: PathBuf,
}

impl JsonHistoryAdapter {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| DEFAULT_HISTORY_PATH.into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn persistence_error(&self, reason: impl ToString) -> BotError {
        BotError::Persistence {
            path: self.path.display().to_string(),
            reason: reason.to_string(),
        }
    }
}

impl HistoryPort for JsonHistoryAdapter {
    fn load(&self) -> Result<TradingHistory, BotError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::info!(path = %self.path.display(), "no history file found, starting fresh");
                return Ok(TradingHistory::new());
            }
            Err(e) => {
                return Err(BotError::LoadCorruption {
                    path: self.path.display().to_string(),
                    reason: e.to_string(),
                });
            }
        };

        let history =
            TradingHistory::from_json(&content).map_err(|e| BotError::LoadCorruption {
                path: self.path.display().to_string(),
                reason: e.to_string(),
            })?;
        tracing::info!(
            path = %self.path.display(),
            transactions = history.transactions.len(),
            snapshots = history.portfolio_history.len(),
            "history loaded"
        );
        Ok(history)
    }

    fn save(&self, history: &TradingHistory) -> Result<(), BotError> {
        let json = history.to_json().map_err(|e| self.persistence_error(e))?;
        let tmp = self.temp_path();
        fs::write(&tmp, json).map_err(|e| self.persistence_error(e))?;
        fs::rename(&tmp, &self.path).map_err(|e| {
            let _ = fs::remove_file(&tmp);
            self.persistence_error(e)
        })
    }
}
