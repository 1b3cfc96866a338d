//! End-of-run performance summary.

use super::history::TradingHistory;

#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub final_value: f64,
    /// First recorded portfolio value, or the initial capital when nothing
    /// was ever recorded.
    pub baseline: f64,
    pub total_return: f64,
    pub transactions: usize,
    pub snapshots: usize,
}

impl RunSummary {
    pub fn compute(history: &TradingHistory, final_value: f64, initial_capital: f64) -> Self {
        let baseline = history.first_value().unwrap_or(initial_capital);
        let total_return = if baseline > 0.0 {
            (final_value - baseline) / baseline
        } else {
            0.0
        };

        RunSummary {
            final_value,
            baseline,
            total_return,
            transactions: history.transactions.len(),
            snapshots: history.portfolio_history.len(),
        }
    }

    pub fn total_return_pct(&self) -> f64 {
        self.total_return * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::history::PortfolioSnapshot;
    use approx::assert_relative_eq;
    use chrono::{TimeZone, Utc};

    fn history_with_values(values: &[f64]) -> TradingHistory {
        let mut history = TradingHistory::new();
        for (i, &v) in values.iter().enumerate() {
            history.record_snapshot(PortfolioSnapshot {
                timestamp: Utc.timestamp_opt(1_733_835_600 + i as i64 * 3, 0).unwrap(),
                portfolio_value: v,
            });
        }
        history
    }

    #[test]
    fn return_relative_to_first_snapshot() {
        let history = history_with_values(&[8_000.0, 9_000.0, 10_000.0]);
        let summary = RunSummary::compute(&history, 10_000.0, 5_000.0);

        assert_relative_eq!(summary.baseline, 8_000.0);
        assert_relative_eq!(summary.total_return, 0.25);
        assert_relative_eq!(summary.total_return_pct(), 25.0);
        assert_eq!(summary.snapshots, 3);
    }

    #[test]
    fn empty_history_uses_initial_capital() {
        let summary = RunSummary::compute(&TradingHistory::new(), 9_500.0, 10_000.0);
        assert_relative_eq!(summary.baseline, 10_000.0);
        assert_relative_eq!(summary.total_return, -0.05);
        assert_eq!(summary.transactions, 0);
    }

    #[test]
    fn zero_baseline_has_zero_return() {
        let summary = RunSummary::compute(&TradingHistory::new(), 0.0, 0.0);
        assert_eq!(summary.total_return, 0.0);
    }
}
