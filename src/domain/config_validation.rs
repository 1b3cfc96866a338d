//! Configuration validation.
//!
//! Validates all config fields before the bot starts. Every key is
//! optional; only values that are present are checked. Durations carry
//! upper bounds so that deadline and window arithmetic stays in range.

use crate::domain::crossover::EqualPolicy;
use crate::domain::error::BotError;
use crate::ports::config_port::ConfigPort;

/// One week.
pub const MAX_SMA_WINDOW_SECS: i64 = 7 * 24 * 60 * 60;
/// One day.
pub const MAX_FETCH_INTERVAL_SECS: f64 = 24.0 * 60.0 * 60.0;
pub const MAX_TIMEOUT_SECS: f64 = 600.0;

pub fn validate_bot_config(config: &dyn ConfigPort) -> Result<(), BotError> {
    validate_symbol(config)?;
    validate_bounded(config, "exchange", "timeout_secs", MAX_TIMEOUT_SECS)?;
    validate_bounded(config, "bot", "fetch_interval_secs", MAX_FETCH_INTERVAL_SECS)?;
    validate_whole_secs(config, "bot", "sma_window_secs", MAX_SMA_WINDOW_SECS)?;
    validate_bounded(config, "bot", "initial_capital", f64::MAX)?;
    validate_equal_policy(config)?;
    validate_history_path(config)?;
    Ok(())
}

fn invalid(section: &str, key: &str, reason: impl Into<String>) -> BotError {
    BotError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.into(),
    }
}

fn validate_symbol(config: &dyn ConfigPort) -> Result<(), BotError> {
    let Some(symbol) = config.get_string("exchange", "symbol") else {
        return Ok(());
    };
    let mut parts = symbol.split('/');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(base), Some(quote), None) if !base.trim().is_empty() && !quote.trim().is_empty() => {
            Ok(())
        }
        _ => Err(invalid(
            "exchange",
            "symbol",
            format!("'{symbol}' is not of the form BASE/QUOTE"),
        )),
    }
}

/// Positive, finite and at most `max`.
fn validate_bounded(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    max: f64,
) -> Result<(), BotError> {
    let Some(raw) = config.get_string(section, key) else {
        return Ok(());
    };
    match raw.trim().parse::<f64>() {
        Ok(v) if v.is_finite() && v > 0.0 && v <= max => Ok(()),
        Ok(v) if v.is_finite() && v > max => {
            Err(invalid(section, key, format!("{key} must be at most {max}")))
        }
        Ok(_) => Err(invalid(section, key, format!("{key} must be positive"))),
        Err(_) => Err(invalid(section, key, format!("'{raw}' is not a number"))),
    }
}

/// A whole number of seconds in `1..=max`.
fn validate_whole_secs(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    max: i64,
) -> Result<(), BotError> {
    let Some(raw) = config.get_string(section, key) else {
        return Ok(());
    };
    match raw.trim().parse::<i64>() {
        Ok(v) if (1..=max).contains(&v) => Ok(()),
        Ok(v) if v > max => Err(invalid(section, key, format!("{key} must be at most {max}"))),
        Ok(_) => Err(invalid(section, key, format!("{key} must be positive"))),
        Err(_) => Err(invalid(
            section,
            key,
            format!("'{raw}' is not a whole number of seconds"),
        )),
    }
}

fn validate_equal_policy(config: &dyn ConfigPort) -> Result<(), BotError> {
    match config.get_string("bot", "equal_policy") {
        Some(raw) => raw
            .parse::<EqualPolicy>()
            .map(|_| ())
            .map_err(|reason| invalid("bot", "equal_policy", reason)),
        None => Ok(()),
    }
}

fn validate_history_path(config: &dyn ConfigPort) -> Result<(), BotError> {
    match config.get_string("history", "path") {
        Some(s) if s.trim().is_empty() => Err(invalid("history", "path", "path must not be empty")),
        _ => Ok(()),
    }
}
