//! INI configuration adapter.
//!
//! Numeric lookups parse the trimmed raw value with the same rules the
//! validator uses, so a value either validates and is used, or is rejected
//! before the bot starts.

use crate::domain::error::BotError;
use crate::ports::config_port::ConfigPort;
use configparser::ini::Ini;
use std::path::Path;

pub struct FileConfigAdapter {
    ini: Ini,
    source: String,
}

impl FileConfigAdapter {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, BotError> {
        let source = path.as_ref().display().to_string();
        let mut ini = Ini::new();
        ini.load(path.as_ref())
            .map_err(|reason| BotError::ConfigParse {
                file: source.clone(),
                reason,
            })?;
        Ok(Self { ini, source })
    }

    pub fn from_string(content: &str) -> Result<Self, BotError> {
        let source = "<inline>".to_string();
        let mut ini = Ini::new();
        ini.read(content.to_string())
            .map_err(|reason| BotError::ConfigParse {
                file: source.clone(),
                reason,
            })?;
        Ok(Self { ini, source })
    }

    /// No keys at all: every lookup falls back to its default.
    pub fn empty() -> Self {
        Self {
            ini: Ini::new(),
            source: "<defaults>".to_string(),
        }
    }

    /// Where the settings came from, for diagnostics.
    pub fn source(&self) -> &str {
        &self.source
    }

    fn parsed<T: std::str::FromStr>(&self, section: &str, key: &str) -> Option<T> {
        self.get_string(section, key)?.trim().parse().ok()
    }
}

impl ConfigPort for FileConfigAdapter {
    fn get_string(&self, section: &str, key: &str) -> Option<String> {
        self.ini.get(section, key)
    }

    fn get_int(&self, section: &str, key: &str, default: i64) -> i64 {
        self.parsed(section, key).unwrap_or(default)
    }

    fn get_double(&self, section: &str, key: &str, default: f64) -> f64 {
        self.parsed(section, key).unwrap_or(default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const BOT_INI: &str = r#"
[exchange]
symbol = BTC/USD
base_url = https://api.kraken.com

[bot]
sma_window_secs = 90
initial_capital = 10000.5
fetch_interval_secs =  2.5
"#;

    #[test]
    fn reads_strings_and_numbers() {
        let adapter = FileConfigAdapter::from_string(BOT_INI).unwrap();
        assert_eq!(adapter.get_string("exchange", "symbol").as_deref(), Some("BTC/USD"));
        assert_eq!(adapter.get_int("bot", "sma_window_secs", 0), 90);
        assert_eq!(adapter.get_double("bot", "initial_capital", 0.0), 10000.5);
        assert_eq!(adapter.get_double("bot", "fetch_interval_secs", 0.0), 2.5);
    }

    #[test]
    fn integer_keys_read_as_doubles() {
        let adapter = FileConfigAdapter::from_string(BOT_INI).unwrap();
        assert_eq!(adapter.get_double("bot", "sma_window_secs", 0.0), 90.0);
    }

    #[test]
    fn missing_keys_fall_back() {
        let adapter = FileConfigAdapter::from_string(BOT_INI).unwrap();
        assert_eq!(adapter.get_string("bot", "missing"), None);
        assert_eq!(adapter.get_string("missing_section", "key"), None);
        assert_eq!(adapter.get_int("bot", "missing", 42), 42);
    }

    #[test]
    fn fractional_value_is_not_an_integer() {
        let adapter = FileConfigAdapter::from_string("[bot]\nsma_window_secs = 1.5\n").unwrap();
        assert_eq!(adapter.get_int("bot", "sma_window_secs", 60), 60);
        assert_eq!(adapter.get_double("bot", "sma_window_secs", 60.0), 1.5);
    }

    #[test]
    fn non_numeric_values_fall_back() {
        let adapter =
            FileConfigAdapter::from_string("[bot]\ninitial_capital = lots\nsma_window_secs = abc\n")
                .unwrap();
        assert_eq!(adapter.get_double("bot", "initial_capital", 99.9), 99.9);
        assert_eq!(adapter.get_int("bot", "sma_window_secs", 42), 42);
    }

    #[test]
    fn empty_adapter_uses_defaults() {
        let adapter = FileConfigAdapter::empty();
        assert_eq!(adapter.get_string("exchange", "symbol"), None);
        assert_eq!(adapter.get_double("bot", "initial_capital", 10_000.0), 10_000.0);
        assert_eq!(adapter.source(), "<defaults>");
    }

    #[test]
    fn from_file_records_its_path() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "[history]\npath = /var/lib/smacross/history.json\n").unwrap();

        let adapter = FileConfigAdapter::from_file(file.path()).unwrap();
        assert_eq!(
            adapter.get_string("history", "path").as_deref(),
            Some("/var/lib/smacross/history.json")
        );
        assert_eq!(adapter.source(), file.path().display().to_string());
    }

    #[test]
    fn missing_file_is_config_parse_error() {
        let err = FileConfigAdapter::from_file("/nonexistent/path/config.ini").err().unwrap();
        match err {
            BotError::ConfigParse { file, .. } => assert_eq!(file, "/nonexistent/path/config.ini"),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
