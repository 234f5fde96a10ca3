//! INI file configuration adapter.

use crate::ports::config_port::ConfigPort;
use configparser::ini::Ini;
use std::path::Path;

pub struct FileConfigAdapter {
    config: Ini,
}

impl FileConfigAdapter {
    pub fn from_file<P: AsRef<Path>>(path: P) -> std::io::Result<Self> {
        let mut config = Ini::new();
        config.load(path).map_err(std::io::Error::other)?;
        Ok(Self { config })
    }

    pub fn from_string(content: &str) -> Result<Self, String> {
        let mut config = Ini::new();
        config.read(content.to_string())?;
        Ok(Self { config })
    }

    fn parse_bool(value: &str) -> Option<bool> {
        match value.to_lowercase().as_str() {
            "true" | "yes" | "1" => Some(true),
            "false" | "no" | "0" => Some(false),
            _ => None,
        }
    }
}

impl ConfigPort for FileConfigAdapter {
    fn get_string(&self, section: &str, key: &str) -> Option<String> {
        self.config.get(section, key)
    }

    fn get_int(&self, section: &str, key: &str, default: i64) -> i64 {
        self.config
            .getint(section, key)
            .ok()
            .flatten()
            .unwrap_or(default)
    }

    fn get_double(&self, section: &str, key: &str, default: f64) -> f64 {
        self.config
            .getfloat(section, key)
            .ok()
            .flatten()
            .unwrap_or(default)
    }

    fn get_bool(&self, section: &str, key: &str, default: bool) -> bool {
        self.config
            .get(section, key)
            .as_ref()
            .and_then(|v| Self::parse_bool(v))
            .unwrap_or(default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", content).unwrap();
        file
    }

    #[test]
    fn from_string_parses_config() {
        let content = r#"
[engine]
confidence_decay = 0.97
max_trades_per_day = 5

[backtest]
starting_cash = 100000.0
tickers = SPY

[log]
dir = decisions
"#;
        let adapter = FileConfigAdapter::from_string(content).unwrap();
        assert_eq!(
            adapter.get_string("backtest", "tickers"),
            Some("SPY".to_string())
        );
        assert_eq!(adapter.get_string("log", "dir"), Some("decisions".to_string()));
    }

    #[test]
    fn get_string_returns_none_for_missing_key() {
        let adapter =
            FileConfigAdapter::from_string("[backtest]\nstarting_cash = 100\n").unwrap();
        assert_eq!(adapter.get_string("backtest", "missing"), None);
        assert_eq!(adapter.get_string("missing_section", "key"), None);
    }

    #[test]
    fn get_int_returns_value() {
        let adapter =
            FileConfigAdapter::from_string("[engine]\nmax_trades_per_day = 5\n").unwrap();
        assert_eq!(adapter.get_int("engine", "max_trades_per_day", 0), 5);
    }

    #[test]
    fn get_int_returns_default_for_missing() {
        let adapter = FileConfigAdapter::from_string("[engine]\n").unwrap();
        assert_eq!(adapter.get_int("engine", "missing", 42), 42);
    }

    #[test]
    fn get_int_returns_default_for_non_numeric() {
        let adapter =
            FileConfigAdapter::from_string("[engine]\nmax_trades_per_day = abc\n").unwrap();
        assert_eq!(adapter.get_int("engine", "max_trades_per_day", 42), 42);
    }

    #[test]
    fn get_double_returns_value() {
        let adapter =
            FileConfigAdapter::from_string("[backtest]\nstarting_cash = 100000.5\n").unwrap();
        assert_eq!(adapter.get_double("backtest", "starting_cash", 0.0), 100000.5);
    }

    #[test]
    fn get_double_returns_default_for_missing() {
        let adapter = FileConfigAdapter::from_string("[backtest]\n").unwrap();
        assert_eq!(adapter.get_double("backtest", "missing", 99.9), 99.9);
    }

    #[test]
    fn get_double_returns_default_for_non_numeric() {
        let adapter =
            FileConfigAdapter::from_string("[backtest]\nstarting_cash = not_a_number\n").unwrap();
        assert_eq!(adapter.get_double("backtest", "starting_cash", 99.9), 99.9);
    }

    #[test]
    fn get_bool_returns_true_values() {
        let adapter =
            FileConfigAdapter::from_string("[engine]\na = true\nb = yes\nc = 1\n").unwrap();
        assert!(adapter.get_bool("engine", "a", false));
        assert!(adapter.get_bool("engine", "b", false));
        assert!(adapter.get_bool("engine", "c", false));
    }

    #[test]
    fn get_bool_returns_false_values() {
        let adapter =
            FileConfigAdapter::from_string("[engine]\na = false\nb = no\nc = 0\n").unwrap();
        assert!(!adapter.get_bool("engine", "a", true));
        assert!(!adapter.get_bool("engine", "b", true));
        assert!(!adapter.get_bool("engine", "c", true));
    }

    #[test]
    fn get_bool_returns_default_for_missing() {
        let adapter = FileConfigAdapter::from_string("[engine]\n").unwrap();
        assert!(adapter.get_bool("engine", "missing", true));
        assert!(!adapter.get_bool("engine", "missing", false));
    }

    #[test]
    fn from_file_reads_config() {
        let content = "[market]\nclose_buffer_minutes = 15\n";
        let file = create_temp_config(content);
        let adapter = FileConfigAdapter::from_file(file.path()).unwrap();
        assert_eq!(adapter.get_int("market", "close_buffer_minutes", 10), 15);
    }

    #[test]
    fn from_file_returns_error_for_missing_file() {
        let result = FileConfigAdapter::from_file("/nonexistent/path/config.ini");
        assert!(result.is_err());
    }

    #[test]
    fn handles_all_config_sections() {
        let content = r#"
[engine]
position_pct = 0.2
regime_filter = true

[costs]
commission_per_trade = 0.005

[market]
close_time = 16:00

[backtest]
starting_cash = 100000.0
tickers = SPY,QQQ
"#;
        let adapter = FileConfigAdapter::from_string(content).unwrap();

        assert_eq!(adapter.get_double("engine", "position_pct", 0.0), 0.2);
        assert!(adapter.get_bool("engine", "regime_filter", false));
        assert_eq!(adapter.get_double("costs", "commission_per_trade", 0.0), 0.005);
        assert_eq!(
            adapter.get_string("market", "close_time"),
            Some("16:00".to_string())
        );
        assert_eq!(
            adapter.get_string("backtest", "tickers"),
            Some("SPY,QQQ".to_string())
        );
    }
}
