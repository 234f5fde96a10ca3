//! Configuration validation.
//!
//! Validates all config fields before a run. Every tunable has a sane
//! default, so validation only rejects values that are present and out of
//! range, plus the handful of keys that must be supplied.

use crate::domain::error::PapertraderError;
use crate::ports::config_port::ConfigPort;
use chrono::NaiveTime;

pub fn validate_run_config(config: &dyn ConfigPort) -> Result<(), PapertraderError> {
    validate_engine_config(config)?;
    validate_costs_config(config)?;
    validate_market_config(config)?;
    validate_backtest_config(config)?;
    Ok(())
}

pub fn validate_engine_config(config: &dyn ConfigPort) -> Result<(), PapertraderError> {
    validate_quantiles(config)?;
    validate_confidence_decay(config)?;
    validate_exit_decay_threshold(config)?;
    validate_overnight_hold_threshold(config)?;
    validate_position_pct(config)?;
    validate_history_depths(config)?;
    validate_max_trades_per_day(config)?;
    Ok(())
}

pub fn validate_costs_config(config: &dyn ConfigPort) -> Result<(), PapertraderError> {
    validate_commission(config)?;
    validate_friction_pct(config, "spread_pct")?;
    validate_friction_pct(config, "slippage_pct")?;
    Ok(())
}

pub fn validate_market_config(config: &dyn ConfigPort) -> Result<(), PapertraderError> {
    let open = parse_time(config, "open_time", "09:30")?;
    let close = parse_time(config, "close_time", "16:00")?;
    if open >= close {
        return Err(PapertraderError::ConfigInvalid {
            section: "market".to_string(),
            key: "open_time".to_string(),
            reason: "open_time must be before close_time".to_string(),
        });
    }

    let buffer = config.get_int("market", "close_buffer_minutes", 10);
    if buffer < 0 {
        return Err(PapertraderError::ConfigInvalid {
            section: "market".to_string(),
            key: "close_buffer_minutes".to_string(),
            reason: "close_buffer_minutes must be non-negative".to_string(),
        });
    }
    Ok(())
}

pub fn validate_backtest_config(config: &dyn ConfigPort) -> Result<(), PapertraderError> {
    let starting_cash = config.get_double("backtest", "starting_cash", 0.0);
    if starting_cash <= 0.0 {
        return Err(PapertraderError::ConfigInvalid {
            section: "backtest".to_string(),
            key: "starting_cash".to_string(),
            reason: "starting_cash must be positive".to_string(),
        });
    }

    match config.get_string("backtest", "data_dir") {
        Some(s) if !s.trim().is_empty() => {}
        _ => {
            return Err(PapertraderError::ConfigMissing {
                section: "backtest".to_string(),
                key: "data_dir".to_string(),
            })
        }
    }

    validate_tickers(config)?;
    Ok(())
}

fn validate_quantiles(config: &dyn ConfigPort) -> Result<(), PapertraderError> {
    let upper = config.get_double("engine", "upper_quantile", 0.80);
    let lower = config.get_double("engine", "lower_quantile", 0.20);

    for (key, value) in [("upper_quantile", upper), ("lower_quantile", lower)] {
        if value <= 0.0 || value >= 1.0 {
            return Err(PapertraderError::ConfigInvalid {
                section: "engine".to_string(),
                key: key.to_string(),
                reason: format!("{} must be between 0 and 1 exclusive", key),
            });
        }
    }

    if upper <= lower {
        return Err(PapertraderError::ConfigInvalid {
            section: "engine".to_string(),
            key: "upper_quantile".to_string(),
            reason: "upper_quantile must be above lower_quantile".to_string(),
        });
    }
    Ok(())
}

fn validate_confidence_decay(config: &dyn ConfigPort) -> Result<(), PapertraderError> {
    let value = config.get_double("engine", "confidence_decay", 0.97);
    if value <= 0.0 || value > 1.0 {
        return Err(PapertraderError::ConfigInvalid {
            section: "engine".to_string(),
            key: "confidence_decay".to_string(),
            reason: "confidence_decay must be in (0, 1]".to_string(),
        });
    }
    Ok(())
}

fn validate_exit_decay_threshold(config: &dyn ConfigPort) -> Result<(), PapertraderError> {
    let value = config.get_double("engine", "exit_decay_threshold", 0.25);
    if value <= 0.0 || value >= 1.0 {
        return Err(PapertraderError::ConfigInvalid {
            section: "engine".to_string(),
            key: "exit_decay_threshold".to_string(),
            reason: "exit_decay_threshold must be between 0 and 1".to_string(),
        });
    }
    Ok(())
}

fn validate_overnight_hold_threshold(config: &dyn ConfigPort) -> Result<(), PapertraderError> {
    let value = config.get_double("engine", "overnight_hold_threshold", 0.6);
    if value <= 0.0 || value >= 1.0 {
        return Err(PapertraderError::ConfigInvalid {
            section: "engine".to_string(),
            key: "overnight_hold_threshold".to_string(),
            reason: "overnight_hold_threshold must be between 0 and 1".to_string(),
        });
    }
    Ok(())
}

fn validate_position_pct(config: &dyn ConfigPort) -> Result<(), PapertraderError> {
    let value = config.get_double("engine", "position_pct", 0.20);
    if value <= 0.0 || value > 1.0 {
        return Err(PapertraderError::ConfigInvalid {
            section: "engine".to_string(),
            key: "position_pct".to_string(),
            reason: "position_pct must be in (0, 1]".to_string(),
        });
    }
    Ok(())
}

fn validate_history_depths(config: &dyn ConfigPort) -> Result<(), PapertraderError> {
    let capacity = config.get_int("engine", "history_capacity", 50);
    if capacity < 1 {
        return Err(PapertraderError::ConfigInvalid {
            section: "engine".to_string(),
            key: "history_capacity".to_string(),
            reason: "history_capacity must be at least 1".to_string(),
        });
    }

    let min_history = config.get_int("engine", "min_history_for_trade", 20);
    if min_history < 1 {
        return Err(PapertraderError::ConfigInvalid {
            section: "engine".to_string(),
            key: "min_history_for_trade".to_string(),
            reason: "min_history_for_trade must be at least 1".to_string(),
        });
    }

    if min_history > capacity {
        return Err(PapertraderError::ConfigInvalid {
            section: "engine".to_string(),
            key: "min_history_for_trade".to_string(),
            reason: "min_history_for_trade cannot exceed history_capacity".to_string(),
        });
    }
    Ok(())
}

fn validate_max_trades_per_day(config: &dyn ConfigPort) -> Result<(), PapertraderError> {
    let value = config.get_int("engine", "max_trades_per_day", 5);
    if value < 0 {
        return Err(PapertraderError::ConfigInvalid {
            section: "engine".to_string(),
            key: "max_trades_per_day".to_string(),
            reason: "max_trades_per_day must be non-negative".to_string(),
        });
    }
    Ok(())
}

fn validate_commission(config: &dyn ConfigPort) -> Result<(), PapertraderError> {
    let value = config.get_double("costs", "commission_per_trade", 0.0);
    if value < 0.0 {
        return Err(PapertraderError::ConfigInvalid {
            section: "costs".to_string(),
            key: "commission_per_trade".to_string(),
            reason: "commission_per_trade must be non-negative".to_string(),
        });
    }
    Ok(())
}

fn validate_friction_pct(config: &dyn ConfigPort, key: &str) -> Result<(), PapertraderError> {
    let value = config.get_double("costs", key, 0.0);
    if value < 0.0 || value >= 1.0 {
        return Err(PapertraderError::ConfigInvalid {
            section: "costs".to_string(),
            key: key.to_string(),
            reason: format!("{} is a fraction and must be in [0, 1)", key),
        });
    }
    Ok(())
}

fn parse_time(
    config: &dyn ConfigPort,
    key: &str,
    default: &str,
) -> Result<NaiveTime, PapertraderError> {
    let value = config
        .get_string("market", key)
        .unwrap_or_else(|| default.to_string());
    NaiveTime::parse_from_str(&value, "%H:%M").map_err(|_| PapertraderError::ConfigInvalid {
        section: "market".to_string(),
        key: key.to_string(),
        reason: format!("invalid {} format, expected HH:MM", key),
    })
}

fn validate_tickers(config: &dyn ConfigPort) -> Result<(), PapertraderError> {
    let tickers = config.get_string("backtest", "tickers");
    let ticker = config.get_string("backtest", "ticker");

    match (tickers, ticker) {
        (Some(t), _) if !t.trim().is_empty() => Ok(()),
        (None, Some(t)) if !t.trim().is_empty() => Ok(()),
        _ => Err(PapertraderError::ConfigMissing {
            section: "backtest".to_string(),
            key: "ticker".to_string(),
        }),
    }
}
