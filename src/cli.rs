//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

use crate::adapters::csv_data_adapter::CsvDataAdapter;
use crate::adapters::csv_log_adapter::CsvLogAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::backtest::BacktestRunner;
use crate::domain::broker::{Broker, CostModel};
use crate::domain::calendar::MarketCalendar;
use crate::domain::config_validation::validate_run_config;
use crate::domain::engine::{Engine, EngineConfig};
use crate::domain::error::PapertraderError;
use crate::domain::signal::ScoreWeights;
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::MarketDataPort;
use crate::ports::log_port::DecisionLogPort;

#[derive(Parser, Debug)]
#[command(name = "papertrader", about = "Signal-driven paper trading engine")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Replay historical data through the decision engine
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        ticker: Option<String>,
        #[arg(long)]
        data_dir: Option<PathBuf>,
        #[arg(long)]
        log_dir: Option<PathBuf>,
        /// Echo each decision record to stderr
        #[arg(short, long)]
        verbose: bool,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// List tickers with data files available
    ListSymbols {
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[arg(long)]
        data_dir: Option<PathBuf>,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Backtest {
            config,
            ticker,
            data_dir,
            log_dir,
            verbose,
        } => run_backtest(
            &config,
            ticker.as_deref(),
            data_dir.as_ref(),
            log_dir.as_ref(),
            verbose,
        ),
        Command::Validate { config } => run_validate(&config),
        Command::ListSymbols { config, data_dir } => {
            run_list_symbols(config.as_ref(), data_dir.as_ref())
        }
    }
}

pub fn load_config(path: &PathBuf) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|e| {
        let err = PapertraderError::ConfigParse {
            file: path.display().to_string(),
            reason: e.to_string(),
        };
        eprintln!("error: {err}");
        ExitCode::from(&err)
    })
}

fn run_backtest(
    config_path: &PathBuf,
    ticker_override: Option<&str>,
    data_dir_override: Option<&PathBuf>,
    log_dir_override: Option<&PathBuf>,
    verbose: bool,
) -> ExitCode {
    // Stage 1: Load config
    eprintln!("Loading config from {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    // Stage 2: Validate
    if let Err(e) = validate_run_config(&adapter) {
        eprintln!("error: {e}");
        return (&e).into();
    }

    // Stage 3: Build engine, broker, calendar
    let engine_config = build_engine_config(&adapter);
    let cost_model = build_cost_model(&adapter);
    let calendar = match build_calendar(&adapter) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };
    let starting_cash = adapter.get_double("backtest", "starting_cash", 100_000.0);

    // Stage 4: Resolve tickers
    let tickers = resolve_tickers(ticker_override, &adapter);
    if tickers.is_empty() {
        eprintln!("error: no tickers configured");
        return ExitCode::from(2);
    }

    // Stage 5: Wire adapters
    let data_dir = match data_dir_override {
        Some(p) => p.clone(),
        None => PathBuf::from(
            adapter
                .get_string("backtest", "data_dir")
                .unwrap_or_else(|| "data".to_string()),
        ),
    };
    let log_dir = match log_dir_override {
        Some(p) => p.clone(),
        None => PathBuf::from(
            adapter
                .get_string("log", "dir")
                .unwrap_or_else(|| "decisions".to_string()),
        ),
    };

    let data_port = CsvDataAdapter::new(data_dir);
    let mut log_port = CsvLogAdapter::new(log_dir, verbose);

    eprintln!(
        "Running backtest: {} tickers, starting cash {:.2}",
        tickers.len(),
        starting_cash
    );

    // Stage 6: Replay each ticker sequentially through one shared ledger
    let mut runner = BacktestRunner::new(
        Engine::new(engine_config),
        Broker::new(starting_cash, cost_model),
        calendar,
    );

    let mut total_trades: u32 = 0;
    let mut any_ran = false;

    for ticker in &tickers {
        let ticks = match data_port.fetch_window(ticker) {
            Ok(t) => t,
            Err(e) => {
                eprintln!("warning: skipping {} ({})", ticker, e);
                continue;
            }
        };

        let result = match runner.run(ticker, &ticks) {
            Ok(r) => r,
            Err(e @ PapertraderError::InsufficientData { .. }) => {
                eprintln!("warning: skipping {} ({})", ticker, e);
                continue;
            }
            Err(e) => {
                eprintln!("error: {e}");
                return (&e).into();
            }
        };

        for record in &result.records {
            if let Err(e) = log_port.record(record) {
                eprintln!("error: {e}");
                return (&e).into();
            }
        }

        eprintln!(
            "  {}: {} cycles, {} trades, equity {:.2}",
            result.ticker,
            result.records.len(),
            result.trades,
            result.final_equity
        );
        total_trades += result.trades;
        any_ran = true;
    }

    if !any_ran {
        eprintln!("error: no tickers with data to backtest");
        return ExitCode::from(3);
    }

    // Stage 7: Aggregate summary
    let broker = runner.broker();
    eprintln!("\n=== Results ===");
    eprintln!("Starting cash:  {:.2}", broker.starting_cash);
    eprintln!("Final cash:     {:.2}", broker.cash);
    eprintln!("Realized PnL:   {:.2}", broker.realized_pnl);
    eprintln!("Open positions: {}", broker.positions.len());
    eprintln!("Total trades:   {}", total_trades);

    ExitCode::SUCCESS
}

fn run_validate(config_path: &PathBuf) -> ExitCode {
    eprintln!("Validating config: {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    if let Err(e) = validate_run_config(&adapter) {
        eprintln!("error: {e}");
        return (&e).into();
    }

    let config = build_engine_config(&adapter);
    eprintln!("\nEngine configuration:");
    eprintln!("  weights:                  trend {} momentum {} volatility {}",
        config.weights.trend, config.weights.momentum, config.weights.volatility);
    eprintln!("  history_capacity:         {}", config.history_capacity);
    eprintln!("  min_history_for_trade:    {}", config.min_history_for_trade);
    eprintln!("  quantiles:                {} / {}", config.upper_quantile, config.lower_quantile);
    eprintln!("  confidence_decay:         {}", config.confidence_decay);
    eprintln!("  exit_decay_threshold:     {}", config.exit_decay_threshold);
    eprintln!("  overnight_hold_threshold: {}", config.overnight_hold_threshold);
    eprintln!("  position_pct:             {}", config.position_pct);
    eprintln!("  max_trades_per_day:       {}", config.max_trades_per_day);
    eprintln!("  regime_filter:            {}", config.regime_filter);

    eprintln!("\nConfiguration is valid.");
    ExitCode::SUCCESS
}

fn run_list_symbols(config_path: Option<&PathBuf>, data_dir: Option<&PathBuf>) -> ExitCode {
    let data_dir = match data_dir {
        Some(p) => p.clone(),
        None => {
            let config_path = match config_path {
                Some(p) => p,
                None => {
                    eprintln!("error: --config or --data-dir is required for list-symbols");
                    return ExitCode::from(1);
                }
            };
            let config = match load_config(config_path) {
                Ok(c) => c,
                Err(code) => return code,
            };
            match config.get_string("backtest", "data_dir") {
                Some(d) => PathBuf::from(d),
                None => {
                    eprintln!("error: data_dir is not configured");
                    return ExitCode::from(2);
                }
            }
        }
    };

    let adapter = CsvDataAdapter::new(data_dir);
    let tickers = match adapter.list_tickers() {
        Ok(t) => t,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    if tickers.is_empty() {
        eprintln!("No data files found");
    } else {
        for ticker in &tickers {
            println!("{}", ticker);
        }
        eprintln!("{} tickers found", tickers.len());
    }
    ExitCode::SUCCESS
}

pub fn build_engine_config(adapter: &dyn ConfigPort) -> EngineConfig {
    let defaults = EngineConfig::default();
    EngineConfig {
        weights: ScoreWeights {
            trend: adapter.get_double("engine", "trend_weight", 0.5),
            momentum: adapter.get_double("engine", "momentum_weight", 0.3),
            volatility: adapter.get_double("engine", "volatility_weight", 0.4),
        },
        history_capacity: adapter.get_int("engine", "history_capacity", 50) as usize,
        min_history_for_trade: adapter.get_int("engine", "min_history_for_trade", 20) as usize,
        upper_quantile: adapter.get_double("engine", "upper_quantile", 0.80),
        lower_quantile: adapter.get_double("engine", "lower_quantile", 0.20),
        confidence_decay: adapter.get_double("engine", "confidence_decay", 0.97),
        exit_decay_threshold: adapter.get_double("engine", "exit_decay_threshold", 0.25),
        overnight_hold_threshold: adapter.get_double("engine", "overnight_hold_threshold", 0.6),
        position_pct: adapter.get_double("engine", "position_pct", 0.20),
        max_trades_per_day: adapter.get_int("engine", "max_trades_per_day", 5) as u32,
        regime_filter: adapter.get_bool("engine", "regime_filter", defaults.regime_filter),
    }
}

pub fn build_cost_model(adapter: &dyn ConfigPort) -> CostModel {
    let defaults = CostModel::default();
    CostModel {
        commission_per_trade: adapter.get_double(
            "costs",
            "commission_per_trade",
            defaults.commission_per_trade,
        ),
        spread_pct: adapter.get_double("costs", "spread_pct", defaults.spread_pct),
        slippage_pct: adapter.get_double("costs", "slippage_pct", defaults.slippage_pct),
    }
}

pub fn build_calendar(adapter: &dyn ConfigPort) -> Result<MarketCalendar, PapertraderError> {
    let defaults = MarketCalendar::default();
    let open = parse_session_time(adapter, "open_time", defaults.open)?;
    let close = parse_session_time(adapter, "close_time", defaults.close)?;

    Ok(MarketCalendar {
        open,
        close,
        close_buffer_minutes: adapter.get_int(
            "market",
            "close_buffer_minutes",
            defaults.close_buffer_minutes,
        ),
    })
}

fn parse_session_time(
    adapter: &dyn ConfigPort,
    key: &str,
    default: chrono::NaiveTime,
) -> Result<chrono::NaiveTime, PapertraderError> {
    match adapter.get_string("market", key) {
        Some(value) => chrono::NaiveTime::parse_from_str(&value, "%H:%M").map_err(|_| {
            PapertraderError::ConfigInvalid {
                section: "market".to_string(),
                key: key.to_string(),
                reason: format!("invalid {} format, expected HH:MM", key),
            }
        }),
        None => Ok(default),
    }
}

pub fn resolve_tickers(ticker_override: Option<&str>, config: &dyn ConfigPort) -> Vec<String> {
    if let Some(t) = ticker_override {
        return vec![t.to_uppercase()];
    }

    if let Some(tickers_str) = config.get_string("backtest", "tickers") {
        return tickers_str
            .split(',')
            .map(|s| s.trim().to_uppercase())
            .filter(|s| !s.is_empty())
            .collect();
    }

    if let Some(ticker) = config.get_string("backtest", "ticker") {
        let ticker = ticker.trim().to_uppercase();
        if !ticker.is_empty() {
            return vec![ticker];
        }
    }

    vec![]
}
