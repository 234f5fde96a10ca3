//! Core domain types and logic.

pub mod window;
pub mod signal;
pub mod history;
pub mod regime;
pub mod broker;
pub mod engine;
pub mod calendar;
pub mod risk;
pub mod backtest;
pub mod config_validation;
pub mod error;
