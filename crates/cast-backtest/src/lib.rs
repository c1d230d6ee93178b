//! Backtesting of LLM stock predictions
//!
//! A backtest partitions recent history into a training window and a
//! test date, asks the prediction pipeline for a next-day call using
//! training data only, then scores the extracted price target against
//! the later-observed close. Results are persisted as a JSON snapshot
//! and rendered into a plain-text report.

pub mod error;
pub mod metrics;
pub mod report;
pub mod runner;
pub mod snapshot;
pub mod window;

pub use error::{BacktestError, Result};
pub use metrics::EvaluationMetrics;
pub use runner::{BacktestRun, BacktestRunner, EvaluationResult, Outcome, SymbolOutcome};
pub use snapshot::{AggregateStats, BacktestSnapshot, SymbolRecord};
pub use window::BacktestWindow;
