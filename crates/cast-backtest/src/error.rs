//! Error types for backtesting

use thiserror::Error;

/// Result type alias for backtest operations
pub type Result<T> = std::result::Result<T, BacktestError>;

/// Errors that can occur during a backtest
///
/// Per-symbol failures are recorded into the run's outcomes with their
/// message and never abort the run; only snapshot I/O surfaces to the
/// caller directly.
#[derive(Debug, Error)]
pub enum BacktestError {
    /// Upstream price data could not be fetched; the message is carried
    /// verbatim
    #[error("Failed to fetch test data: {0}")]
    Fetch(String),

    /// The prediction contained no usable target price
    #[error("No usable target price in prediction for {symbol}")]
    MissingPrediction { symbol: String },

    /// The training window contained no prices
    #[error("No training price data found for {symbol}")]
    MissingTrainingData { symbol: String },

    /// Snapshot file I/O failed
    #[error("Snapshot I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Snapshot (de)serialization failed
    #[error("Snapshot format error: {0}")]
    Json(#[from] serde_json::Error),
}
