//! Per-symbol backtest orchestration

use crate::error::BacktestError;
use crate::metrics::{self, EvaluationMetrics};
use crate::window::BacktestWindow;
use cast_market::PriceSource;
use cast_pipeline::{PredictionResult, Predictor, prompts};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

/// One scored prediction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationResult {
    /// Stock symbol
    pub symbol: String,
    /// The as-of date the prediction was made for
    pub prediction_date: NaiveDate,
    /// The date the prediction was scored against
    pub test_date: NaiveDate,
    /// Trading day the actual price was observed on (nearest available
    /// when the test date itself had no data)
    pub actual_date: NaiveDate,
    /// Price target extracted from the prediction
    pub predicted_price: f64,
    /// Last close of the training window
    pub last_train_price: f64,
    /// Observed close on the test date
    pub actual_price: f64,
    /// Accuracy metrics
    pub metrics: EvaluationMetrics,
}

/// How one symbol's backtest ended
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    /// The prediction was scored
    Evaluated(EvaluationResult),
    /// A fetch, prediction or evaluation step failed; the message is
    /// carried verbatim
    Failed { message: String },
}

/// The full record for one requested symbol
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SymbolOutcome {
    /// Stock symbol
    pub symbol: String,
    /// The generated prediction, kept even when evaluation failed
    pub prediction: Option<PredictionResult>,
    /// Evaluation outcome
    pub outcome: Outcome,
}

/// Results of one backtest run, in request order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestRun {
    /// Date windows the run operated on
    pub window: BacktestWindow,
    /// Per-symbol outcomes, one per requested symbol, in request order
    pub outcomes: Vec<SymbolOutcome>,
}

/// Runs backtests symbol by symbol
///
/// Symbols are processed independently and sequentially; one symbol's
/// failure is recorded and never affects another's result.
pub struct BacktestRunner {
    predictor: Arc<dyn Predictor>,
    prices: Arc<dyn PriceSource>,
}

impl BacktestRunner {
    /// Create a runner from its collaborators
    pub fn new(predictor: Arc<dyn Predictor>, prices: Arc<dyn PriceSource>) -> Self {
        Self { predictor, prices }
    }

    /// Run a backtest for `symbols` as of `today`
    pub async fn run(&self, symbols: &[String], today: NaiveDate) -> BacktestRun {
        let window = BacktestWindow::for_today(today);
        info!(
            train_start = %window.train_start,
            train_end = %window.train_end,
            test_date = %window.test_date,
            "Starting backtest for {} symbols",
            symbols.len()
        );

        let mut outcomes = Vec::with_capacity(symbols.len());
        for symbol in symbols {
            info!(symbol, "Running backtest");
            outcomes.push(self.backtest_symbol(symbol, &window).await);
        }

        BacktestRun { window, outcomes }
    }

    async fn backtest_symbol(&self, symbol: &str, window: &BacktestWindow) -> SymbolOutcome {
        let user_query = prompts::default_user_query(symbol, window.train_end);

        let prediction = match self
            .predictor
            .predict(symbol, window.train_end, &user_query)
            .await
        {
            Ok(prediction) => prediction,
            Err(e) => {
                warn!(symbol, error = %e, "Prediction failed");
                return SymbolOutcome {
                    symbol: symbol.to_string(),
                    prediction: None,
                    outcome: Outcome::Failed {
                        message: e.to_string(),
                    },
                };
            }
        };

        let outcome = match self.evaluate(symbol, &prediction, window).await {
            Ok(evaluation) => Outcome::Evaluated(evaluation),
            Err(e) => {
                warn!(symbol, error = %e, "Evaluation failed");
                Outcome::Failed {
                    message: e.to_string(),
                }
            }
        };

        SymbolOutcome {
            symbol: symbol.to_string(),
            prediction: Some(prediction),
            outcome,
        }
    }

    async fn evaluate(
        &self,
        symbol: &str,
        prediction: &PredictionResult,
        window: &BacktestWindow,
    ) -> Result<EvaluationResult, BacktestError> {
        let predicted_price =
            prediction
                .target_price
                .ok_or_else(|| BacktestError::MissingPrediction {
                    symbol: symbol.to_string(),
                })?;

        let training = self
            .prices
            .daily_closes(symbol, window.train_start, window.train_end)
            .await
            .map_err(|e| BacktestError::Fetch(e.to_string()))?;

        let last_train_price = training
            .last()
            .ok_or_else(|| BacktestError::MissingTrainingData {
                symbol: symbol.to_string(),
            })?
            .close;

        let actual = self
            .prices
            .close_on(symbol, window.test_date)
            .await
            .map_err(|e| BacktestError::Fetch(e.to_string()))?;

        Ok(EvaluationResult {
            symbol: symbol.to_string(),
            prediction_date: window.train_end,
            test_date: window.test_date,
            actual_date: actual.date,
            predicted_price,
            last_train_price,
            actual_price: actual.close,
            metrics: metrics::evaluate(predicted_price, last_train_price, actual.close),
        })
    }
}
