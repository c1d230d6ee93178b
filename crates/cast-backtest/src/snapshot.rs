//! Snapshot persistence
//!
//! A run is persisted as one JSON document keyed by symbol. The report
//! renders exclusively from this type, so regenerating a report from a
//! saved snapshot reproduces the original text without any network
//! access.

use crate::error::Result;
use crate::metrics::EvaluationMetrics;
use crate::runner::{BacktestRun, Outcome};
use crate::window::BacktestWindow;
use cast_pipeline::ResponseSections;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// A persisted backtest run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestSnapshot {
    /// When the run finished
    pub generated_at: DateTime<Utc>,
    /// Date windows the run operated on
    pub window: BacktestWindow,
    /// Requested symbols in request order
    pub symbols: Vec<String>,
    /// Per-symbol results, keyed by symbol
    pub results: BTreeMap<String, SymbolRecord>,
}

/// Persisted outcome for one symbol
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SymbolRecord {
    /// "success" or "error"
    pub status: String,
    /// Failure message, verbatim from the failing step
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// The generated prediction, kept even when evaluation failed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prediction: Option<PredictionRecord>,
    /// The scored evaluation, present only on success
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evaluation: Option<EvaluationRecord>,
}

/// Persisted prediction payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionRecord {
    pub data: PredictionData,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionData {
    pub symbol: String,
    pub user_query: String,
    /// Full generated response text
    pub prediction: String,
    pub sections: ResponseSections,
    pub target_price: Option<f64>,
    pub timestamp: DateTime<Utc>,
}

/// Persisted evaluation payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationRecord {
    pub prediction: PredictedPrice,
    pub actual: ObservedPrices,
    pub metrics: EvaluationMetrics,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PredictedPrice {
    pub predicted_price: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ObservedPrices {
    pub last_train_price: f64,
    pub actual_price: f64,
    /// Trading day the actual price was observed on
    pub date: NaiveDate,
}

/// Summary statistics over one snapshot
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AggregateStats {
    /// Requested symbols
    pub total: usize,
    /// Symbols with a scored evaluation
    pub successes: usize,
    /// Successes whose direction call was correct
    pub direction_hits: usize,
    /// Mean absolute error over successes
    pub avg_absolute_error: Option<f64>,
    /// Mean percentage error over successes
    pub avg_percentage_error: Option<f64>,
}

impl AggregateStats {
    /// Successes over total, if any symbols were requested
    pub fn success_ratio(&self) -> Option<f64> {
        if self.total == 0 {
            None
        } else {
            Some(self.successes as f64 / self.total as f64)
        }
    }

    /// Direction hits over successes, if there were any successes
    pub fn direction_accuracy(&self) -> Option<f64> {
        if self.successes == 0 {
            None
        } else {
            Some(self.direction_hits as f64 / self.successes as f64)
        }
    }
}

impl BacktestSnapshot {
    /// Build a snapshot from a finished run
    pub fn from_run(run: &BacktestRun, generated_at: DateTime<Utc>) -> Self {
        let mut symbols = Vec::with_capacity(run.outcomes.len());
        let mut results = BTreeMap::new();

        for outcome in &run.outcomes {
            symbols.push(outcome.symbol.clone());

            let prediction = outcome.prediction.as_ref().map(|p| PredictionRecord {
                data: PredictionData {
                    symbol: p.symbol.clone(),
                    user_query: p.user_query.clone(),
                    prediction: p.text.clone(),
                    sections: p.sections.clone(),
                    target_price: p.target_price,
                    timestamp: p.generated_at,
                },
            });

            let record = match &outcome.outcome {
                Outcome::Evaluated(eval) => SymbolRecord {
                    status: "success".to_string(),
                    message: None,
                    prediction,
                    evaluation: Some(EvaluationRecord {
                        prediction: PredictedPrice {
                            predicted_price: eval.predicted_price,
                        },
                        actual: ObservedPrices {
                            last_train_price: eval.last_train_price,
                            actual_price: eval.actual_price,
                            date: eval.actual_date,
                        },
                        metrics: eval.metrics,
                    }),
                },
                Outcome::Failed { message } => SymbolRecord {
                    status: "error".to_string(),
                    message: Some(message.clone()),
                    prediction,
                    evaluation: None,
                },
            };

            results.insert(outcome.symbol.clone(), record);
        }

        Self {
            generated_at,
            window: run.window,
            symbols,
            results,
        }
    }

    /// Per-symbol records in request order
    pub fn records(&self) -> impl Iterator<Item = (&str, Option<&SymbolRecord>)> {
        self.symbols
            .iter()
            .map(|s| (s.as_str(), self.results.get(s)))
    }

    /// Compute summary statistics over the snapshot
    pub fn aggregate(&self) -> AggregateStats {
        let evaluations: Vec<&EvaluationRecord> = self
            .symbols
            .iter()
            .filter_map(|s| self.results.get(s).and_then(|r| r.evaluation.as_ref()))
            .collect();

        let successes = evaluations.len();
        let direction_hits = evaluations
            .iter()
            .filter(|e| e.metrics.direction_correct)
            .count();

        let (avg_absolute_error, avg_percentage_error) = if successes == 0 {
            (None, None)
        } else {
            let count = successes as f64;
            (
                Some(
                    evaluations
                        .iter()
                        .map(|e| e.metrics.absolute_error)
                        .sum::<f64>()
                        / count,
                ),
                Some(
                    evaluations
                        .iter()
                        .map(|e| e.metrics.percentage_error)
                        .sum::<f64>()
                        / count,
                ),
            )
        };

        AggregateStats {
            total: self.symbols.len(),
            successes,
            direction_hits,
            avg_absolute_error,
            avg_percentage_error,
        }
    }

    /// Write the snapshot as pretty-printed JSON
    pub fn save(&self, path: &Path) -> Result<()> {
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Load a snapshot from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        Ok(serde_json::from_str(&fs::read_to_string(path)?)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics;
    use crate::runner::{EvaluationResult, SymbolOutcome};
    use cast_pipeline::PredictionResult;

    fn day(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn sample_run() -> BacktestRun {
        let window = BacktestWindow::for_today(day("2025-06-04"));
        let prediction = PredictionResult {
            symbol: "AAPL".to_string(),
            user_query: "What next?".to_string(),
            text: "PREDICTION: $201.80".to_string(),
            sections: ResponseSections::default(),
            target_price: Some(201.80),
            generated_at: Utc::now(),
        };
        let evaluation = EvaluationResult {
            symbol: "AAPL".to_string(),
            prediction_date: window.train_end,
            test_date: window.test_date,
            actual_date: window.test_date,
            predicted_price: 201.80,
            last_train_price: 202.14,
            actual_price: 198.89,
            metrics: metrics::evaluate(201.80, 202.14, 198.89),
        };

        BacktestRun {
            window,
            outcomes: vec![
                SymbolOutcome {
                    symbol: "AAPL".to_string(),
                    prediction: Some(prediction),
                    outcome: Outcome::Evaluated(evaluation),
                },
                SymbolOutcome {
                    symbol: "MSFT".to_string(),
                    prediction: None,
                    outcome: Outcome::Failed {
                        message: "API limit reached".to_string(),
                    },
                },
            ],
        }
    }

    #[test]
    fn test_from_run_partitions_outcomes() {
        let snapshot = BacktestSnapshot::from_run(&sample_run(), Utc::now());

        assert_eq!(snapshot.symbols, ["AAPL", "MSFT"]);

        let aapl = &snapshot.results["AAPL"];
        assert_eq!(aapl.status, "success");
        assert!(aapl.evaluation.is_some());
        assert_eq!(
            aapl.prediction.as_ref().unwrap().data.target_price,
            Some(201.80)
        );

        let msft = &snapshot.results["MSFT"];
        assert_eq!(msft.status, "error");
        assert_eq!(msft.message.as_deref(), Some("API limit reached"));
        assert!(msft.evaluation.is_none());
    }

    #[test]
    fn test_serde_round_trip_preserves_partition() {
        let snapshot = BacktestSnapshot::from_run(&sample_run(), Utc::now());
        let json = serde_json::to_string_pretty(&snapshot).unwrap();
        let back: BacktestSnapshot = serde_json::from_str(&json).unwrap();

        assert_eq!(back.symbols, snapshot.symbols);
        assert_eq!(back.results["AAPL"].status, "success");
        assert_eq!(back.results["MSFT"].status, "error");
    }

    #[test]
    fn test_save_and_load() {
        let snapshot = BacktestSnapshot::from_run(&sample_run(), Utc::now());
        let path =
            std::env::temp_dir().join(format!("pricecast_snapshot_{}.json", std::process::id()));

        snapshot.save(&path).unwrap();
        let loaded = BacktestSnapshot::load(&path).unwrap();
        let _ = std::fs::remove_file(&path);

        assert_eq!(loaded.symbols, snapshot.symbols);
        assert_eq!(loaded.window, snapshot.window);
    }

    #[test]
    fn test_aggregate_counts_successes_only() {
        let snapshot = BacktestSnapshot::from_run(&sample_run(), Utc::now());
        let stats = snapshot.aggregate();

        assert_eq!(stats.total, 2);
        assert_eq!(stats.successes, 1);
        assert_eq!(stats.direction_hits, 1);
        assert_eq!(stats.success_ratio(), Some(0.5));
        assert_eq!(stats.direction_accuracy(), Some(1.0));
        assert!(stats.avg_percentage_error.unwrap() > 0.0);
    }

    #[test]
    fn test_aggregate_zero_successes_has_no_accuracy() {
        let run = BacktestRun {
            window: BacktestWindow::for_today(day("2025-06-04")),
            outcomes: vec![SymbolOutcome {
                symbol: "AAPL".to_string(),
                prediction: None,
                outcome: Outcome::Failed {
                    message: "down".to_string(),
                },
            }],
        };
        let stats = BacktestSnapshot::from_run(&run, Utc::now()).aggregate();

        assert_eq!(stats.successes, 0);
        assert_eq!(stats.direction_accuracy(), None);
        assert_eq!(stats.avg_absolute_error, None);
        assert_eq!(stats.avg_percentage_error, None);
    }
}
