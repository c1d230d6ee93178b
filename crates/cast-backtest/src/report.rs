//! Plain-text report rendering
//!
//! Reports render from a snapshot only. Rendering the same snapshot
//! twice produces byte-identical text.

use crate::error::Result;
use crate::snapshot::{BacktestSnapshot, SymbolRecord};
use std::fs;
use std::path::{Path, PathBuf};

/// Render the full text report for a snapshot
pub fn render(snapshot: &BacktestSnapshot) -> String {
    let mut out = String::new();

    out.push_str("===== STOCK PREDICTION BACKTEST REPORT =====\n");
    out.push_str(&format!(
        "Generated: {}\n",
        snapshot.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));

    for (symbol, record) in snapshot.records() {
        out.push('\n');
        out.push_str(&format!("----- {symbol} -----\n"));

        match record {
            Some(record) => render_symbol(&mut out, snapshot, record),
            None => out.push_str("No result data available\n"),
        }
    }

    render_summary(&mut out, snapshot);
    out
}

fn render_symbol(out: &mut String, snapshot: &BacktestSnapshot, record: &SymbolRecord) {
    if record.status != "success" {
        out.push_str(&format!("Status: {}\n", record.status));
        out.push_str(&format!(
            "Message: {}\n",
            record.message.as_deref().unwrap_or("Unknown error")
        ));
        return;
    }

    let Some(evaluation) = &record.evaluation else {
        out.push_str("No evaluation data available\n");
        return;
    };

    out.push_str(&format!(
        "Prediction date: {}\n",
        snapshot.window.train_end
    ));
    out.push_str(&format!("Test date: {}\n", snapshot.window.test_date));
    out.push_str(&format!(
        "Predicted price: ${:.2}\n",
        evaluation.prediction.predicted_price
    ));
    out.push_str(&format!(
        "Last training price: ${:.2}\n",
        evaluation.actual.last_train_price
    ));
    out.push_str(&format!(
        "Actual price on {}: ${:.2}\n",
        evaluation.actual.date, evaluation.actual.actual_price
    ));
    out.push_str(&format!(
        "Absolute error: ${:.2}\n",
        evaluation.metrics.absolute_error
    ));
    out.push_str(&format!(
        "Percentage error: {:.2}%\n",
        evaluation.metrics.percentage_error
    ));
    out.push_str(&format!(
        "Direction prediction correct: {}\n",
        evaluation.metrics.direction_correct
    ));

    if evaluation.actual.last_train_price != 0.0 {
        let change = (evaluation.actual.actual_price - evaluation.actual.last_train_price)
            / evaluation.actual.last_train_price
            * 100.0;
        out.push_str(&format!("Actual change: {change:.2}%\n"));
    }
}

fn render_summary(out: &mut String, snapshot: &BacktestSnapshot) {
    let stats = snapshot.aggregate();

    out.push_str("\n===== SUMMARY STATISTICS =====\n");
    out.push_str(&format!("Total symbols tested: {}\n", stats.total));

    out.push_str(&format!(
        "Successful predictions: {}/{}",
        stats.successes, stats.total
    ));
    if let Some(ratio) = stats.success_ratio() {
        out.push_str(&format!(" ({:.1}%)", ratio * 100.0));
    }
    out.push('\n');

    let Some(accuracy) = stats.direction_accuracy() else {
        out.push_str("No successful predictions; accuracy statistics unavailable\n");
        return;
    };

    out.push_str(&format!(
        "Direction accuracy: {}/{} ({:.1}%)\n",
        stats.direction_hits,
        stats.successes,
        accuracy * 100.0
    ));

    if let Some(avg) = stats.avg_absolute_error {
        out.push_str(&format!("Average absolute error: ${avg:.2}\n"));
    }
    if let Some(avg) = stats.avg_percentage_error {
        out.push_str(&format!("Average percentage error: {avg:.2}%\n"));
    }
}

/// Render the report and write it under `output_dir`
///
/// The file name derives from the snapshot's generation time, so the
/// same snapshot always maps to the same report file.
pub fn write_report(snapshot: &BacktestSnapshot, output_dir: &Path) -> Result<PathBuf> {
    fs::create_dir_all(output_dir)?;

    let path = output_dir.join(format!(
        "backtest_report_{}.txt",
        snapshot.generated_at.format("%Y%m%d_%H%M%S")
    ));
    fs::write(&path, render(snapshot))?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics;
    use crate::runner::{BacktestRun, EvaluationResult, Outcome, SymbolOutcome};
    use crate::window::BacktestWindow;
    use cast_pipeline::{PredictionResult, ResponseSections};
    use chrono::{NaiveDate, Utc};

    fn day(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn outcome(symbol: &str, predicted: f64, last_train: f64, actual: f64) -> SymbolOutcome {
        let window = BacktestWindow::for_today(day("2025-06-04"));
        SymbolOutcome {
            symbol: symbol.to_string(),
            prediction: Some(PredictionResult {
                symbol: symbol.to_string(),
                user_query: String::new(),
                text: format!("PREDICTION: ${predicted:.2}"),
                sections: ResponseSections::default(),
                target_price: Some(predicted),
                generated_at: Utc::now(),
            }),
            outcome: Outcome::Evaluated(EvaluationResult {
                symbol: symbol.to_string(),
                prediction_date: window.train_end,
                test_date: window.test_date,
                actual_date: window.test_date,
                predicted_price: predicted,
                last_train_price: last_train,
                actual_price: actual,
                metrics: metrics::evaluate(predicted, last_train, actual),
            }),
        }
    }

    fn failed(symbol: &str, message: &str) -> SymbolOutcome {
        SymbolOutcome {
            symbol: symbol.to_string(),
            prediction: None,
            outcome: Outcome::Failed {
                message: message.to_string(),
            },
        }
    }

    fn snapshot(outcomes: Vec<SymbolOutcome>) -> BacktestSnapshot {
        let run = BacktestRun {
            window: BacktestWindow::for_today(day("2025-06-04")),
            outcomes,
        };
        BacktestSnapshot::from_run(&run, Utc::now())
    }

    #[test]
    fn test_report_contains_symbol_blocks_and_summary() {
        let snapshot = snapshot(vec![
            outcome("AAPL", 201.80, 202.14, 198.89),
            outcome("NVDA", 430.60, 385.73, 436.17),
            failed("MSFT", "API limit reached. Please try again later."),
        ]);

        let report = render(&snapshot);

        assert!(report.starts_with("===== STOCK PREDICTION BACKTEST REPORT ====="));
        assert!(report.contains("----- AAPL -----"));
        assert!(report.contains("Predicted price: $201.80"));
        assert!(report.contains("Last training price: $202.14"));
        assert!(report.contains("Actual price on 2025-06-03: $198.89"));
        assert!(report.contains("----- MSFT -----"));
        assert!(report.contains("Status: error"));
        assert!(report.contains("Message: API limit reached. Please try again later."));
        assert!(report.contains("Total symbols tested: 3"));
        assert!(report.contains("Successful predictions: 2/3 (66.7%)"));
        assert!(report.contains("Direction accuracy: 2/2 (100.0%)"));
    }

    #[test]
    fn test_symbol_order_follows_request_order() {
        let snapshot = snapshot(vec![
            outcome("NVDA", 430.60, 385.73, 436.17),
            outcome("AAPL", 201.80, 202.14, 198.89),
        ]);

        let report = render(&snapshot);
        let nvda = report.find("----- NVDA -----").unwrap();
        let aapl = report.find("----- AAPL -----").unwrap();
        assert!(nvda < aapl);
    }

    #[test]
    fn test_zero_successes_reports_no_data() {
        let snapshot = snapshot(vec![failed("AAPL", "down"), failed("MSFT", "down")]);

        let report = render(&snapshot);

        assert!(report.contains("Successful predictions: 0/2 (0.0%)"));
        assert!(report.contains("No successful predictions; accuracy statistics unavailable"));
        assert!(!report.contains("NaN"));
        assert!(!report.contains("Direction accuracy:"));
    }

    #[test]
    fn test_rendering_is_idempotent() {
        let snapshot = snapshot(vec![outcome("AAPL", 201.80, 202.14, 198.89)]);

        assert_eq!(render(&snapshot), render(&snapshot));
    }

    #[test]
    fn test_write_report_uses_snapshot_timestamp() {
        let snapshot = snapshot(vec![outcome("AAPL", 201.80, 202.14, 198.89)]);
        let dir = std::env::temp_dir().join(format!("pricecast_reports_{}", std::process::id()));

        let path = write_report(&snapshot, &dir).unwrap();
        let on_disk = std::fs::read_to_string(&path).unwrap();
        let _ = std::fs::remove_dir_all(&dir);

        assert_eq!(on_disk, render(&snapshot));
        assert!(
            path.file_name()
                .unwrap()
                .to_string_lossy()
                .starts_with("backtest_report_")
        );
    }
}
