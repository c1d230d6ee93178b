//! Train/test date partitioning

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

/// The date windows one backtest run operates on
///
/// Training covers three weeks ago through two days ago; the test date
/// is yesterday. Predictions see training data only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BacktestWindow {
    /// First day of the training window
    pub train_start: NaiveDate,
    /// Last day of the training window; predictions are made as of this
    /// date
    pub train_end: NaiveDate,
    /// The day the prediction is scored against
    pub test_date: NaiveDate,
}

impl BacktestWindow {
    /// Build the window for a run happening on `today`
    pub fn for_today(today: NaiveDate) -> Self {
        Self {
            train_start: today - Duration::days(21),
            train_end: today - Duration::days(2),
            test_date: today - Duration::days(1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn test_window_arithmetic() {
        let window = BacktestWindow::for_today(day("2025-06-04"));

        assert_eq!(window.train_start, day("2025-05-14"));
        assert_eq!(window.train_end, day("2025-06-02"));
        assert_eq!(window.test_date, day("2025-06-03"));
    }

    #[test]
    fn test_test_date_follows_train_end() {
        let window = BacktestWindow::for_today(day("2025-06-04"));
        assert_eq!(window.test_date, window.train_end + Duration::days(1));
        assert!(window.train_start < window.train_end);
    }

    #[test]
    fn test_window_across_month_boundary() {
        let window = BacktestWindow::for_today(day("2025-07-01"));
        assert_eq!(window.train_start, day("2025-06-10"));
        assert_eq!(window.test_date, day("2025-06-30"));
    }
}
