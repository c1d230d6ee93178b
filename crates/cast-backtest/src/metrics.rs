//! Prediction accuracy metrics

use serde::{Deserialize, Serialize};

/// Accuracy metrics for one evaluated prediction
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EvaluationMetrics {
    /// `|actual - predicted|`
    pub absolute_error: f64,
    /// `|predicted - actual| / actual * 100`, always non-negative
    pub percentage_error: f64,
    /// Whether the predicted move direction matched the observed one
    pub direction_correct: bool,
}

/// Absolute error between predicted and actual price
pub fn absolute_error(predicted: f64, actual: f64) -> f64 {
    (actual - predicted).abs()
}

/// Percentage error between predicted and actual price
///
/// Non-negative by construction. An actual price of exactly zero yields
/// infinity; real equity closes are positive.
pub fn percentage_error(predicted: f64, actual: f64) -> f64 {
    if actual == 0.0 {
        f64::INFINITY
    } else {
        (predicted - actual).abs() / actual * 100.0
    }
}

/// Whether the prediction called the direction of the move correctly
///
/// Both the predicted and the observed delta against the last training
/// price must be non-zero and share a sign. A zero delta on either side
/// counts as not correct.
pub fn direction_correct(predicted: f64, last_train: f64, actual: f64) -> bool {
    let predicted_delta = predicted - last_train;
    let actual_delta = actual - last_train;

    if predicted_delta == 0.0 || actual_delta == 0.0 {
        return false;
    }

    (predicted_delta > 0.0) == (actual_delta > 0.0)
}

/// Compute the full metric set for one evaluated prediction
pub fn evaluate(predicted: f64, last_train: f64, actual: f64) -> EvaluationMetrics {
    EvaluationMetrics {
        absolute_error: absolute_error(predicted, actual),
        percentage_error: percentage_error(predicted, actual),
        direction_correct: direction_correct(predicted, last_train, actual),
    }
}
