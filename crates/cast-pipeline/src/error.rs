//! Error types for the prediction pipeline

use thiserror::Error;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Errors that can occur while producing a prediction
#[derive(Debug, Error)]
pub enum PipelineError {
    /// A market data fetch failed
    #[error("Failed to fetch stock data: {0}")]
    Market(#[from] cast_market::MarketError),

    /// The LLM call failed
    #[error("Failed to make prediction: {0}")]
    Llm(#[from] cast_llm::LLMError),

    /// Cached or fetched step data could not be (de)serialized
    #[error("Step data error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A required input was empty
    #[error("Missing data: {0}")]
    MissingData(String),
}
