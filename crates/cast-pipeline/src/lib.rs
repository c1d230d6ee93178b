//! Prediction pipeline for pricecast
//!
//! Given a symbol and an as-of date, the pipeline gathers price history,
//! news and social sentiment, builds a structured analysis prompt, calls
//! an LLM and parses the free-form response into named sections plus a
//! numeric target price.

pub mod error;
pub mod parse;
pub mod predictor;
pub mod prompts;

pub use error::{PipelineError, Result};
pub use parse::{ResponseSections, extract_target_price, parse_sections};
pub use predictor::{LlmPredictor, PredictionResult, Predictor};
