//! The prediction pipeline
//!
//! `LlmPredictor` gathers training-window data, builds the analysis
//! prompt, calls the LLM and parses the response. Price history is
//! required; news and social data degrade gracefully when their sources
//! fail or are not configured.

use crate::error::{PipelineError, Result};
use crate::parse::{ResponseSections, extract_target_price, parse_sections};
use crate::prompts;
use async_trait::async_trait;
use cast_llm::{CompletionRequest, LLMProvider, Message};
use cast_market::{
    DailyPrice, NewsArticle, NewsSource, PipelineStep, PriceSource, SocialSnapshot, SocialSource,
    StepCache, StepKey,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

/// Trading-day span of the training window: 21 days back through the
/// as-of date (which itself sits 2 days before the run date)
const HISTORY_WINDOW_DAYS: i64 = 19;

const DEFAULT_MODEL: &str = "claude-sonnet-4-5-20250929";
const DEFAULT_MAX_TOKENS: usize = 2048;

/// A generated prediction for one symbol
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionResult {
    /// Stock symbol the prediction is for
    pub symbol: String,
    /// The question the prediction answers
    pub user_query: String,
    /// Full generated response text
    pub text: String,
    /// Parsed sections (empty strings where absent)
    pub sections: ResponseSections,
    /// Extracted numeric price target, if any was found
    pub target_price: Option<f64>,
    /// Generation timestamp
    pub generated_at: DateTime<Utc>,
}

/// Produces predictions for (symbol, as-of date, user query)
#[async_trait]
pub trait Predictor: Send + Sync {
    /// Generate a prediction for `symbol` using only data up to `as_of`
    async fn predict(
        &self,
        symbol: &str,
        as_of: NaiveDate,
        user_query: &str,
    ) -> Result<PredictionResult>;
}

/// LLM-backed prediction pipeline
pub struct LlmPredictor {
    llm: Arc<dyn LLMProvider>,
    prices: Arc<dyn PriceSource>,
    news: Option<Arc<dyn NewsSource>>,
    social: Option<Arc<dyn SocialSource>>,
    cache: StepCache,
    model: String,
    max_tokens: usize,
}

impl LlmPredictor {
    /// Create a predictor with required collaborators; news and social
    /// sources are optional extras
    pub fn new(llm: Arc<dyn LLMProvider>, prices: Arc<dyn PriceSource>, cache: StepCache) -> Self {
        Self {
            llm,
            prices,
            news: None,
            social: None,
            cache,
            model: DEFAULT_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }

    /// Attach a news source
    pub fn with_news(mut self, news: Arc<dyn NewsSource>) -> Self {
        self.news = Some(news);
        self
    }

    /// Attach a social media source
    pub fn with_social(mut self, social: Arc<dyn SocialSource>) -> Self {
        self.social = Some(social);
        self
    }

    /// Override the model identifier
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Override the generation token budget
    pub fn with_max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    async fn training_history(&self, symbol: &str, as_of: NaiveDate) -> Result<Vec<DailyPrice>> {
        let start = as_of - chrono::Duration::days(HISTORY_WINDOW_DAYS);
        let key = StepKey::new(symbol, PipelineStep::History, as_of);

        let value = self
            .cache
            .get_or_fetch(key, || async {
                let prices = self.prices.daily_closes(symbol, start, as_of).await?;
                Ok::<_, PipelineError>(serde_json::to_value(prices)?)
            })
            .await?;

        let history: Vec<DailyPrice> = serde_json::from_value(value)?;
        if history.is_empty() {
            return Err(PipelineError::MissingData(format!(
                "no training prices for {symbol}"
            )));
        }
        Ok(history)
    }

    async fn training_news(&self, symbol: &str, as_of: NaiveDate) -> Vec<NewsArticle> {
        let Some(news_source) = &self.news else {
            return Vec::new();
        };

        let start = as_of - chrono::Duration::days(HISTORY_WINDOW_DAYS);
        let key = StepKey::new(symbol, PipelineStep::News, as_of);

        let fetched = self
            .cache
            .get_or_fetch(key, || async {
                let articles = news_source.company_news(symbol, start, as_of).await?;
                Ok::<_, PipelineError>(serde_json::to_value(articles)?)
            })
            .await
            .and_then(|value| serde_json::from_value(value).map_err(PipelineError::from));

        match fetched {
            Ok(articles) => articles,
            Err(e) => {
                warn!(symbol, error = %e, "No news data found; continuing with stock data only");
                Vec::new()
            }
        }
    }

    async fn social_snapshot(&self, symbol: &str, as_of: NaiveDate) -> SocialSnapshot {
        let Some(social_source) = &self.social else {
            return SocialSnapshot::empty();
        };

        let key = StepKey::new(symbol, PipelineStep::Social, as_of);

        let fetched = self
            .cache
            .get_or_fetch(key, || async {
                let snapshot = social_source.symbol_posts(symbol).await?;
                Ok::<_, PipelineError>(serde_json::to_value(snapshot)?)
            })
            .await
            .and_then(|value| serde_json::from_value(value).map_err(PipelineError::from));

        match fetched {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!(symbol, error = %e, "No social media data available; using neutral sentiment");
                SocialSnapshot::empty()
            }
        }
    }

    async fn generate(&self, symbol: &str, as_of: NaiveDate, prompt: String) -> Result<String> {
        let key = StepKey::new(symbol, PipelineStep::Prediction, as_of);

        let value = self
            .cache
            .get_or_fetch(key, || async {
                let request = CompletionRequest::builder(self.model.clone())
                    .system(prompts::SYSTEM_PROMPT)
                    .add_message(Message::user(prompt))
                    .max_tokens(self.max_tokens)
                    .build();

                let response = self.llm.complete(request).await?;
                Ok::<_, PipelineError>(serde_json::Value::String(response.text().to_string()))
            })
            .await?;

        match value {
            serde_json::Value::String(text) => Ok(text),
            other => Ok(other.to_string()),
        }
    }
}

#[async_trait]
impl Predictor for LlmPredictor {
    async fn predict(
        &self,
        symbol: &str,
        as_of: NaiveDate,
        user_query: &str,
    ) -> Result<PredictionResult> {
        info!(symbol, %as_of, "Making prediction");

        let history = self.training_history(symbol, as_of).await?;
        let news = self.training_news(symbol, as_of).await;
        let social = self.social_snapshot(symbol, as_of).await;

        let prompt = prompts::prediction_prompt(
            symbol,
            as_of,
            &prompts::summarize_history(&history),
            &prompts::summarize_news(&news),
            &prompts::summarize_social(&social),
            user_query,
        );

        let text = self.generate(symbol, as_of, prompt).await?;
        let sections = parse_sections(&text);
        let target_price = extract_target_price(&text);

        info!(symbol, target_price, "Prediction generated");

        Ok(PredictionResult {
            symbol: symbol.to_string(),
            user_query: user_query.to_string(),
            text,
            sections,
            target_price,
            generated_at: Utc::now(),
        })
    }
}
