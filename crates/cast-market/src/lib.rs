//! Market data collaborators for pricecast
//!
//! This crate wraps the external data sources the prediction pipeline
//! consumes behind narrow, mockable traits:
//!
//! - [`PriceSource`] - daily closing prices (Yahoo Finance)
//! - [`NewsSource`] - company news (Finnhub, rate-limited)
//! - [`SocialSource`] - social posts and sentiment (Reddit public search)
//!
//! plus the [`StepCache`] keyed by (symbol, step, as-of date) and the
//! [`MarketConfig`] the clients are built from.

pub mod cache;
pub mod config;
pub mod error;
pub mod history;
pub mod news;
pub mod social;

pub use cache::{PipelineStep, StepCache, StepKey};
pub use config::MarketConfig;
pub use error::{MarketError, Result};
pub use history::{DailyPrice, PriceSource, YahooFinanceClient};
pub use news::{FinnhubClient, NewsArticle, NewsSource};
pub use social::{RedditClient, SentimentSummary, SocialPost, SocialSnapshot, SocialSource};
