//! Company news via the Finnhub API

use crate::error::{MarketError, Result};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::num::NonZeroU32;
use std::sync::Arc;

type SharedRateLimiter = Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>;

/// Articles kept per symbol after sorting newest-first
const MAX_ARTICLES: usize = 10;

/// A normalized news article
///
/// Missing upstream fields default to empty strings; an article never
/// has absent fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsArticle {
    /// Headline
    pub title: String,
    /// Article summary
    pub summary: String,
    /// News source name
    pub source: String,
    /// Article URL
    pub link: String,
    /// Publish time
    pub published: DateTime<Utc>,
}

/// Source of company news
#[async_trait]
pub trait NewsSource: Send + Sync {
    /// News for `symbol` published between `from` and `to` (inclusive),
    /// newest first, capped at ten articles
    async fn company_news(
        &self,
        symbol: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<NewsArticle>>;
}

/// Finnhub news article wire format
#[derive(Debug, Clone, Deserialize)]
struct FinnhubArticle {
    /// Publish time (UNIX timestamp)
    #[serde(default)]
    datetime: i64,
    /// News headline
    #[serde(default)]
    headline: String,
    /// News source
    #[serde(default)]
    source: String,
    /// Article summary
    #[serde(default)]
    summary: String,
    /// Article URL
    #[serde(default)]
    url: String,
}

/// Finnhub client for the company news API
pub struct FinnhubClient {
    client: Client,
    api_key: String,
    rate_limiter: SharedRateLimiter,
}

impl FinnhubClient {
    /// Create a new Finnhub client with rate limiting
    ///
    /// # Arguments
    /// * `api_key` - Finnhub API key
    /// * `rate_limit` - Requests per minute (free tier: 60, premium: 300+)
    pub fn new(api_key: impl Into<String>, rate_limit: u32) -> Self {
        let quota =
            Quota::per_minute(NonZeroU32::new(rate_limit).unwrap_or(NonZeroU32::new(60).unwrap()));
        let rate_limiter = Arc::new(RateLimiter::direct(quota));

        Self {
            client: Client::new(),
            api_key: api_key.into(),
            rate_limiter,
        }
    }
}

#[async_trait]
impl NewsSource for FinnhubClient {
    async fn company_news(
        &self,
        symbol: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<NewsArticle>> {
        self.rate_limiter.until_ready().await;

        let url = format!(
            "https://finnhub.io/api/v1/company-news?symbol={}&from={}&to={}&token={}",
            symbol,
            from.format("%Y-%m-%d"),
            to.format("%Y-%m-%d"),
            self.api_key
        );

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| MarketError::ApiError(format!("Finnhub request failed: {e}")))?;

        if response.status().as_u16() == 429 {
            let body = response.text().await.unwrap_or_default();
            return Err(MarketError::RateLimitExceeded {
                provider: "finnhub".to_string(),
                message: body,
            });
        }

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(MarketError::ApiError(format!(
                "Finnhub API error {status}: {body}"
            )));
        }

        let articles = response
            .json::<Vec<FinnhubArticle>>()
            .await
            .map_err(|e| MarketError::ApiError(format!("Failed to parse Finnhub response: {e}")))?;

        Ok(normalize_articles(articles))
    }
}

/// Normalize, sort newest-first and cap the raw article list
fn normalize_articles(articles: Vec<FinnhubArticle>) -> Vec<NewsArticle> {
    let mut normalized: Vec<NewsArticle> = articles
        .into_iter()
        .filter_map(|a| {
            let published = DateTime::from_timestamp(a.datetime, 0)?;
            Some(NewsArticle {
                title: a.headline,
                summary: a.summary,
                source: a.source,
                link: a.url,
                published,
            })
        })
        .collect();

    normalized.sort_by(|a, b| b.published.cmp(&a.published));
    normalized.truncate(MAX_ARTICLES);
    normalized
}

#[cfg(test)]
mod tests {
    use super::*;

    fn article(datetime: i64, headline: &str) -> FinnhubArticle {
        FinnhubArticle {
            datetime,
            headline: headline.to_string(),
            source: "Reuters".to_string(),
            summary: String::new(),
            url: "https://example.com".to_string(),
        }
    }

    #[test]
    fn test_finnhub_client_creation() {
        let client = FinnhubClient::new("test_key", 60);
        assert_eq!(client.api_key, "test_key");
    }

    #[test]
    fn test_normalize_sorts_newest_first_and_caps() {
        let raw: Vec<FinnhubArticle> = (0..15)
            .map(|i| article(1_700_000_000 + i * 86_400, &format!("headline {i}")))
            .collect();

        let normalized = normalize_articles(raw);

        assert_eq!(normalized.len(), 10);
        assert_eq!(normalized[0].title, "headline 14");
        assert!(normalized
            .windows(2)
            .all(|w| w[0].published >= w[1].published));
    }

    #[test]
    fn test_normalize_defaults_missing_fields() {
        let raw: Vec<FinnhubArticle> =
            serde_json::from_str(r#"[{"datetime": 1700000000}]"#).unwrap();
        let normalized = normalize_articles(raw);

        assert_eq!(normalized.len(), 1);
        assert_eq!(normalized[0].title, "");
        assert_eq!(normalized[0].summary, "");
    }

    #[tokio::test]
    #[ignore] // Requires network access and FINNHUB_API_KEY
    async fn test_company_news_live() {
        let key = std::env::var("FINNHUB_API_KEY").unwrap();
        let client = FinnhubClient::new(key, 60);
        let to = Utc::now().date_naive();
        let from = to - chrono::Duration::days(21);
        let news = client.company_news("AAPL", from, to).await.unwrap();
        assert!(news.len() <= 10);
    }
}
