//! Social media posts and sentiment via Reddit public search

use crate::error::{MarketError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Posts kept per symbol after sorting by score
const MAX_POSTS: usize = 10;

/// A social media post about a symbol
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SocialPost {
    /// Post title
    pub title: String,
    /// Community score (upvotes minus downvotes)
    pub score: i64,
    /// Post creation time
    pub created: DateTime<Utc>,
    /// Post body text (may be empty for link posts)
    pub body: String,
    /// Estimated sentiment polarity in [-1, 1]
    pub polarity: f64,
}

/// Aggregated sentiment over a batch of posts
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SentimentSummary {
    pub avg_post_polarity: f64,
    pub avg_post_subjectivity: f64,
    pub avg_comment_polarity: f64,
    pub avg_comment_subjectivity: f64,
    pub post_count: usize,
    pub comment_count: usize,
}

impl SentimentSummary {
    /// A zeroed summary, used when no social data is available
    pub fn neutral() -> Self {
        Self {
            avg_post_polarity: 0.0,
            avg_post_subjectivity: 0.0,
            avg_comment_polarity: 0.0,
            avg_comment_subjectivity: 0.0,
            post_count: 0,
            comment_count: 0,
        }
    }
}

/// Social posts plus their aggregated sentiment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SocialSnapshot {
    pub posts: Vec<SocialPost>,
    pub sentiment: SentimentSummary,
}

impl SocialSnapshot {
    /// An empty snapshot with neutral sentiment
    pub fn empty() -> Self {
        Self {
            posts: Vec::new(),
            sentiment: SentimentSummary::neutral(),
        }
    }
}

/// Source of social posts and sentiment
#[async_trait]
pub trait SocialSource: Send + Sync {
    /// Recent posts discussing `symbol`, scored for sentiment
    async fn symbol_posts(&self, symbol: &str) -> Result<SocialSnapshot>;
}

// Reddit public search wire format

#[derive(Debug, Deserialize)]
struct RedditListing {
    data: RedditListingData,
}

#[derive(Debug, Deserialize)]
struct RedditListingData {
    children: Vec<RedditChild>,
}

#[derive(Debug, Deserialize)]
struct RedditChild {
    data: RedditPostData,
}

#[derive(Debug, Deserialize)]
struct RedditPostData {
    #[serde(default)]
    title: String,
    #[serde(default)]
    score: i64,
    #[serde(default)]
    created_utc: f64,
    #[serde(default)]
    selftext: String,
}

/// Reddit client over the unauthenticated search endpoint
pub struct RedditClient {
    client: Client,
    user_agent: String,
}

impl RedditClient {
    /// Create a new Reddit client
    pub fn new(user_agent: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            user_agent: user_agent.into(),
        })
    }
}

#[async_trait]
impl SocialSource for RedditClient {
    async fn symbol_posts(&self, symbol: &str) -> Result<SocialSnapshot> {
        let url = format!(
            "https://www.reddit.com/search.json?q={symbol}%20stock&limit={MAX_POSTS}&sort=relevance"
        );

        let response = self
            .client
            .get(&url)
            .header("User-Agent", &self.user_agent)
            .send()
            .await
            .map_err(|e| MarketError::ApiError(format!("Reddit request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(MarketError::ApiError(format!(
                "Reddit API error {status}: {body}"
            )));
        }

        let listing = response
            .json::<RedditListing>()
            .await
            .map_err(|e| MarketError::ApiError(format!("Failed to parse Reddit response: {e}")))?;

        let mut posts: Vec<SocialPost> = listing
            .data
            .children
            .into_iter()
            .map(|child| {
                let data = child.data;
                let text = format!("{} {}", data.title, data.selftext);
                SocialPost {
                    polarity: polarity(&text),
                    title: data.title,
                    score: data.score,
                    created: DateTime::from_timestamp(data.created_utc as i64, 0)
                        .unwrap_or_else(Utc::now),
                    body: data.selftext,
                }
            })
            .collect();

        posts.sort_by(|a, b| b.score.cmp(&a.score));
        posts.truncate(MAX_POSTS);

        let sentiment = summarize(&posts);
        Ok(SocialSnapshot { posts, sentiment })
    }
}

const POSITIVE_WORDS: &[&str] = &[
    "up", "gain", "gains", "bull", "bullish", "buy", "beat", "beats", "strong", "growth", "rally",
    "surge", "record", "upgrade", "moon", "undervalued", "profit", "win",
];

const NEGATIVE_WORDS: &[&str] = &[
    "down", "loss", "losses", "bear", "bearish", "sell", "miss", "misses", "weak", "drop", "crash",
    "plunge", "cut", "downgrade", "overvalued", "risk", "short", "fear",
];

/// Keyword polarity score in [-1, 1]: (positive - negative) hits over
/// total sentiment hits
fn polarity(text: &str) -> f64 {
    let mut positive = 0i64;
    let mut negative = 0i64;

    for word in text.split(|c: char| !c.is_alphanumeric()) {
        let word = word.to_ascii_lowercase();
        if POSITIVE_WORDS.contains(&word.as_str()) {
            positive += 1;
        } else if NEGATIVE_WORDS.contains(&word.as_str()) {
            negative += 1;
        }
    }

    let total = positive + negative;
    if total == 0 {
        0.0
    } else {
        (positive - negative) as f64 / total as f64
    }
}

/// Fraction of words that carry sentiment at all, a crude subjectivity
/// proxy
fn subjectivity(text: &str) -> f64 {
    let mut words = 0usize;
    let mut hits = 0usize;

    for word in text.split(|c: char| !c.is_alphanumeric()) {
        if word.is_empty() {
            continue;
        }
        words += 1;
        let word = word.to_ascii_lowercase();
        if POSITIVE_WORDS.contains(&word.as_str()) || NEGATIVE_WORDS.contains(&word.as_str()) {
            hits += 1;
        }
    }

    if words == 0 {
        0.0
    } else {
        hits as f64 / words as f64
    }
}

fn summarize(posts: &[SocialPost]) -> SentimentSummary {
    if posts.is_empty() {
        return SentimentSummary::neutral();
    }

    let count = posts.len() as f64;
    let avg_polarity = posts.iter().map(|p| p.polarity).sum::<f64>() / count;
    let avg_subjectivity = posts
        .iter()
        .map(|p| subjectivity(&format!("{} {}", p.title, p.body)))
        .sum::<f64>()
        / count;

    SentimentSummary {
        avg_post_polarity: avg_polarity,
        avg_post_subjectivity: avg_subjectivity,
        // Comments are not fetched through the public search endpoint
        avg_comment_polarity: 0.0,
        avg_comment_subjectivity: 0.0,
        post_count: posts.len(),
        comment_count: 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post(title: &str, score: i64) -> SocialPost {
        SocialPost {
            title: title.to_string(),
            score,
            created: Utc::now(),
            body: String::new(),
            polarity: polarity(title),
        }
    }

    #[test]
    fn test_polarity_positive_text() {
        assert!(polarity("strong rally, bullish gains") > 0.0);
    }

    #[test]
    fn test_polarity_negative_text() {
        assert!(polarity("bearish crash, big losses") < 0.0);
    }

    #[test]
    fn test_polarity_neutral_text() {
        assert_eq!(polarity("quarterly report published today"), 0.0);
        assert_eq!(polarity(""), 0.0);
    }

    #[test]
    fn test_summarize_empty_is_neutral() {
        assert_eq!(summarize(&[]), SentimentSummary::neutral());
    }

    #[test]
    fn test_summarize_averages_polarity() {
        let posts = vec![post("bullish rally", 10), post("bearish crash", 5)];
        let summary = summarize(&posts);
        assert_eq!(summary.post_count, 2);
        assert!((summary.avg_post_polarity - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_listing_parse() {
        let raw = r#"{
            "data": {
                "children": [
                    {"data": {"title": "AAPL to the moon", "score": 42, "created_utc": 1700000000.0, "selftext": ""}}
                ]
            }
        }"#;
        let listing: RedditListing = serde_json::from_str(raw).unwrap();
        assert_eq!(listing.data.children.len(), 1);
        assert_eq!(listing.data.children[0].data.score, 42);
    }
}
