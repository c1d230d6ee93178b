//! Configuration for market data clients

use crate::error::{MarketError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

const DEFAULT_USER_AGENT: &str = "pricecast/0.1";

/// Configuration for market data clients and the pipeline step cache
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketConfig {
    /// TTL for cached pipeline step data
    pub cache_ttl: Duration,

    /// Request timeout duration
    pub request_timeout: Duration,

    /// Finnhub API key (news is skipped without one)
    pub finnhub_api_key: Option<String>,

    /// Finnhub requests per minute (free tier: 60)
    pub finnhub_rate_limit: u32,

    /// User agent sent with Reddit requests
    pub reddit_user_agent: String,
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            // Step data stays valid across pipeline steps for 15 minutes
            cache_ttl: Duration::from_secs(900),
            request_timeout: Duration::from_secs(30),
            finnhub_api_key: None,
            finnhub_rate_limit: 60,
            reddit_user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl MarketConfig {
    /// Create a new configuration builder
    pub fn builder() -> MarketConfigBuilder {
        MarketConfigBuilder::default()
    }

    /// Load API keys and the Reddit user agent from the environment
    /// (`FINNHUB_API_KEY`, `REDDIT_USER_AGENT`)
    pub fn with_env(mut self) -> Self {
        if let Ok(key) = std::env::var("FINNHUB_API_KEY") {
            self.finnhub_api_key = Some(key);
        }
        if let Ok(agent) = std::env::var("REDDIT_USER_AGENT") {
            self.reddit_user_agent = agent;
        }
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.finnhub_rate_limit == 0 {
            return Err(MarketError::ConfigError(
                "finnhub_rate_limit must be greater than 0".to_string(),
            ));
        }

        if self.cache_ttl.is_zero() {
            return Err(MarketError::ConfigError(
                "cache_ttl must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

/// Builder for MarketConfig
#[derive(Debug, Default)]
pub struct MarketConfigBuilder {
    cache_ttl: Option<Duration>,
    request_timeout: Option<Duration>,
    finnhub_api_key: Option<String>,
    finnhub_rate_limit: Option<u32>,
    reddit_user_agent: Option<String>,
}

impl MarketConfigBuilder {
    /// Set the step cache TTL
    pub fn cache_ttl(mut self, duration: Duration) -> Self {
        self.cache_ttl = Some(duration);
        self
    }

    /// Set the request timeout
    pub fn request_timeout(mut self, duration: Duration) -> Self {
        self.request_timeout = Some(duration);
        self
    }

    /// Set the Finnhub API key
    pub fn finnhub_api_key(mut self, key: impl Into<String>) -> Self {
        self.finnhub_api_key = Some(key.into());
        self
    }

    /// Set the Finnhub rate limit (requests per minute)
    pub fn finnhub_rate_limit(mut self, limit: u32) -> Self {
        self.finnhub_rate_limit = Some(limit);
        self
    }

    /// Set the Reddit user agent
    pub fn reddit_user_agent(mut self, agent: impl Into<String>) -> Self {
        self.reddit_user_agent = Some(agent.into());
        self
    }

    /// Load keys from the environment
    pub fn with_env(mut self) -> Self {
        if let Ok(key) = std::env::var("FINNHUB_API_KEY") {
            self.finnhub_api_key = Some(key);
        }
        if let Ok(agent) = std::env::var("REDDIT_USER_AGENT") {
            self.reddit_user_agent = Some(agent);
        }
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<MarketConfig> {
        let defaults = MarketConfig::default();

        let config = MarketConfig {
            cache_ttl: self.cache_ttl.unwrap_or(defaults.cache_ttl),
            request_timeout: self.request_timeout.unwrap_or(defaults.request_timeout),
            finnhub_api_key: self.finnhub_api_key,
            finnhub_rate_limit: self.finnhub_rate_limit.unwrap_or(defaults.finnhub_rate_limit),
            reddit_user_agent: self.reddit_user_agent.unwrap_or(defaults.reddit_user_agent),
        };

        config.validate()?;
        Ok(config)
    }
}
