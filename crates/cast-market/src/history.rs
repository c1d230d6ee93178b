//! Historical price data via Yahoo Finance

use crate::error::{MarketError, Result};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use yahoo_finance_api as yahoo;

/// One daily closing price observation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DailyPrice {
    /// Trading day
    pub date: NaiveDate,
    /// Closing price
    pub close: f64,
    /// Trading volume
    pub volume: u64,
}

/// Source of daily closing prices
///
/// `close_on` falls back to the nearest available trading day when the
/// exact date has no data (weekends, holidays); the returned
/// [`DailyPrice`] carries the date that was actually used.
#[async_trait]
pub trait PriceSource: Send + Sync {
    /// Daily closes for `symbol` between `start` and `end` (inclusive),
    /// in ascending date order
    async fn daily_closes(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DailyPrice>>;

    /// The close for `symbol` on `date`, or the nearest trading day
    async fn close_on(&self, symbol: &str, date: NaiveDate) -> Result<DailyPrice>;
}

/// Yahoo Finance price source
pub struct YahooFinanceClient {}

impl YahooFinanceClient {
    /// Create a new Yahoo Finance client
    pub fn new() -> Self {
        Self {}
    }

    fn to_offset(date: NaiveDate) -> Result<OffsetDateTime> {
        let ts = date.and_time(NaiveTime::MIN).and_utc().timestamp();
        OffsetDateTime::from_unix_timestamp(ts)
            .map_err(|e| MarketError::YahooFinanceError(format!("Invalid timestamp: {e}")))
    }
}

#[async_trait]
impl PriceSource for YahooFinanceClient {
    async fn daily_closes(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DailyPrice>> {
        let provider = yahoo::YahooConnector::new()
            .map_err(|e| MarketError::YahooFinanceError(e.to_string()))?;

        // Yahoo treats the end bound as exclusive; push it one day out
        let start_odt = Self::to_offset(start)?;
        let end_odt = Self::to_offset(end + chrono::Duration::days(1))?;

        let response = provider
            .get_quote_history(symbol, start_odt, end_odt)
            .await
            .map_err(|e| MarketError::YahooFinanceError(e.to_string()))?;

        let quotes = response
            .quotes()
            .map_err(|e| MarketError::YahooFinanceError(e.to_string()))?;

        let mut prices: Vec<DailyPrice> = quotes
            .iter()
            .map(|q| DailyPrice {
                date: DateTime::from_timestamp(q.timestamp as i64, 0)
                    .unwrap_or_else(Utc::now)
                    .date_naive(),
                close: q.close,
                volume: q.volume,
            })
            .filter(|p| p.date >= start && p.date <= end)
            .collect();

        prices.sort_by_key(|p| p.date);

        if prices.is_empty() {
            return Err(MarketError::DataUnavailable {
                symbol: symbol.to_string(),
                reason: format!("no price data between {start} and {end}"),
            });
        }

        Ok(prices)
    }

    async fn close_on(&self, symbol: &str, date: NaiveDate) -> Result<DailyPrice> {
        // Pull a small trailing window so a weekend or holiday target
        // still resolves to the nearest trading day
        let window_start = date - chrono::Duration::days(6);
        let prices = self.daily_closes(symbol, window_start, date).await?;

        prices
            .iter()
            .min_by_key(|p| (date - p.date).num_days().abs())
            .copied()
            .ok_or_else(|| MarketError::DataUnavailable {
                symbol: symbol.to_string(),
                reason: format!("no price data near {date}"),
            })
    }
}

impl Default for YahooFinanceClient {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for YahooFinanceClient {
    fn clone(&self) -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_daily_price_serde_round_trip() {
        let price = DailyPrice {
            date: "2025-06-02".parse().unwrap(),
            close: 201.7,
            volume: 1_000_000,
        };
        let json = serde_json::to_string(&price).unwrap();
        let back: DailyPrice = serde_json::from_str(&json).unwrap();
        assert_eq!(back, price);
    }

    #[tokio::test]
    #[ignore] // Requires network access
    async fn test_daily_closes() {
        let client = YahooFinanceClient::new();
        let end = Utc::now().date_naive() - chrono::Duration::days(2);
        let start = end - chrono::Duration::days(19);
        let prices = client.daily_closes("AAPL", start, end).await;
        assert!(prices.is_ok());

        let prices = prices.unwrap();
        assert!(!prices.is_empty());
        assert!(prices.windows(2).all(|w| w[0].date <= w[1].date));
        assert!(prices.iter().all(|p| p.close > 0.0));
    }

    #[tokio::test]
    #[ignore] // Requires network access
    async fn test_close_on_weekend_falls_back() {
        let client = YahooFinanceClient::new();
        // Any recent Sunday resolves to the preceding Friday
        let mut date = Utc::now().date_naive() - chrono::Duration::days(3);
        while date.format("%a").to_string() != "Sun" {
            date = date - chrono::Duration::days(1);
        }
        let price = client.close_on("AAPL", date).await.unwrap();
        assert!(price.date < date);
    }
}
