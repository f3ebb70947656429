use crate::inputs::{Article, PriceQuote, SentimentScore};
use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;

/// Collects the day's news articles for the tracked equity.
#[async_trait]
pub trait ArticleSource: Send + Sync {
    async fn fetch_articles(&self, date: NaiveDate) -> Result<Vec<Article>>;
}

/// Scores a single headline into negative/neutral/positive probabilities.
#[async_trait]
pub trait SentimentScorer: Send + Sync {
    async fn score(&self, headline: &str) -> Result<SentimentScore>;
}

/// Fetches the OHLCV quote for a date, or the all-missing marker.
#[async_trait]
pub trait PriceSource: Send + Sync {
    async fn fetch_quote(&self, date: NaiveDate) -> Result<PriceQuote>;
}
