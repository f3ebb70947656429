//! File-backed collaborators.
//!
//! They stand in for a news scraper, a sentiment model and a market data
//! feed, reading pre-collected CSV files instead.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use sentistock_core::{
    is_weekend, Article, ArticleSource, PriceQuote, PriceSource, SentimentScore, SentimentScorer,
};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Articles from a `date,headline` CSV file.
pub struct CsvArticleSource {
    path: PathBuf,
}

impl CsvArticleSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl ArticleSource for CsvArticleSource {
    async fn fetch_articles(&self, date: NaiveDate) -> Result<Vec<Article>> {
        let mut reader = csv::Reader::from_path(&self.path)
            .with_context(|| format!("Failed to open articles file {}", self.path.display()))?;
        let mut articles = Vec::new();
        for result in reader.deserialize::<Article>() {
            let article = result.with_context(|| format!("Malformed row in {}", self.path.display()))?;
            if article.date == date {
                articles.push(article);
            }
        }
        debug!(%date, count = articles.len(), "Loaded articles");
        Ok(articles)
    }
}

#[derive(Deserialize)]
struct ScoreRow {
    headline: String,
    negative: f64,
    neutral: f64,
    positive: f64,
}

/// Precomputed headline scores from a `headline,negative,neutral,positive`
/// CSV file.
pub struct CsvScoreLookup {
    scores: HashMap<String, SentimentScore>,
}

impl CsvScoreLookup {
    /// Reads every score into memory.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, a row is malformed, or
    /// a score's probabilities do not form a distribution.
    pub fn from_path(path: &Path) -> Result<Self> {
        let mut reader = csv::Reader::from_path(path)
            .with_context(|| format!("Failed to open scores file {}", path.display()))?;
        let mut scores = HashMap::new();
        for result in reader.deserialize::<ScoreRow>() {
            let row = result.with_context(|| format!("Malformed row in {}", path.display()))?;
            let score = SentimentScore::new(row.negative, row.neutral, row.positive);
            if !score.is_valid() {
                anyhow::bail!("Invalid sentiment score for headline '{}': {score:?}", row.headline);
            }
            scores.insert(row.headline.trim().to_string(), score);
        }
        Ok(Self { scores })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.scores.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }
}

#[async_trait]
impl SentimentScorer for CsvScoreLookup {
    async fn score(&self, headline: &str) -> Result<SentimentScore> {
        self.scores
            .get(headline.trim())
            .copied()
            .ok_or_else(|| anyhow::anyhow!("No sentiment score for headline '{headline}'"))
    }
}

#[derive(Deserialize)]
struct PriceRow {
    date: NaiveDate,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: f64,
}

/// Daily quotes from a `date,open,high,low,close,volume` CSV file.
///
/// Weekends and dates absent from the file (market holidays) yield the
/// all-missing quote.
pub struct CsvPriceSource {
    path: PathBuf,
}

impl CsvPriceSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl PriceSource for CsvPriceSource {
    async fn fetch_quote(&self, date: NaiveDate) -> Result<PriceQuote> {
        if is_weekend(date) {
            return Ok(PriceQuote::missing(date));
        }
        let mut reader = csv::Reader::from_path(&self.path)
            .with_context(|| format!("Failed to open prices file {}", self.path.display()))?;
        for result in reader.deserialize::<PriceRow>() {
            let row = result.with_context(|| format!("Malformed row in {}", self.path.display()))?;
            if row.date == date {
                return Ok(PriceQuote::new(row.date, row.open, row.high, row.low, row.close, row.volume));
            }
        }
        debug!(%date, "No quote on file; treating as a market holiday");
        Ok(PriceQuote::missing(date))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn d(day: u32) -> NaiveDate {
        // 2025-05-05 is a Monday
        NaiveDate::from_ymd_opt(2025, 5, day).unwrap()
    }

    #[tokio::test]
    async fn articles_are_filtered_by_date() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("articles.csv");
        fs::write(
            &path,
            "date,headline\n2025-05-05,Chip demand surges\n2025-05-06,Guidance cut\n2025-05-05,\"Earnings beat, shares rally\"\n",
        )
        .unwrap();

        let source = CsvArticleSource::new(&path);
        let articles = source.fetch_articles(d(5)).await.unwrap();
        assert_eq!(articles.len(), 2);
        assert_eq!(articles[1].headline, "Earnings beat, shares rally");
        assert!(source.fetch_articles(d(9)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn scores_are_looked_up_by_trimmed_headline() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("scores.csv");
        fs::write(
            &path,
            "headline,negative,neutral,positive\nChip demand surges,0.1,0.2,0.7\n",
        )
        .unwrap();

        let lookup = CsvScoreLookup::from_path(&path).unwrap();
        assert_eq!(lookup.len(), 1);
        let score = lookup.score(" Chip demand surges ").await.unwrap();
        assert!((score.positive - 0.7).abs() < 1e-12);
        assert!(lookup.score("Unknown").await.is_err());
    }

    #[test]
    fn invalid_score_distribution_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("scores.csv");
        fs::write(&path, "headline,negative,neutral,positive\nBad,0.5,0.5,0.5\n").unwrap();
        assert!(CsvScoreLookup::from_path(&path).is_err());
    }

    #[tokio::test]
    async fn prices_mark_weekends_and_holidays_missing() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("prices.csv");
        fs::write(
            &path,
            "date,open,high,low,close,volume\n2025-05-05,10,11,9,10.5,1000\n",
        )
        .unwrap();

        let source = CsvPriceSource::new(&path);
        let quote = source.fetch_quote(d(5)).await.unwrap();
        assert!((quote.close - 10.5).abs() < 1e-12);
        // Tuesday with no row
        assert!(source.fetch_quote(d(6)).await.unwrap().is_missing());
        // Saturday
        assert!(source.fetch_quote(d(10)).await.unwrap().is_missing());
    }
}
