//! Shared configuration, schema, and collaborator traits for the sentiment
//! stock pipeline.

pub mod config;
pub mod config_loader;
pub mod inputs;
pub mod model_spec;
pub mod schema;
pub mod traits;

pub use config::{AppConfig, ExperimentConfig, ScheduleConfig, SourcesConfig, StorageConfig};
pub use config_loader::{ConfigLoader, DEFAULT_CONFIG_PATH};
pub use inputs::{is_weekend, Article, PriceQuote, SentimentScore};
pub use model_spec::{GridEntry, ModelKind, ModelParams};
pub use schema::FeatureColumn;
pub use traits::{ArticleSource, PriceSource, SentimentScorer};
