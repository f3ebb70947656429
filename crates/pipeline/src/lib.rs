//! Daily orchestration: collect, normalize, merge, persist, train, predict.

pub mod cycle;
pub mod scheduler;
pub mod sources;
pub mod status;
pub mod update;

pub use cycle::{CycleSummary, DailyCycle};
pub use scheduler::DailyScheduler;
pub use sources::{CsvArticleSource, CsvPriceSource, CsvScoreLookup};
pub use status::{ArtifactStatus, StoreStatus};
pub use update::{DailyUpdate, UpdateSummary};
