//! Daily per-chatbot analytics snapshot generator
//!
//! This library provides tools to:
//! - Fetch chatbot, settings, and language records from the config store API
//! - Pull conversation, feedback, and leads rows from MySQL for the daily window
//! - Fold raw rows into per-chatbot aggregates (counts, histograms, sentiment)
//! - Build one normalized metric record per chatbot with derived fields
//! - Persist the batch into the `chatbot_metrics` table in one transaction

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod snapshot;

// Re-export common types
pub use api::{Chatbot, ConfigStoreClient, LanguageEntry, SettingsEntry};
pub use config::Config;
pub use error::{Error, Result};
pub use snapshot::{Enrichment, MetricRecord, RunSummary, SnapshotBatch};
