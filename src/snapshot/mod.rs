//! Daily snapshot pipeline
//!
//! Provides:
//! - Lookup map construction (settings, languages)
//! - Per-chatbot aggregation of conversation/feedback/leads rows
//! - Metric record building with derived fields
//! - The run orchestration: fetch, assemble, persist

pub mod aggregate;
pub mod enrichment;
pub mod lookups;
pub mod record;

pub use aggregate::{Aggregates, ChannelCount, ConversationRow, FeedbackRow};
pub use enrichment::Enrichment;
pub use record::{MetricRecord, RunSummary, SnapshotBatch};

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Instant;

use chrono::Local;
use tokio::fs;
use tracing::{info, warn};

use crate::api::{Chatbot, ConfigStoreClient, LanguageEntry, SettingsEntry};
use crate::config::Config;
use crate::{db, Error, Result};

/// What to do with the assembled batch.
#[derive(Debug, Clone)]
pub enum RunMode {
    /// Insert into the `chatbot_metrics` table (the normal path).
    Insert,
    /// Emit the batch as JSON to stdout or a file instead of inserting.
    DryRun { output: Option<PathBuf> },
}

/// Everything a run reads from its sources, in raw form.
#[derive(Debug, Default)]
pub struct SourceData {
    pub chatbots: Vec<Chatbot>,
    pub settings: Vec<SettingsEntry>,
    pub languages: Vec<LanguageEntry>,
    pub today_conversations: Vec<ConversationRow>,
    pub yesterday_counts: HashMap<String, i64>,
    pub feedback: Vec<FeedbackRow>,
    pub leads_today: HashMap<String, i64>,
    pub leads_yesterday: HashMap<String, i64>,
}

/// Pure core of the run: lookups, aggregation, record building, summary.
///
/// Fails only on an empty chatbot directory; every other missing input
/// degrades to documented defaults.
pub fn assemble(data: SourceData, snapshot_time: &str, enrichment: &Enrichment) -> Result<SnapshotBatch> {
    if data.chatbots.is_empty() {
        return Err(Error::EmptyDirectory);
    }

    let settings = lookups::settings_map(&data.settings);
    let languages = lookups::language_map(&data.languages);

    let aggregates = aggregate::aggregate(
        &data.today_conversations,
        data.yesterday_counts,
        &data.feedback,
        data.leads_today,
        data.leads_yesterday,
        &languages,
    );

    let records = record::build_records(
        &data.chatbots,
        &settings,
        &aggregates,
        snapshot_time,
        enrichment,
    );
    let metadata = record::summarize(&data.chatbots, &records, &aggregates, snapshot_time);

    Ok(SnapshotBatch {
        chatbot_metrics: records,
        metadata,
    })
}

/// Execute one full snapshot run against the configured sources.
pub async fn run(config: &Config, mode: RunMode) -> Result<RunSummary> {
    let snapshot_time = Local::now().format("%Y-%m-%d %H:%M:%S%.3f").to_string();
    info!("Starting chatbot metrics snapshot at {}", snapshot_time);

    info!("Step 1/5: Fetching data from the config store");
    let client = ConfigStoreClient::from_config(config)?;
    let chatbots = client.fetch_chatbots().await;
    if chatbots.is_empty() {
        return Err(Error::EmptyDirectory);
    }
    let settings = client.fetch_settings().await;
    let languages = client.fetch_languages().await;

    let chatbot_ids: Vec<String> = chatbots
        .iter()
        .map(|c| c.id.clone())
        .filter(|id| !id.is_empty())
        .collect();
    info!("Extracted {} valid chatbot IDs", chatbot_ids.len());

    info!("Step 2/5: Connecting to database");
    let pool = db::pool_from_config(config);
    let mut conn = pool.get_conn().await?;

    info!("Step 3/5: Fetching conversation, feedback, and leads data");
    let today_conversations = db::fetch_today_conversations(&mut conn, &chatbot_ids).await?;
    let yesterday_counts = db::fetch_yesterday_counts(&mut conn, &chatbot_ids).await?;
    let feedback = db::fetch_feedback(&mut conn, &chatbot_ids).await?;
    // Leads live on their own connection so a missing leads table cannot
    // poison the primary query path.
    let (leads_today, leads_yesterday) = db::fetch_leads_counts(&pool, &chatbot_ids).await;

    info!("Step 4/5: Generating data records");
    let batch = assemble(
        SourceData {
            chatbots,
            settings,
            languages,
            today_conversations,
            yesterday_counts,
            feedback,
            leads_today,
            leads_yesterday,
        },
        &snapshot_time,
        &Enrichment::placeholder(),
    )?;

    match &mode {
        RunMode::Insert => {
            info!("Step 5/5: Inserting metrics data into database");
            let started = Instant::now();
            let inserted = db::insert_metrics(&mut conn, &batch.chatbot_metrics).await?;
            info!(
                "Inserted {} metrics records in {:.2} seconds",
                inserted,
                started.elapsed().as_secs_f64()
            );
        }
        RunMode::DryRun { output } => {
            info!("Step 5/5: Dry run, emitting batch as JSON");
            let json = serde_json::to_string_pretty(&batch)?;
            match output {
                Some(path) => {
                    fs::write(path, &json).await?;
                    info!("Saved batch to {}", path.display());
                }
                None => println!("{}", json),
            }
        }
    }

    drop(conn);
    if let Err(e) = pool.disconnect().await {
        warn!("Failed to close connection pool cleanly: {}", e);
    }

    log_summary(&batch.metadata);
    Ok(batch.metadata)
}

fn log_summary(summary: &RunSummary) {
    info!("Execution summary:");
    info!("  Total chatbots processed: {}", summary.total_chatbots);
    info!("  Snapshot time: {}", summary.snapshot_time);
    info!("  Database queries used: {}", summary.database_queries_used);
    info!(
        "  Total today conversations: {}",
        summary.total_today_conversations
    );
    info!(
        "  Total yesterday conversations: {}",
        summary.total_yesterday_conversations
    );
    info!("  Total feedback records: {}", summary.total_feedback_records);
    info!("  Total today leads: {}", summary.total_today_leads);
    info!("  Total yesterday leads: {}", summary.total_yesterday_leads);
}
