//! Per-chatbot metric record construction.
//!
//! Pure merge of directory entries, lookup maps, aggregates, and enrichment
//! into the fixed record shape. Every field has a defined default, so this
//! step never fails on missing optional data.

use std::collections::HashMap;

use serde::Serialize;
use serde_json::Value;

use crate::api::{Chatbot, SettingsEntry};
use crate::snapshot::aggregate::{
    Aggregates, ChannelCount, ConversationStats, FeedbackStats, DEFAULT_CHANNEL, DEFAULT_LANGUAGE,
};
use crate::snapshot::enrichment::Enrichment;

/// Fallback display name when the directory record carries none.
const UNKNOWN_NAME: &str = "Unknown";

/// Number of source queries in a run: today conversations, yesterday counts,
/// feedback, today leads, yesterday leads.
pub const SOURCE_QUERIES_PER_RUN: u32 = 5;

/// One row of the `chatbot_metrics` table.
///
/// The serialized names `total_coversation` / `coversation_diff` keep the
/// historical misspelling; the existing table columns and downstream
/// consumers depend on it.
#[derive(Debug, Clone, Serialize)]
pub struct MetricRecord {
    pub snapshot_time: String,
    pub chatbot_id: String,
    pub profile_url: String,
    pub active_status: bool,
    #[serde(rename = "total_coversation")]
    pub total_conversation: i64,
    #[serde(rename = "coversation_diff")]
    pub conversation_diff: i64,
    pub ai_resolved: i64,
    pub ai_resolved_diff: i64,
    pub human_resolved: i64,
    pub human_resolved_diff: i64,
    pub leads: i64,
    pub leads_diff: i64,
    pub ai_csat: f64,
    pub human_csat: i64,
    pub platform: HashMap<String, i64>,
    pub ongoing_calls: i64,
    pub in_queue: i64,
    pub unresolved: i64,
    pub feedback_total: i64,
    pub feedback_pos: i64,
    pub feedback_neg: i64,
    pub feedback_avg: i64,
    pub languages: HashMap<String, i64>,
    pub alerts: Value,
    pub fb_geo: Value,
    pub fb_channel: Vec<ChannelCount>,
    pub trends: Value,
    pub net_impact: f64,
    pub net_impact_graph: Value,
    pub name: String,
    pub created_at: String,
    pub bot_created_at: String,
    pub perform_by_geo: Value,
}

/// Run-level metadata handed to the sink alongside the batch.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub total_chatbots: usize,
    pub snapshot_time: String,
    pub total_today_conversations: i64,
    pub total_yesterday_conversations: i64,
    pub total_feedback_records: i64,
    pub total_today_leads: i64,
    pub total_yesterday_leads: i64,
    pub database_queries_used: u32,
}

/// The full output of one run: records plus metadata.
#[derive(Debug, Clone, Serialize)]
pub struct SnapshotBatch {
    pub chatbot_metrics: Vec<MetricRecord>,
    pub metadata: RunSummary,
}

/// Build one record per directory chatbot, in directory order.
pub fn build_records(
    chatbots: &[Chatbot],
    settings: &HashMap<String, SettingsEntry>,
    aggregates: &Aggregates,
    snapshot_time: &str,
    enrichment: &Enrichment,
) -> Vec<MetricRecord> {
    chatbots
        .iter()
        .map(|chatbot| build_record(chatbot, settings, aggregates, snapshot_time, enrichment))
        .collect()
}

/// Merge one chatbot with its aggregates and lookups into a record.
pub fn build_record(
    chatbot: &Chatbot,
    settings: &HashMap<String, SettingsEntry>,
    aggregates: &Aggregates,
    snapshot_time: &str,
    enrichment: &Enrichment,
) -> MetricRecord {
    let name = chatbot
        .name
        .clone()
        .unwrap_or_else(|| UNKNOWN_NAME.to_string());
    let bot_created_at = chatbot
        .created_at
        .clone()
        .unwrap_or_else(|| snapshot_time.to_string());

    let profile_url = chatbot
        .settings_id
        .as_ref()
        .and_then(|id| settings.get(id))
        .and_then(|entry| entry.profile_image_url.clone())
        .unwrap_or_default();

    let empty_conversations = ConversationStats::default();
    let today = aggregates
        .today
        .get(&chatbot.id)
        .unwrap_or(&empty_conversations);
    let yesterday_count = aggregates
        .yesterday_counts
        .get(&chatbot.id)
        .copied()
        .unwrap_or(0);
    let conversation_diff = today.count - yesterday_count;

    let leads = aggregates.leads_today.get(&chatbot.id).copied().unwrap_or(0);
    let leads_yesterday = aggregates
        .leads_yesterday
        .get(&chatbot.id)
        .copied()
        .unwrap_or(0);

    let empty_feedback = FeedbackStats::default();
    let feedback = aggregates
        .feedback
        .get(&chatbot.id)
        .unwrap_or(&empty_feedback);
    let ai_csat = csat_percentage(feedback.positive, feedback.total);

    MetricRecord {
        snapshot_time: snapshot_time.to_string(),
        chatbot_id: chatbot.id.clone(),
        profile_url,
        active_status: true,
        total_conversation: today.count,
        conversation_diff,
        // No AI/human split exists in the source data: every conversation
        // counts as AI-resolved, the human columns stay zero.
        ai_resolved: today.count,
        ai_resolved_diff: conversation_diff,
        human_resolved: 0,
        human_resolved_diff: 0,
        leads,
        leads_diff: leads - leads_yesterday,
        ai_csat,
        human_csat: 0,
        platform: placeholder_if_empty(&today.platforms, DEFAULT_CHANNEL),
        ongoing_calls: 0,
        in_queue: 0,
        unresolved: 0,
        feedback_total: feedback.total,
        feedback_pos: feedback.positive,
        feedback_neg: feedback.negative,
        feedback_avg: feedback.average,
        languages: placeholder_if_empty(&today.languages, DEFAULT_LANGUAGE),
        alerts: enrichment.alerts.clone(),
        fb_geo: enrichment.fb_geo.clone(),
        fb_channel: feedback.channels.clone(),
        trends: enrichment.trends.clone(),
        net_impact: enrichment.net_impact.efficiency_gain,
        net_impact_graph: enrichment.net_impact_graph.clone(),
        name,
        created_at: snapshot_time.to_string(),
        bot_created_at,
        perform_by_geo: enrichment.perform_by_geo.clone(),
    }
}

/// `round(pos / total * 100, 2)`, 0 when there is no feedback.
fn csat_percentage(positive: i64, total: i64) -> f64 {
    if total > 0 {
        (positive as f64 / total as f64 * 100.0 * 100.0).round() / 100.0
    } else {
        0.0
    }
}

/// A silent chatbot still gets a single-entry zero histogram so the
/// dashboard has a category to render.
fn placeholder_if_empty(histogram: &HashMap<String, i64>, default_key: &str) -> HashMap<String, i64> {
    if histogram.is_empty() {
        HashMap::from([(default_key.to_string(), 0)])
    } else {
        histogram.clone()
    }
}

/// Run-level totals over the produced batch.
pub fn summarize(
    chatbots: &[Chatbot],
    records: &[MetricRecord],
    aggregates: &Aggregates,
    snapshot_time: &str,
) -> RunSummary {
    let total_yesterday_conversations = chatbots
        .iter()
        .map(|c| aggregates.yesterday_counts.get(&c.id).copied().unwrap_or(0))
        .sum();
    let total_yesterday_leads = chatbots
        .iter()
        .map(|c| aggregates.leads_yesterday.get(&c.id).copied().unwrap_or(0))
        .sum();

    RunSummary {
        total_chatbots: chatbots.len(),
        snapshot_time: snapshot_time.to_string(),
        total_today_conversations: records.iter().map(|r| r.total_conversation).sum(),
        total_yesterday_conversations,
        total_feedback_records: records.iter().map(|r| r.feedback_total).sum(),
        total_today_leads: records.iter().map(|r| r.leads).sum(),
        total_yesterday_leads,
        database_queries_used: SOURCE_QUERIES_PER_RUN,
    }
}
