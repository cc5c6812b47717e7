//! Fold raw conversation, feedback, and leads rows into per-chatbot
//! aggregates keyed by chatbot id.
//!
//! The aggregates are independent of the final record shape; consumers do
//! point lookups by chatbot id, never iterate map order. A chatbot absent
//! from every map is the normal case for a new or inactive bot and yields
//! all-default values downstream.

use std::collections::HashMap;

use serde::Serialize;
use tracing::info;

/// Language name used when a conversation has no resolvable language id.
pub const DEFAULT_LANGUAGE: &str = "English";

/// Channel used when a conversation or feedback row carries no channel tag.
pub const DEFAULT_CHANNEL: &str = "WEB";

/// One raw conversation row from the today window.
#[derive(Debug, Clone)]
pub struct ConversationRow {
    pub chatbot_id: String,
    pub language_id: Option<String>,
    pub conversation_via: Option<String>,
}

/// One raw feedback row from the today window, with the channel already
/// resolved through the conversation join.
#[derive(Debug, Clone)]
pub struct FeedbackRow {
    pub chatbot_id: String,
    pub conversation_id: Option<String>,
    pub rating: Option<String>,
    pub feedback_text: Option<String>,
    pub channel: Option<String>,
}

/// Per-chatbot conversation aggregates for the today window.
#[derive(Debug, Clone, Default)]
pub struct ConversationStats {
    pub count: i64,
    pub languages: HashMap<String, i64>,
    pub platforms: HashMap<String, i64>,
}

/// Lowercased channel histogram entry, emitted in first-seen order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChannelCount {
    pub channel: String,
    pub count: i64,
}

/// Per-chatbot feedback aggregates.
#[derive(Debug, Clone, Default)]
pub struct FeedbackStats {
    pub total: i64,
    pub positive: i64,
    pub negative: i64,
    pub average: i64,
    pub channels: Vec<ChannelCount>,
}

/// The rating vocabulary is closed: three known values, matched
/// case-insensitively, everything else counts only toward the total.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rating {
    Positive,
    Negative,
    Average,
    Other,
}

pub fn classify_rating(rating: Option<&str>) -> Rating {
    match rating.map(|r| r.to_lowercase()).as_deref() {
        Some("love it") => Rating::Positive,
        Some("bad") => Rating::Negative,
        Some("decent") => Rating::Average,
        _ => Rating::Other,
    }
}

/// All keyed aggregates for one run.
#[derive(Debug, Clone, Default)]
pub struct Aggregates {
    pub today: HashMap<String, ConversationStats>,
    pub yesterday_counts: HashMap<String, i64>,
    pub feedback: HashMap<String, FeedbackStats>,
    pub leads_today: HashMap<String, i64>,
    pub leads_yesterday: HashMap<String, i64>,
}

/// Fold all raw collections into the per-chatbot aggregate bundle.
pub fn aggregate(
    today_rows: &[ConversationRow],
    yesterday_counts: HashMap<String, i64>,
    feedback_rows: &[FeedbackRow],
    leads_today: HashMap<String, i64>,
    leads_yesterday: HashMap<String, i64>,
    language_map: &HashMap<String, String>,
) -> Aggregates {
    let today = aggregate_conversations(today_rows, language_map);
    let feedback = aggregate_feedback(feedback_rows);

    info!(
        "Aggregated {} conversation rows into {} chatbots, {} feedback rows into {} chatbots",
        today_rows.len(),
        today.len(),
        feedback_rows.len(),
        feedback.len()
    );

    Aggregates {
        today,
        yesterday_counts,
        feedback,
        leads_today,
        leads_yesterday,
    }
}

/// Group today's conversation rows: count, language histogram, channel
/// histogram per chatbot.
pub fn aggregate_conversations(
    rows: &[ConversationRow],
    language_map: &HashMap<String, String>,
) -> HashMap<String, ConversationStats> {
    let mut stats: HashMap<String, ConversationStats> = HashMap::new();

    for row in rows {
        let entry = stats.entry(row.chatbot_id.clone()).or_default();
        entry.count += 1;

        let language = row
            .language_id
            .as_deref()
            .filter(|id| !id.is_empty())
            .and_then(|id| language_map.get(id))
            .map(String::as_str)
            .unwrap_or(DEFAULT_LANGUAGE);
        *entry.languages.entry(language.to_string()).or_insert(0) += 1;

        let platform = match row.conversation_via.as_deref() {
            Some(via) if !via.is_empty() => via.to_uppercase(),
            _ => DEFAULT_CHANNEL.to_string(),
        };
        *entry.platforms.entry(platform).or_insert(0) += 1;
    }

    stats
}

/// Group feedback rows: sentiment counts and a first-seen-ordered channel
/// histogram per chatbot.
pub fn aggregate_feedback(rows: &[FeedbackRow]) -> HashMap<String, FeedbackStats> {
    let mut stats: HashMap<String, FeedbackStats> = HashMap::new();

    for row in rows {
        let entry = stats.entry(row.chatbot_id.clone()).or_default();
        entry.total += 1;

        match classify_rating(row.rating.as_deref()) {
            Rating::Positive => entry.positive += 1,
            Rating::Negative => entry.negative += 1,
            Rating::Average => entry.average += 1,
            Rating::Other => {}
        }

        let channel = match row.channel.as_deref() {
            Some(ch) if !ch.is_empty() => ch.to_lowercase(),
            _ => DEFAULT_CHANNEL.to_lowercase(),
        };
        match entry.channels.iter_mut().find(|c| c.channel == channel) {
            Some(existing) => existing.count += 1,
            None => entry.channels.push(ChannelCount { channel, count: 1 }),
        }
    }

    stats
}
