//! MySQL source adapter and batch sink.
//!
//! Five queries per run: today's conversations, yesterday's counts, today's
//! feedback, and the two leads counts. The three primary queries share one
//! pooled connection; leads run on their own connection and degrade to empty
//! counts when the leads table is missing or broken. The final insert is one
//! transaction over the whole batch.

use std::collections::HashMap;

use mysql_async::{params, prelude::*, Conn, Params, Pool, Row, TxOpts, Value};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::snapshot::aggregate::{ConversationRow, FeedbackRow};
use crate::snapshot::record::MetricRecord;
use crate::Result;

/// Build the connection pool from runtime configuration.
pub fn pool_from_config(config: &Config) -> Pool {
    Pool::new(config.mysql_url().as_str())
}

fn id_placeholders(ids: &[String]) -> String {
    ids.iter().map(|_| "?").collect::<Vec<_>>().join(",")
}

fn id_params(ids: &[String]) -> Vec<Value> {
    ids.iter().map(|id| id.clone().into()).collect()
}

/// Render a cell that may arrive as NULL, text, or a numeric id.
fn value_to_string(value: Value) -> Option<String> {
    match value {
        Value::NULL => None,
        Value::Bytes(bytes) => Some(String::from_utf8_lossy(&bytes).into_owned()),
        Value::Int(n) => Some(n.to_string()),
        Value::UInt(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Fetch today's conversation rows for the given chatbots.
pub async fn fetch_today_conversations(
    conn: &mut Conn,
    chatbot_ids: &[String],
) -> Result<Vec<ConversationRow>> {
    if chatbot_ids.is_empty() {
        return Ok(Vec::new());
    }

    let sql = format!(
        r#"
        SELECT chatbot_id, language_id, conversation_via
        FROM conversations
        WHERE chatbot_id IN ({})
          AND deleted_at IS NULL
          AND created_at >= CURDATE()
          AND created_at < CURDATE() + INTERVAL 1 DAY
        ORDER BY chatbot_id, created_at DESC
        "#,
        id_placeholders(chatbot_ids)
    );

    debug!("Executing today's conversations query");
    let rows: Vec<Row> = conn.exec(&sql, id_params(chatbot_ids)).await?;

    let conversations: Vec<ConversationRow> = rows
        .into_iter()
        .filter_map(|row| {
            let chatbot_id: String = row.get("chatbot_id")?;
            let language_id = row
                .get::<Value, _>("language_id")
                .and_then(value_to_string);
            let conversation_via = row
                .get::<Value, _>("conversation_via")
                .and_then(value_to_string);

            Some(ConversationRow {
                chatbot_id,
                language_id,
                conversation_via,
            })
        })
        .collect();

    info!("Retrieved {} today's conversations", conversations.len());
    Ok(conversations)
}

/// Fetch yesterday's conversation count per chatbot.
pub async fn fetch_yesterday_counts(
    conn: &mut Conn,
    chatbot_ids: &[String],
) -> Result<HashMap<String, i64>> {
    if chatbot_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let sql = format!(
        r#"
        SELECT chatbot_id, COUNT(*) AS yesterday_count
        FROM conversations
        WHERE chatbot_id IN ({})
          AND deleted_at IS NULL
          AND created_at >= CURDATE() - INTERVAL 1 DAY
          AND created_at < CURDATE()
        GROUP BY chatbot_id
        "#,
        id_placeholders(chatbot_ids)
    );

    debug!("Executing yesterday's count query");
    let rows: Vec<Row> = conn.exec(&sql, id_params(chatbot_ids)).await?;

    let counts: HashMap<String, i64> = rows
        .into_iter()
        .filter_map(|row| {
            let chatbot_id: String = row.get("chatbot_id")?;
            let count: i64 = row.get("yesterday_count")?;
            Some((chatbot_id, count))
        })
        .collect();

    info!("Retrieved yesterday counts for {} chatbots", counts.len());
    Ok(counts)
}

/// Fetch today's rated feedback with the channel resolved through the
/// conversation join.
pub async fn fetch_feedback(conn: &mut Conn, chatbot_ids: &[String]) -> Result<Vec<FeedbackRow>> {
    if chatbot_ids.is_empty() {
        return Ok(Vec::new());
    }

    let sql = format!(
        r#"
        SELECT
            f.chatbot_id,
            f.conversation_id,
            f.rating,
            f.feedback_text,
            COALESCE(c.conversation_via, 'WEB') AS channel
        FROM conversation_overall_feedback f
        LEFT JOIN conversations c ON f.conversation_id = c.id
        WHERE f.chatbot_id IN ({})
          AND f.deleted_at IS NULL
          AND f.rating IS NOT NULL
          AND f.created_at >= CURDATE()
          AND f.created_at < CURDATE() + INTERVAL 1 DAY
        ORDER BY f.chatbot_id, f.created_at DESC
        "#,
        id_placeholders(chatbot_ids)
    );

    debug!("Executing feedback query");
    let rows: Vec<Row> = conn.exec(&sql, id_params(chatbot_ids)).await?;

    let feedback: Vec<FeedbackRow> = rows
        .into_iter()
        .filter_map(|row| {
            let chatbot_id: String = row.get("chatbot_id")?;
            let conversation_id = row
                .get::<Value, _>("conversation_id")
                .and_then(value_to_string);
            let rating: Option<String> = row.get::<Value, _>("rating").and_then(value_to_string);
            let feedback_text = row
                .get::<Value, _>("feedback_text")
                .and_then(value_to_string);
            let channel = row.get::<Value, _>("channel").and_then(value_to_string);

            Some(FeedbackRow {
                chatbot_id,
                conversation_id,
                rating,
                feedback_text,
                channel,
            })
        })
        .collect();

    info!("Retrieved {} feedback records", feedback.len());
    Ok(feedback)
}

/// Fetch today/yesterday leads counts on an isolated connection.
///
/// Any failure here (missing table included) degrades to empty counts for
/// both windows rather than failing the run.
pub async fn fetch_leads_counts(
    pool: &Pool,
    chatbot_ids: &[String],
) -> (HashMap<String, i64>, HashMap<String, i64>) {
    if chatbot_ids.is_empty() {
        return (HashMap::new(), HashMap::new());
    }

    match try_fetch_leads_counts(pool, chatbot_ids).await {
        Ok(counts) => counts,
        Err(e) => {
            warn!("Leads source unavailable, defaulting to zero leads: {}", e);
            (HashMap::new(), HashMap::new())
        }
    }
}

async fn try_fetch_leads_counts(
    pool: &Pool,
    chatbot_ids: &[String],
) -> Result<(HashMap<String, i64>, HashMap<String, i64>)> {
    let mut conn = pool.get_conn().await?;

    let today = leads_window_counts(&mut conn, chatbot_ids, "created_at >= CURDATE() AND created_at < CURDATE() + INTERVAL 1 DAY").await?;
    let yesterday = leads_window_counts(&mut conn, chatbot_ids, "created_at >= CURDATE() - INTERVAL 1 DAY AND created_at < CURDATE()").await?;

    info!(
        "Retrieved leads counts for {} chatbots today, {} yesterday",
        today.len(),
        yesterday.len()
    );
    Ok((today, yesterday))
}

async fn leads_window_counts(
    conn: &mut Conn,
    chatbot_ids: &[String],
    window: &str,
) -> Result<HashMap<String, i64>> {
    let sql = format!(
        r#"
        SELECT chatbot_id, COUNT(*) AS lead_count
        FROM leads
        WHERE chatbot_id IN ({})
          AND {}
        GROUP BY chatbot_id
        "#,
        id_placeholders(chatbot_ids),
        window
    );

    let rows: Vec<Row> = conn.exec(&sql, id_params(chatbot_ids)).await?;

    Ok(rows
        .into_iter()
        .filter_map(|row| {
            let chatbot_id: String = row.get("chatbot_id")?;
            let count: i64 = row.get("lead_count")?;
            Some((chatbot_id, count))
        })
        .collect())
}

const INSERT_SQL: &str = r#"
    INSERT INTO chatbot_metrics (
        snapshot_time, chatbot_id, profile_url, active_status,
        total_coversation, coversation_diff, ai_resolved, ai_resolved_diff,
        human_resolved, human_resolved_diff, leads, leads_diff,
        ai_csat, human_csat, platform, ongoing_calls, in_queue,
        unresolved, feedback_total, feedback_pos, feedback_neg,
        feedback_avg, languages, fb_channel, trends, net_impact,
        name, created_at, bot_created_at, alerts, fb_geo,
        net_impact_graph, perform_by_geo
    ) VALUES (
        :snapshot_time, :chatbot_id, :profile_url, :active_status,
        :total_coversation, :coversation_diff, :ai_resolved, :ai_resolved_diff,
        :human_resolved, :human_resolved_diff, :leads, :leads_diff,
        :ai_csat, :human_csat, :platform, :ongoing_calls, :in_queue,
        :unresolved, :feedback_total, :feedback_pos, :feedback_neg,
        :feedback_avg, :languages, :fb_channel, :trends, :net_impact,
        :name, :created_at, :bot_created_at, :alerts, :fb_geo,
        :net_impact_graph, :perform_by_geo
    )
"#;

fn record_params(record: &MetricRecord) -> Result<Params> {
    Ok(params! {
        "snapshot_time" => &record.snapshot_time,
        "chatbot_id" => &record.chatbot_id,
        "profile_url" => &record.profile_url,
        "active_status" => record.active_status,
        "total_coversation" => record.total_conversation,
        "coversation_diff" => record.conversation_diff,
        "ai_resolved" => record.ai_resolved,
        "ai_resolved_diff" => record.ai_resolved_diff,
        "human_resolved" => record.human_resolved,
        "human_resolved_diff" => record.human_resolved_diff,
        "leads" => record.leads,
        "leads_diff" => record.leads_diff,
        "ai_csat" => record.ai_csat,
        "human_csat" => record.human_csat,
        "platform" => serde_json::to_string(&record.platform)?,
        "ongoing_calls" => record.ongoing_calls,
        "in_queue" => record.in_queue,
        "unresolved" => record.unresolved,
        "feedback_total" => record.feedback_total,
        "feedback_pos" => record.feedback_pos,
        "feedback_neg" => record.feedback_neg,
        "feedback_avg" => record.feedback_avg,
        "languages" => serde_json::to_string(&record.languages)?,
        "fb_channel" => serde_json::to_string(&record.fb_channel)?,
        "trends" => serde_json::to_string(&record.trends)?,
        "net_impact" => record.net_impact,
        "name" => &record.name,
        "created_at" => &record.created_at,
        "bot_created_at" => &record.bot_created_at,
        "alerts" => serde_json::to_string(&record.alerts)?,
        "fb_geo" => serde_json::to_string(&record.fb_geo)?,
        "net_impact_graph" => serde_json::to_string(&record.net_impact_graph)?,
        "perform_by_geo" => serde_json::to_string(&record.perform_by_geo)?,
    })
}

/// Persist the whole batch in one transaction; all rows or none.
pub async fn insert_metrics(conn: &mut Conn, records: &[MetricRecord]) -> Result<u64> {
    let batch: Vec<Params> = records
        .iter()
        .map(record_params)
        .collect::<Result<Vec<_>>>()?;

    info!("Batch inserting {} metrics records", batch.len());
    let mut tx = conn.start_transaction(TxOpts::default()).await?;

    match tx.exec_batch(INSERT_SQL, batch).await {
        Ok(()) => {
            tx.commit().await?;
            Ok(records.len() as u64)
        }
        Err(e) => {
            warn!("Batch insert failed, rolling back: {}", e);
            tx.rollback().await?;
            Err(e.into())
        }
    }
}
