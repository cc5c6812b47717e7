//! Config store API client (chatbots, settings, languages).
//!
//! All three endpoints are read-only lookups against the configuration
//! service. Settings and language fetch failures degrade to empty lists so
//! that a run can still proceed with defaults; only an empty chatbot
//! directory is fatal, and that is decided by the pipeline, not here.

use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::{Error, Result};

/// Chatbot record from the directory endpoint.
///
/// Unknown fields are ignored; a missing id deserializes to an empty string
/// and is excluded from the database id set, but the record still produces a
/// metrics row.
#[derive(Debug, Clone, Deserialize)]
pub struct Chatbot {
    #[serde(default)]
    pub id: String,
    pub name: Option<String>,
    pub settings_id: Option<String>,
    pub created_at: Option<String>,
}

/// Settings lookup entry.
#[derive(Debug, Clone, Deserialize)]
pub struct SettingsEntry {
    pub id: Option<String>,
    pub profile_image_url: Option<String>,
}

/// Language lookup entry. Upstream sends ids as either numbers or strings.
#[derive(Debug, Clone, Deserialize)]
pub struct LanguageEntry {
    #[serde(default, deserialize_with = "deserialize_string_or_number")]
    pub id: Option<String>,
    pub name: Option<String>,
}

/// Deserialize a value that can be either a string or a number
fn deserialize_string_or_number<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Error;
    let value: Option<serde_json::Value> = Option::deserialize(deserializer)?;
    match value {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(serde_json::Value::String(s)) => Ok(Some(s)),
        Some(serde_json::Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(D::Error::custom(format!(
            "expected string or number, got {:?}",
            other
        ))),
    }
}

#[derive(Debug, Deserialize)]
struct ChatbotsResponse {
    data: Option<Vec<Chatbot>>,
}

/// The list endpoints answer with a bare array, a `{"data": [...]}` envelope,
/// or a single object depending on the deployment.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ListEnvelope<T> {
    Wrapped { data: Vec<T> },
    Bare(Vec<T>),
    Single(T),
}

impl<T> ListEnvelope<T> {
    fn into_vec(self) -> Vec<T> {
        match self {
            ListEnvelope::Wrapped { data } => data,
            ListEnvelope::Bare(items) => items,
            ListEnvelope::Single(item) => vec![item],
        }
    }
}

#[derive(Debug, Clone)]
pub struct ConfigStoreClient {
    http: Client,
    api_key: String,
    base_url: String,
    account_ids: Vec<String>,
}

impl ConfigStoreClient {
    /// Create client from runtime configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::with_base_url(config, config.base_url.clone())
    }

    /// Create client with custom base url (primarily for tests).
    pub fn with_base_url<S: Into<String>>(config: &Config, base_url: S) -> Result<Self> {
        let http = Client::builder()
            .user_agent(format!("chatbot_metrics/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::ApiError(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            api_key: config.api_key.clone(),
            base_url: base_url.into(),
            account_ids: config.account_ids.clone(),
        })
    }

    async fn get_text(&self, url: &str) -> Result<String> {
        let response = self
            .http
            .get(url)
            .header("Content-Type", "application/json")
            .header("x-api-key", &self.api_key)
            .send()
            .await
            .map_err(|e| Error::ApiError(format!("Request to {} failed: {}", url, e)))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| Error::ApiError(format!("Failed to read response from {}: {}", url, e)))?;

        if status != StatusCode::OK {
            return Err(Error::ApiError(format!(
                "{} returned HTTP {}: {}",
                url,
                status.as_u16(),
                text
            )));
        }

        Ok(text)
    }

    /// Fetch the chatbot directory across all configured accounts.
    ///
    /// A failing account is logged and skipped; the combined list is returned
    /// as-is, possibly empty.
    pub async fn fetch_chatbots(&self) -> Vec<Chatbot> {
        info!("Fetching chatbots for {} accounts", self.account_ids.len());
        let mut chatbots = Vec::new();

        for account_id in &self.account_ids {
            debug!("Fetching chatbots for account: {}", account_id);
            let url = format!("{}/chatbots/query/account_id/{}", self.base_url, account_id);

            match self.get_text(&url).await {
                Ok(text) => match serde_json::from_str::<ChatbotsResponse>(&text) {
                    Ok(ChatbotsResponse { data: Some(batch) }) => {
                        info!("Retrieved {} chatbots for account {}", batch.len(), account_id);
                        chatbots.extend(batch);
                    }
                    Ok(ChatbotsResponse { data: None }) => {
                        warn!("No 'data' field in response for account {}", account_id);
                    }
                    Err(e) => {
                        warn!("Malformed chatbots response for account {}: {}", account_id, e);
                    }
                },
                Err(e) => {
                    warn!("Failed to fetch chatbots for account {}: {}", account_id, e);
                }
            }
        }

        info!("Total chatbots fetched: {}", chatbots.len());
        chatbots
    }

    /// Fetch the settings lookup table. Failures degrade to an empty list.
    pub async fn fetch_settings(&self) -> Vec<SettingsEntry> {
        self.fetch_list("settings").await
    }

    /// Fetch the language lookup table. Failures degrade to an empty list.
    pub async fn fetch_languages(&self) -> Vec<LanguageEntry> {
        self.fetch_list("languages").await
    }

    async fn fetch_list<T: for<'de> Deserialize<'de>>(&self, resource: &str) -> Vec<T> {
        let url = format!("{}/{}", self.base_url, resource);

        let text = match self.get_text(&url).await {
            Ok(text) => text,
            Err(e) => {
                warn!("Failed to fetch {}: {}", resource, e);
                return Vec::new();
            }
        };

        match serde_json::from_str::<ListEnvelope<T>>(&text) {
            Ok(envelope) => {
                let items = envelope.into_vec();
                info!("Retrieved {} {}", items.len(), resource);
                items
            }
            Err(e) => {
                warn!("Malformed {} response: {}", resource, e);
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    fn test_config(account_ids: Vec<String>) -> Config {
        Config {
            base_url: String::new(),
            api_key: "test-key".to_string(),
            account_ids,
            mysql_host: "localhost".to_string(),
            mysql_port: 3306,
            mysql_database: "test".to_string(),
            mysql_user: "test".to_string(),
            mysql_password: String::new(),
        }
    }

    fn setup_client(server: &MockServer, account_ids: Vec<String>) -> ConfigStoreClient {
        let config = test_config(account_ids);
        ConfigStoreClient::with_base_url(&config, server.url("/api/v1/configs")).expect("client")
    }

    #[tokio::test]
    async fn fetch_chatbots_concatenates_accounts() {
        let server = MockServer::start_async().await;

        let acc_a = server.mock(|when, then| {
            when.method(GET)
                .path("/api/v1/configs/chatbots/query/account_id/acc-a")
                .header("x-api-key", "test-key");
            then.status(200).json_body(serde_json::json!({
                "data": [{"id": "bot-1", "name": "Bot One"}]
            }));
        });
        let acc_b = server.mock(|when, then| {
            when.method(GET)
                .path("/api/v1/configs/chatbots/query/account_id/acc-b");
            then.status(200).json_body(serde_json::json!({
                "data": [{"id": "bot-2", "name": "Bot Two", "settings_id": "s-1"}]
            }));
        });

        let client = setup_client(&server, vec!["acc-a".to_string(), "acc-b".to_string()]);
        let chatbots = client.fetch_chatbots().await;

        assert_eq!(chatbots.len(), 2);
        assert_eq!(chatbots[0].id, "bot-1");
        assert_eq!(chatbots[1].settings_id.as_deref(), Some("s-1"));
        acc_a.assert_calls(1);
        acc_b.assert_calls(1);
    }

    #[tokio::test]
    async fn fetch_chatbots_survives_one_account_failing() {
        let server = MockServer::start_async().await;

        server.mock(|when, then| {
            when.method(GET)
                .path("/api/v1/configs/chatbots/query/account_id/bad");
            then.status(500).body("boom");
        });
        server.mock(|when, then| {
            when.method(GET)
                .path("/api/v1/configs/chatbots/query/account_id/good");
            then.status(200).json_body(serde_json::json!({
                "data": [{"id": "bot-1"}]
            }));
        });

        let client = setup_client(&server, vec!["bad".to_string(), "good".to_string()]);
        let chatbots = client.fetch_chatbots().await;

        assert_eq!(chatbots.len(), 1);
        assert_eq!(chatbots[0].id, "bot-1");
    }

    #[tokio::test]
    async fn fetch_chatbots_missing_data_field_yields_nothing() {
        let server = MockServer::start_async().await;

        server.mock(|when, then| {
            when.method(GET)
                .path("/api/v1/configs/chatbots/query/account_id/acc");
            then.status(200).json_body(serde_json::json!({"status": "ok"}));
        });

        let client = setup_client(&server, vec!["acc".to_string()]);
        assert!(client.fetch_chatbots().await.is_empty());
    }

    #[tokio::test]
    async fn fetch_settings_accepts_bare_array() {
        let server = MockServer::start_async().await;

        server.mock(|when, then| {
            when.method(GET).path("/api/v1/configs/settings");
            then.status(200).json_body(serde_json::json!([
                {"id": "s-1", "profile_image_url": "https://cdn/img.png"}
            ]));
        });

        let client = setup_client(&server, vec![]);
        let settings = client.fetch_settings().await;

        assert_eq!(settings.len(), 1);
        assert_eq!(settings[0].profile_image_url.as_deref(), Some("https://cdn/img.png"));
    }

    #[tokio::test]
    async fn fetch_settings_accepts_data_envelope() {
        let server = MockServer::start_async().await;

        server.mock(|when, then| {
            when.method(GET).path("/api/v1/configs/settings");
            then.status(200).json_body(serde_json::json!({
                "data": [{"id": "s-1"}, {"id": "s-2"}]
            }));
        });

        let client = setup_client(&server, vec![]);
        assert_eq!(client.fetch_settings().await.len(), 2);
    }

    #[tokio::test]
    async fn fetch_languages_accepts_single_object() {
        let server = MockServer::start_async().await;

        server.mock(|when, then| {
            when.method(GET).path("/api/v1/configs/languages");
            then.status(200).json_body(serde_json::json!({"id": 7, "name": "Tamil"}));
        });

        let client = setup_client(&server, vec![]);
        let languages = client.fetch_languages().await;

        assert_eq!(languages.len(), 1);
        assert_eq!(languages[0].id.as_deref(), Some("7"));
        assert_eq!(languages[0].name.as_deref(), Some("Tamil"));
    }

    #[tokio::test]
    async fn fetch_languages_numeric_and_string_ids_normalize() {
        let server = MockServer::start_async().await;

        server.mock(|when, then| {
            when.method(GET).path("/api/v1/configs/languages");
            then.status(200).json_body(serde_json::json!([
                {"id": 1, "name": "English"},
                {"id": "2", "name": "Spanish"},
                {"name": "Orphan"}
            ]));
        });

        let client = setup_client(&server, vec![]);
        let languages = client.fetch_languages().await;

        assert_eq!(languages.len(), 3);
        assert_eq!(languages[0].id.as_deref(), Some("1"));
        assert_eq!(languages[1].id.as_deref(), Some("2"));
        assert!(languages[2].id.is_none());
    }

    #[tokio::test]
    async fn fetch_settings_http_error_degrades_to_empty() {
        let server = MockServer::start_async().await;

        server.mock(|when, then| {
            when.method(GET).path("/api/v1/configs/settings");
            then.status(503).body("unavailable");
        });

        let client = setup_client(&server, vec![]);
        assert!(client.fetch_settings().await.is_empty());
    }

    #[tokio::test]
    async fn fetch_settings_non_json_degrades_to_empty() {
        let server = MockServer::start_async().await;

        server.mock(|when, then| {
            when.method(GET).path("/api/v1/configs/settings");
            then.status(200).body("not-json");
        });

        let client = setup_client(&server, vec![]);
        assert!(client.fetch_settings().await.is_empty());
    }
}
