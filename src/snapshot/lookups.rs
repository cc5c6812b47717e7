//! Keyed lookup maps built from the config store tables.
//!
//! Entries missing their id are skipped; malformed upstream data is
//! tolerated, not fatal. Language ids are normalized to string keys so they
//! match the `language_id` values carried by conversation rows regardless of
//! whether the source column is numeric or text.

use std::collections::HashMap;

use tracing::info;

use crate::api::{LanguageEntry, SettingsEntry};

/// Build settings_id -> entry map.
pub fn settings_map(settings: &[SettingsEntry]) -> HashMap<String, SettingsEntry> {
    let map: HashMap<String, SettingsEntry> = settings
        .iter()
        .filter_map(|entry| entry.id.clone().map(|id| (id, entry.clone())))
        .collect();
    info!("Created settings map for {} settings", map.len());
    map
}

/// Build language_id -> display name map.
pub fn language_map(languages: &[LanguageEntry]) -> HashMap<String, String> {
    let map: HashMap<String, String> = languages
        .iter()
        .filter_map(|entry| match (&entry.id, &entry.name) {
            (Some(id), Some(name)) => Some((id.clone(), name.clone())),
            _ => None,
        })
        .collect();
    info!("Created language map with {} languages", map.len());
    map
}
