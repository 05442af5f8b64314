use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Entries kept per client; older ones fall off the end.
pub const HISTORY_CAPACITY: usize = 50;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HumanizeResult {
    pub id: Uuid,
    pub original_text: String,
    pub humanized_text: String,
    pub timestamp: DateTime<Utc>,
}

impl HumanizeResult {
    pub fn new(original_text: String, humanized_text: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            original_text,
            humanized_text,
            timestamp: Utc::now(),
        }
    }
}

/// In-memory humanize history per client, newest first. Never persisted.
#[derive(Debug, Default)]
pub struct HumanizeHistory {
    entries: RwLock<HashMap<String, Vec<HumanizeResult>>>,
}

impl HumanizeHistory {
    pub async fn push(&self, client: &str, result: HumanizeResult) {
        let mut entries = self.entries.write().await;
        let list = entries.entry(client.to_string()).or_default();
        list.insert(0, result);
        list.truncate(HISTORY_CAPACITY);
    }

    pub async fn list(&self, client: &str) -> Vec<HumanizeResult> {
        self.entries
            .read()
            .await
            .get(client)
            .cloned()
            .unwrap_or_default()
    }
}
