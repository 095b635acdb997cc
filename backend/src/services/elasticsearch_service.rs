use crate::services::session_service::{MESSAGES_INDEX, SESSIONS_INDEX, USERS_INDEX};
use anyhow::{anyhow, Result};
use elasticsearch::indices::IndicesCreateParts;
use elasticsearch::Elasticsearch;
use log::info;
use serde_json::{json, Value};

/// Create the chat indexes if they don't exist yet. An index that is
/// already there is left untouched.
pub async fn create_chat_indexes(es_client: &Elasticsearch) -> Result<()> {
    let users_mapping = json!({
        "mappings": {
            "properties": {
                "username": { "type": "keyword" },
                "password_hash": { "type": "keyword", "index": false },
                "email": { "type": "keyword" },
                "created_at": { "type": "date" }
            }
        }
    });
    let sessions_mapping = json!({
        "mappings": {
            "properties": {
                "username": { "type": "keyword" },
                "agent": { "type": "keyword" },
                "title": { "type": "text" },
                "created_at": { "type": "date" }
            }
        }
    });
    let messages_mapping = json!({
        "mappings": {
            "properties": {
                "session_id": { "type": "keyword" },
                "role": { "type": "keyword" },
                "content": { "type": "text" },
                "timestamp": { "type": "date" }
            }
        }
    });

    create_index(es_client, USERS_INDEX, users_mapping).await?;
    create_index(es_client, SESSIONS_INDEX, sessions_mapping).await?;
    create_index(es_client, MESSAGES_INDEX, messages_mapping).await?;
    Ok(())
}

async fn create_index(es_client: &Elasticsearch, index: &str, mapping: Value) -> Result<()> {
    let response = es_client
        .indices()
        .create(IndicesCreateParts::Index(index))
        .body(mapping)
        .send()
        .await?;

    if response.status_code().is_success() {
        info!("Created index: {index}");
        return Ok(());
    }

    let body: Value = response.json().await?;
    let error_type = body["error"]["type"].as_str().unwrap_or("");
    if error_type == "resource_already_exists_exception" {
        info!("Index already exists: {index}");
        return Ok(());
    }
    Err(anyhow!("Failed to create index {index}: {body}"))
}
