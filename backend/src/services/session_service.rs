use crate::models::{
    ChatMessage, CreateSessionRequest, NewMessageRequest, RegisterRequest, SessionSummary,
    StoredMessage, StoredSession, StoredUser,
};
use anyhow::{anyhow, Context, Result};
use elasticsearch::params::Refresh;
use elasticsearch::{
    CountParts, DeleteByQueryParts, DeleteParts, Elasticsearch, GetParts, IndexParts, SearchParts,
    UpdateParts,
};
use log::info;
use serde_json::{json, Value};

pub const USERS_INDEX: &str = "chat_users";
pub const SESSIONS_INDEX: &str = "chat_sessions";
pub const MESSAGES_INDEX: &str = "chat_messages";

// ── Users ────────────────────────────────────────────────────────────────────

pub async fn create_user(es_client: &Elasticsearch, request: &RegisterRequest) -> Result<()> {
    let username = request.username.trim().to_lowercase();

    // Username doubles as the document id, so existence is a GET.
    let existing = es_client
        .get(GetParts::IndexId(USERS_INDEX, &username))
        .send()
        .await?;
    if existing.status_code().is_success() {
        return Err(anyhow!("Username already exists"));
    }

    let password_hash =
        bcrypt::hash(&request.password, bcrypt::DEFAULT_COST).context("Password hashing failed")?;
    let user = StoredUser {
        username: username.clone(),
        password_hash,
        email: request
            .email
            .as_ref()
            .map(|e| e.trim().to_lowercase())
            .filter(|e| !e.is_empty()),
        first_name: request
            .first_name
            .as_ref()
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty()),
        last_name: request
            .last_name
            .as_ref()
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty()),
        created_at: chrono::Utc::now().to_rfc3339(),
    };

    let response = es_client
        .index(IndexParts::IndexId(USERS_INDEX, &username))
        .refresh(Refresh::True)
        .body(json!(user))
        .send()
        .await?;
    if !response.status_code().is_success() {
        return Err(anyhow!(
            "Failed to store user: {}",
            response.text().await.unwrap_or_default()
        ));
    }
    info!("Registered user: {username}");
    Ok(())
}

pub async fn verify_login(
    es_client: &Elasticsearch,
    username: &str,
    password: &str,
) -> Result<StoredUser> {
    let username = username.trim().to_lowercase();

    let response = es_client
        .get(GetParts::IndexId(USERS_INDEX, &username))
        .send()
        .await?;
    if !response.status_code().is_success() {
        return Err(anyhow!("User not found"));
    }
    let body: Value = response.json().await?;
    let source = body
        .get("_source")
        .cloned()
        .ok_or_else(|| anyhow!("User not found"))?;
    let user: StoredUser =
        serde_json::from_value(source).context("Failed to parse stored user")?;

    if !bcrypt::verify(password, &user.password_hash).context("Password verification failed")? {
        return Err(anyhow!("Invalid password"));
    }
    Ok(user)
}

// ── Sessions ─────────────────────────────────────────────────────────────────

pub async fn create_session(
    es_client: &Elasticsearch,
    request: &CreateSessionRequest,
) -> Result<String> {
    let now = chrono::Utc::now();
    let session_id = format!("{}_{}", now.timestamp_millis(), request.username);
    let session = StoredSession {
        username: request.username.clone(),
        agent: request.agent.clone(),
        title: request.title.clone(),
        created_at: now.to_rfc3339(),
    };

    let response = es_client
        .index(IndexParts::IndexId(SESSIONS_INDEX, &session_id))
        .refresh(Refresh::True)
        .body(json!(session))
        .send()
        .await?;
    if !response.status_code().is_success() {
        return Err(anyhow!(
            "Failed to store session: {}",
            response.text().await.unwrap_or_default()
        ));
    }
    Ok(session_id)
}

/// Sessions for one user, newest first.
pub async fn list_sessions(
    es_client: &Elasticsearch,
    username: &str,
) -> Result<Vec<SessionSummary>> {
    let search_body = json!({
        "size": 1000,
        "query": { "term": { "username": username } },
        "sort": [{ "created_at": { "order": "desc" } }]
    });

    let response = es_client
        .search(SearchParts::Index(&[SESSIONS_INDEX]))
        .body(search_body)
        .send()
        .await?;
    if !response.status_code().is_success() {
        return Err(anyhow!(
            "Elasticsearch search failed with status: {}",
            response.status_code()
        ));
    }

    let json_response: Value = response.json().await?;
    let empty_vec = vec![];
    let hits = json_response["hits"]["hits"].as_array().unwrap_or(&empty_vec);

    let mut summaries = Vec::new();
    for hit in hits {
        let id = hit["_id"].as_str().unwrap_or_default().to_string();
        let source = &hit["_source"];
        let message_count = count_messages(es_client, &id).await.unwrap_or(0);
        summaries.push(SessionSummary {
            id,
            agent: source["agent"].as_str().map(str::to_string),
            title: source["title"].as_str().map(str::to_string),
            created_at: source["created_at"].as_str().unwrap_or_default().to_string(),
            message_count,
        });
    }
    Ok(summaries)
}

pub async fn delete_session(es_client: &Elasticsearch, session_id: &str) -> Result<()> {
    es_client
        .delete(DeleteParts::IndexId(SESSIONS_INDEX, session_id))
        .refresh(Refresh::True)
        .send()
        .await?;

    // Messages are separate documents; drop them with the session.
    es_client
        .delete_by_query(DeleteByQueryParts::Index(&[MESSAGES_INDEX]))
        .body(json!({ "query": { "term": { "session_id": session_id } } }))
        .send()
        .await?;

    info!("Deleted session {session_id} and its messages");
    Ok(())
}

pub async fn set_session_title(
    es_client: &Elasticsearch,
    session_id: &str,
    title: &str,
) -> Result<()> {
    let response = es_client
        .update(UpdateParts::IndexId(SESSIONS_INDEX, session_id))
        .refresh(Refresh::True)
        .body(json!({ "doc": { "title": title } }))
        .send()
        .await?;
    if !response.status_code().is_success() {
        return Err(anyhow!(
            "Failed to update session title: {}",
            response.text().await.unwrap_or_default()
        ));
    }
    Ok(())
}

// ── Messages ─────────────────────────────────────────────────────────────────

pub async fn append_message(
    es_client: &Elasticsearch,
    request: &NewMessageRequest,
) -> Result<()> {
    let now = chrono::Utc::now();
    let message = StoredMessage {
        session_id: request.session_id.clone(),
        role: request.role.clone(),
        content: request.content.clone(),
        timestamp: now.to_rfc3339(),
        image_data: request.image_data.clone().map(|v| match v {
            Value::Array(items) => items,
            other => vec![other],
        }),
        charts: request.charts.clone().filter(|c| !c.is_empty()),
        tool_calls: request.tool_calls.clone().filter(|c| !c.is_empty()),
        generated_images: request.generated_images.clone().filter(|c| !c.is_empty()),
    };

    let doc_id = format!(
        "{}_{}",
        request.session_id,
        now.timestamp_nanos_opt().unwrap_or_default()
    );
    let response = es_client
        .index(IndexParts::IndexId(MESSAGES_INDEX, &doc_id))
        .refresh(Refresh::True)
        .body(json!(message))
        .send()
        .await?;
    if !response.status_code().is_success() {
        return Err(anyhow!(
            "Failed to store message: {}",
            response.text().await.unwrap_or_default()
        ));
    }
    Ok(())
}

/// Messages of one session in chronological order.
pub async fn list_messages(
    es_client: &Elasticsearch,
    session_id: &str,
) -> Result<Vec<ChatMessage>> {
    let search_body = json!({
        "size": 10000,
        "query": { "term": { "session_id": session_id } },
        "sort": [{ "timestamp": { "order": "asc" } }]
    });

    let response = es_client
        .search(SearchParts::Index(&[MESSAGES_INDEX]))
        .body(search_body)
        .send()
        .await?;
    if !response.status_code().is_success() {
        return Err(anyhow!(
            "Elasticsearch search failed with status: {}",
            response.status_code()
        ));
    }

    let json_response: Value = response.json().await?;
    let empty_vec = vec![];
    let hits = json_response["hits"]["hits"].as_array().unwrap_or(&empty_vec);

    let messages = hits
        .iter()
        .enumerate()
        .filter_map(|(i, hit)| {
            let stored: StoredMessage = serde_json::from_value(hit["_source"].clone()).ok()?;
            Some(ChatMessage {
                id: format!("{session_id}-{i}"),
                role: stored.role,
                content: stored.content,
                timestamp: stored.timestamp,
                images: stored.image_data,
                charts: stored.charts,
                tool_calls: stored.tool_calls,
                generated_images: stored.generated_images,
            })
        })
        .collect();
    Ok(messages)
}

async fn count_messages(es_client: &Elasticsearch, session_id: &str) -> Result<i64> {
    let response = es_client
        .count(CountParts::Index(&[MESSAGES_INDEX]))
        .body(json!({ "query": { "term": { "session_id": session_id } } }))
        .send()
        .await?;
    let body: Value = response.json().await?;
    Ok(body["count"].as_i64().unwrap_or(0))
}

pub async fn count_index(es_client: &Elasticsearch, index: &str) -> i64 {
    match es_client.count(CountParts::Index(&[index])).send().await {
        Ok(response) => {
            let body: Value = response.json().await.unwrap_or(json!({"count": 0}));
            body["count"].as_i64().unwrap_or(0)
        }
        Err(_) => 0,
    }
}
