use crate::models::{ChatMessage, ErrorResponse, NewMessageRequest, OkResponse};
use crate::services::session_service;
use crate::AppState;
use log::error;
use rocket::serde::json::Json;
use rocket::{get, post, State};

#[post("/", data = "<request>")]
pub async fn append_message(
    state: &State<AppState>,
    request: Json<NewMessageRequest>,
) -> Result<Json<OkResponse>, ErrorResponse> {
    let request = request.into_inner();
    if request.session_id.trim().is_empty() || request.role.trim().is_empty() {
        return Err(ErrorResponse::new("session_id and role are required"));
    }
    match session_service::append_message(&state.es_client, &request).await {
        Ok(()) => Ok(Json(OkResponse { ok: true })),
        Err(e) => {
            error!("Failed to store message: {e:?}");
            Err(ErrorResponse::new(e.to_string()))
        }
    }
}

#[get("/?<session_id>")]
pub async fn list_messages(
    state: &State<AppState>,
    session_id: &str,
) -> Result<Json<Vec<ChatMessage>>, ErrorResponse> {
    match session_service::list_messages(&state.es_client, session_id).await {
        Ok(messages) => Ok(Json(messages)),
        Err(e) => {
            error!("Failed to list messages: {e:?}");
            Err(ErrorResponse::new(e.to_string()))
        }
    }
}
