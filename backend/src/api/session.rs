use crate::models::{
    CreateSessionRequest, CreatedSession, ErrorResponse, OkResponse, SessionSummary, TitleRequest,
};
use crate::services::session_service;
use crate::AppState;
use log::error;
use rocket::serde::json::Json;
use rocket::{delete, get, patch, post, State};

#[get("/?<username>")]
pub async fn list_sessions(
    state: &State<AppState>,
    username: &str,
) -> Result<Json<Vec<SessionSummary>>, ErrorResponse> {
    match session_service::list_sessions(&state.es_client, username).await {
        Ok(sessions) => Ok(Json(sessions)),
        Err(e) => {
            error!("Failed to list sessions: {e:?}");
            Err(ErrorResponse::new(e.to_string()))
        }
    }
}

#[post("/", data = "<request>")]
pub async fn create_session(
    state: &State<AppState>,
    request: Json<CreateSessionRequest>,
) -> Result<Json<CreatedSession>, ErrorResponse> {
    let request = request.into_inner();
    if request.username.trim().is_empty() {
        return Err(ErrorResponse::new("username is required"));
    }
    match session_service::create_session(&state.es_client, &request).await {
        Ok(id) => Ok(Json(CreatedSession { id })),
        Err(e) => {
            error!("Failed to create session: {e:?}");
            Err(ErrorResponse::new(e.to_string()))
        }
    }
}

#[delete("/<id>")]
pub async fn delete_session(
    state: &State<AppState>,
    id: &str,
) -> Result<Json<OkResponse>, ErrorResponse> {
    match session_service::delete_session(&state.es_client, id).await {
        Ok(()) => Ok(Json(OkResponse { ok: true })),
        Err(e) => {
            error!("Failed to delete session: {e:?}");
            Err(ErrorResponse::new(e.to_string()))
        }
    }
}

#[patch("/<id>/title", data = "<request>")]
pub async fn set_session_title(
    state: &State<AppState>,
    id: &str,
    request: Json<TitleRequest>,
) -> Result<Json<OkResponse>, ErrorResponse> {
    match session_service::set_session_title(&state.es_client, id, &request.title).await {
        Ok(()) => Ok(Json(OkResponse { ok: true })),
        Err(e) => {
            error!("Failed to update session title: {e:?}");
            Err(ErrorResponse::new(e.to_string()))
        }
    }
}
