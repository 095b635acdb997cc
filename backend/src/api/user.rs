use crate::models::{ErrorResponse, LoginRequest, LoginResponse, OkResponse, RegisterRequest};
use crate::services::session_service;
use crate::AppState;
use log::error;
use rocket::serde::json::Json;
use rocket::{post, State};

#[post("/", data = "<request>")]
pub async fn register_user(
    state: &State<AppState>,
    request: Json<RegisterRequest>,
) -> Result<Json<OkResponse>, ErrorResponse> {
    let request = request.into_inner();
    if request.username.trim().is_empty() || request.password.is_empty() {
        return Err(ErrorResponse::new("Username and password are required"));
    }

    match session_service::create_user(&state.es_client, &request).await {
        Ok(()) => Ok(Json(OkResponse { ok: true })),
        Err(e) => {
            error!("Registration failed: {e:?}");
            Err(ErrorResponse::new(e.to_string()))
        }
    }
}

#[post("/login", data = "<request>")]
pub async fn login_user(
    state: &State<AppState>,
    request: Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ErrorResponse> {
    let request = request.into_inner();
    match session_service::verify_login(&state.es_client, &request.username, &request.password)
        .await
    {
        Ok(user) => Ok(Json(LoginResponse {
            ok: true,
            username: user.username,
            first_name: user.first_name,
            last_name: user.last_name,
        })),
        Err(e) => Err(ErrorResponse::unauthorized(e.to_string())),
    }
}
