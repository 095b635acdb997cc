use crate::services::tool_service::{self, ToolDeclaration};
use crate::AppState;
use log::info;
use rocket::serde::json::Json;
use rocket::{get, post, State};
use serde::Deserialize;
use serde_json::{Map, Value};

#[get("/")]
pub async fn list_tools() -> Json<Vec<ToolDeclaration>> {
    Json(tool_service::tool_declarations())
}

#[derive(Debug, Deserialize)]
pub struct ToolInvocationRequest {
    pub tool: String,
    #[serde(default)]
    pub args: Map<String, Value>,
    /// Client-held channel JSON, either a channel document or a bare
    /// video array.
    #[serde(default)]
    pub data: Value,
}

#[post("/", data = "<request>")]
pub async fn invoke_tool(
    state: &State<AppState>,
    request: Json<ToolInvocationRequest>,
) -> Json<crate::models::ToolOutcome> {
    let request = request.into_inner();
    let videos = tool_service::records_from_data(&request.data);
    info!(
        "Invoking tool {} over {} videos",
        request.tool,
        videos.len()
    );
    let outcome = tool_service::execute_tool(&state.http, &request.tool, &request.args, &videos).await;
    Json(outcome)
}
