use crate::models::{ErrorResponse, GeneratedImage};
use crate::services::image_service::{self, AnchorImage};
use crate::AppState;
use log::{error, info};
use rocket::serde::json::Json;
use rocket::{post, State};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateImageRequest {
    #[serde(default)]
    pub prompt: String,
    pub anchor_image_base64: Option<String>,
    pub mime_type: Option<String>,
}

#[post("/generate-image", data = "<request>")]
pub async fn generate_image(
    state: &State<AppState>,
    request: Json<GenerateImageRequest>,
) -> Result<Json<GeneratedImage>, ErrorResponse> {
    let request = request.into_inner();
    if request.prompt.trim().is_empty() && request.anchor_image_base64.is_none() {
        return Err(ErrorResponse::new(
            "Either prompt or anchorImageBase64 is required",
        ));
    }

    let anchor = request.anchor_image_base64.map(|data| AnchorImage {
        data,
        mime_type: request
            .mime_type
            .unwrap_or_else(|| "image/png".to_string()),
    });

    match image_service::generate_image(&state.http, &request.prompt, anchor.as_ref()).await {
        Ok(image) => {
            info!("Generated image ({} bytes base64)", image.image_base64.len());
            Ok(Json(image))
        }
        Err(e) => {
            error!("Image generation failed: {e:?}");
            Err(ErrorResponse::new(e.to_string()))
        }
    }
}
