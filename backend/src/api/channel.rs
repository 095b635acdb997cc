use crate::models::ProgressEvent;
use crate::services::{ingestion_service, transcript_service};
use crate::utils::extract_youtube_video_id;
use crate::AppState;
use log::info;
use rocket::http::ContentType;
use rocket::response::stream::TextStream;
use rocket::serde::json::Json;
use rocket::{get, post, State};
use tokio::sync::mpsc;
use serde::Deserialize;
use serde_json::json;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelDownloadRequest {
    pub channel_url: String,
    pub max_videos: Option<i64>,
}

/// Stream channel ingestion progress as NDJSON, one event per line. The
/// pipeline runs in its own task; once the client hangs up the receiver
/// drops, the next send fails and the task winds down.
#[post("/channel", data = "<request>")]
pub async fn download_channel(
    state: &State<AppState>,
    request: Json<ChannelDownloadRequest>,
) -> (ContentType, TextStream![String]) {
    let request = request.into_inner();
    let max_videos = ingestion_service::clamp_max_videos(request.max_videos);
    info!(
        "Starting channel ingestion: {} (max {max_videos})",
        request.channel_url
    );

    let (tx, mut rx) = mpsc::channel::<ProgressEvent>(16);
    let http = state.http.clone();
    tokio::spawn(ingestion_service::run(
        http,
        request.channel_url,
        max_videos,
        tx,
    ));

    let stream = TextStream! {
        while let Some(event) = rx.recv().await {
            match serde_json::to_string(&event) {
                Ok(line) => yield format!("{line}\n"),
                Err(e) => {
                    log::error!("Failed to serialize progress event: {e:?}");
                    break;
                }
            }
        }
    };
    (ContentType::new("application", "x-ndjson"), stream)
}

/// On-demand transcript for a single video, given a bare 11-char id or a
/// full watch URL.
#[get("/transcript?<video_id>")]
pub async fn get_video_transcript(video_id: &str) -> Json<serde_json::Value> {
    let id = if video_id.len() == 11 && !video_id.contains('/') {
        Some(video_id.to_string())
    } else {
        extract_youtube_video_id(video_id)
    };

    let transcript = match id {
        Some(id) => transcript_service::fetch_transcript_text(&id).await,
        None => transcript_service::TRANSCRIPT_UNAVAILABLE.to_string(),
    };
    Json(json!({ "transcript": transcript }))
}
