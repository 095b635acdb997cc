use rocket::http::{ContentType, Status};
use rocket::request::Request;
use rocket::response::Responder;
use rocket::serde::{Deserialize, Serialize};
use rocket::{response, Response};
use serde_json::{json, Map, Value};
use std::io::Cursor;

/// One ingested video. Known fields are typed; anything else the upstream
/// API sends is kept in the flattened extension map so the field resolver
/// can still see it.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct VideoRecord {
    #[serde(default)]
    pub video_id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub transcript: Option<Transcript>,
    #[serde(default)]
    pub duration: Option<String>, // ISO 8601, e.g. PT15M33S
    #[serde(default)]
    pub release_date: Option<String>, // RFC 3339
    #[serde(default)]
    pub view_count: i64,
    #[serde(default)]
    pub like_count: i64,
    #[serde(default)]
    pub comment_count: i64,
    #[serde(default)]
    pub video_url: String,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

pub const KNOWN_FIELDS: &[&str] = &[
    "video_id",
    "title",
    "description",
    "transcript",
    "duration",
    "release_date",
    "view_count",
    "like_count",
    "comment_count",
    "video_url",
    "thumbnail_url",
];

impl VideoRecord {
    /// Key set the field resolver matches against: typed fields first, then
    /// whatever the extension map picked up.
    pub fn field_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = KNOWN_FIELDS.iter().map(|k| k.to_string()).collect();
        keys.extend(self.extra.keys().cloned());
        keys
    }

    pub fn field(&self, name: &str) -> Option<Value> {
        match name {
            "video_id" => Some(json!(self.video_id)),
            "title" => Some(json!(self.title)),
            "description" => Some(json!(self.description)),
            "transcript" => self.transcript.as_ref().map(|t| json!(t)),
            "duration" => self.duration.as_ref().map(|d| json!(d)),
            "release_date" => self.release_date.as_ref().map(|d| json!(d)),
            "view_count" => Some(json!(self.view_count)),
            "like_count" => Some(json!(self.like_count)),
            "comment_count" => Some(json!(self.comment_count)),
            "video_url" => Some(json!(self.video_url)),
            "thumbnail_url" => self.thumbnail_url.as_ref().map(|u| json!(u)),
            other => self.extra.get(other).filter(|v| !v.is_null()).cloned(),
        }
    }
}

/// Transcripts arrive either as flattened text or as a list of caption
/// segments (strings or `{text: ...}` objects).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Transcript {
    Text(String),
    Segments(Vec<Value>),
}

impl Transcript {
    pub fn is_empty(&self) -> bool {
        match self {
            Transcript::Text(t) => t.trim().is_empty(),
            Transcript::Segments(s) => s.is_empty(),
        }
    }

    /// Joins segment texts with single spaces; plain text passes through.
    pub fn flatten(&self) -> String {
        match self {
            Transcript::Text(t) => t.clone(),
            Transcript::Segments(parts) => parts
                .iter()
                .map(|p| match p {
                    Value::String(s) => s.as_str(),
                    other => other.get("text").and_then(Value::as_str).unwrap_or(""),
                })
                .collect::<Vec<_>>()
                .join(" "),
        }
    }
}

/// Aggregate produced by one ingestion run. Videos keep upstream listing
/// order, not chronological order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelDocument {
    pub channel_id: String,
    pub channel_title: String,
    pub videos: Vec<VideoRecord>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProgressStep {
    Channel,
    Videos,
    Transcript,
}

/// One line of the NDJSON ingestion stream. Exactly one `Complete` or
/// `Error` ends every run.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ProgressEvent {
    Progress {
        step: ProgressStep,
        current: usize,
        total: usize,
    },
    Complete {
        data: ChannelDocument,
    },
    Error {
        error: String,
    },
}

/// Result of a tool invocation: either a payload or `{"error": ...}`,
/// never both.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum ToolOutcome {
    Success(ToolPayload),
    Error { error: String },
}

impl ToolOutcome {
    pub fn error(msg: impl Into<String>) -> Self {
        ToolOutcome::Error { error: msg.into() }
    }
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum ToolPayload {
    Stats(StatsSummary),
    Chart(MetricSeries),
    Playback(PlaybackCard),
    Transcript(TranscriptResult),
    Image(GeneratedImage),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatsSummary {
    pub field: String,
    pub count: usize,
    pub mean: f64,
    pub median: f64,
    pub std: f64,
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct MetricSeries {
    #[serde(rename = "_chartType")]
    pub chart_type: &'static str,
    pub metric: String,
    pub data: Vec<SeriesPoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesPoint {
    pub date: String, // UTC day, YYYY-MM-DD
    pub value: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlaybackCard {
    #[serde(rename = "_playVideo")]
    pub play_video: bool,
    pub video_id: String,
    pub title: String,
    pub thumbnail_url: Option<String>,
    pub video_url: String,
}

/// Partial-success shape: a selected video without captions still reports
/// its identity, with `transcript: null` and an explanatory `error`.
#[derive(Debug, Clone, Serialize)]
pub struct TranscriptResult {
    pub video_id: String,
    pub title: String,
    pub transcript: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GeneratedImage {
    #[serde(rename = "imageBase64")]
    pub image_base64: String,
    #[serde(rename = "mimeType")]
    pub mime_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

// ── Users / sessions / messages ──────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub ok: bool,
    pub username: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct OkResponse {
    pub ok: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StoredUser {
    pub username: String,
    pub password_hash: String,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateSessionRequest {
    pub username: String,
    pub agent: Option<String>,
    pub title: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CreatedSession {
    pub id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub id: String,
    pub agent: Option<String>,
    pub title: Option<String>,
    pub created_at: String,
    pub message_count: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StoredSession {
    pub username: String,
    pub agent: Option<String>,
    pub title: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Deserialize)]
pub struct TitleRequest {
    pub title: String,
}

#[derive(Debug, Deserialize)]
pub struct NewMessageRequest {
    pub session_id: String,
    pub role: String,
    pub content: String,
    #[serde(rename = "imageData")]
    pub image_data: Option<Value>,
    pub charts: Option<Vec<Value>>,
    #[serde(rename = "toolCalls")]
    pub tool_calls: Option<Vec<Value>>,
    #[serde(rename = "generatedImages")]
    pub generated_images: Option<Vec<Value>>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StoredMessage {
    pub session_id: String,
    pub role: String,
    pub content: String,
    pub timestamp: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_data: Option<Vec<Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub charts: Option<Vec<Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generated_images: Option<Vec<Value>>,
}

#[derive(Debug, Serialize)]
pub struct ChatMessage {
    pub id: String,
    pub role: String,
    pub content: String,
    pub timestamp: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub charts: Option<Vec<Value>>,
    #[serde(rename = "toolCalls", skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<Value>>,
    #[serde(rename = "generatedImages", skip_serializing_if = "Option::is_none")]
    pub generated_images: Option<Vec<Value>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub users_count: i64,
    pub sessions_count: i64,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip)]
    status: Status,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        ErrorResponse {
            error: error.into(),
            status: Status::BadRequest,
        }
    }

    /// Failed credential checks respond 401 rather than 400.
    pub fn unauthorized(error: impl Into<String>) -> Self {
        ErrorResponse {
            error: error.into(),
            status: Status::Unauthorized,
        }
    }
}

impl<'r> Responder<'r, 'static> for ErrorResponse {
    fn respond_to(self, _: &'r Request<'_>) -> response::Result<'static> {
        let json = serde_json::to_string(&self).unwrap();
        Response::build()
            .status(self.status)
            .header(ContentType::JSON)
            .sized_body(json.len(), Cursor::new(json))
            .ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_fields_survive_roundtrip() {
        let raw = serde_json::json!({
            "video_id": "abc",
            "title": "Intro",
            "view_count": 10,
            "custom_score": 7.5
        });
        let record: VideoRecord = serde_json::from_value(raw).unwrap();
        assert_eq!(record.view_count, 10);
        assert_eq!(record.extra["custom_score"], serde_json::json!(7.5));
        assert!(record.field_keys().contains(&"custom_score".to_string()));
    }

    #[test]
    fn transcript_flattens_segments_with_spaces() {
        let t: Transcript = serde_json::from_value(serde_json::json!([
            {"text": "hello"},
            "world",
            {"text": "again", "start": 1.0}
        ]))
        .unwrap();
        assert_eq!(t.flatten(), "hello world again");
    }

    #[test]
    fn tool_outcome_serializes_exactly_one_shape() {
        let err = serde_json::to_value(ToolOutcome::error("nope")).unwrap();
        assert_eq!(err, serde_json::json!({"error": "nope"}));

        let ok = serde_json::to_value(ToolOutcome::Success(ToolPayload::Playback(PlaybackCard {
            play_video: true,
            video_id: "abc".into(),
            title: "Intro".into(),
            thumbnail_url: None,
            video_url: "https://www.youtube.com/watch?v=abc".into(),
        })))
        .unwrap();
        assert!(ok.get("error").is_none());
        assert_eq!(ok["_playVideo"], serde_json::json!(true));
    }

    #[test]
    fn error_response_status_and_body() {
        let bad_request = ErrorResponse::new("nope");
        assert_eq!(bad_request.status, Status::BadRequest);
        let unauthorized = ErrorResponse::unauthorized("Invalid password");
        assert_eq!(unauthorized.status, Status::Unauthorized);

        // The status travels in the response line, not the JSON body.
        assert_eq!(
            serde_json::to_value(&unauthorized).unwrap(),
            serde_json::json!({"error": "Invalid password"})
        );
    }

    #[test]
    fn progress_event_tagging() {
        let e = serde_json::to_value(ProgressEvent::Progress {
            step: ProgressStep::Transcript,
            current: 3,
            total: 10,
        })
        .unwrap();
        assert_eq!(
            e,
            serde_json::json!({"type": "progress", "step": "transcript", "current": 3, "total": 10})
        );
    }
}
