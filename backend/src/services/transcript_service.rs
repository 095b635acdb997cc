use log::{error, info};
use yt_transcript_rs::api::YouTubeTranscriptApi;

/// Literal marker stored when captions cannot be fetched, so consumers of
/// an ingestion run always receive a string once a fetch was attempted.
pub const TRANSCRIPT_UNAVAILABLE: &str = "Transcript unavailable.";

/// English first, so English videos don't come back with auto-generated
/// translations.
const LANGUAGES: &[&str] = &["en", "en-US", "en-GB"];

/// Fetch captions for one video as flattened text, joining segments with
/// single spaces. Any failure degrades to the unavailable marker; a broken
/// transcript never aborts the run it is part of.
pub async fn fetch_transcript_text(video_id: &str) -> String {
    let api = match YouTubeTranscriptApi::new(None, None, None) {
        Ok(api) => api,
        Err(e) => {
            error!("Failed to create YouTubeTranscriptApi: {e:?}");
            return TRANSCRIPT_UNAVAILABLE.to_string();
        }
    };

    match api.fetch_transcript(video_id, LANGUAGES, false).await {
        Ok(transcript) => {
            let mut parts: Vec<String> = Vec::new();
            for entry in transcript {
                let text = entry.text.trim().to_string();
                if !text.is_empty() {
                    parts.push(text);
                }
            }
            if parts.is_empty() {
                info!("No caption text for video ID: {video_id}");
                return TRANSCRIPT_UNAVAILABLE.to_string();
            }
            parts.join(" ")
        }
        Err(e) => {
            error!("Failed to fetch transcript for video ID {video_id}: {e:?}");
            TRANSCRIPT_UNAVAILABLE.to_string()
        }
    }
}
