use crate::models::{ChannelDocument, ProgressEvent, ProgressStep, VideoRecord};
use crate::services::{transcript_service, youtube_service};
use anyhow::Result;
use log::{error, info};
use reqwest::Client;
use tokio::sync::mpsc::Sender;

pub const MAX_VIDEOS_CAP: usize = 100;
pub const DEFAULT_MAX_VIDEOS: usize = 10;

pub fn clamp_max_videos(requested: Option<i64>) -> usize {
    match requested {
        Some(n) => n.clamp(1, MAX_VIDEOS_CAP as i64) as usize,
        None => DEFAULT_MAX_VIDEOS,
    }
}

/// Drive one ingestion run to its single terminal event. The progress
/// stream ends with exactly one `complete` or `error`, never both.
pub async fn run(http: Client, channel_url: String, max_videos: usize, tx: Sender<ProgressEvent>) {
    match ingest(&http, &channel_url, max_videos, &tx).await {
        Ok(Some(document)) => {
            info!(
                "Channel ingestion complete: {} videos from {}",
                document.videos.len(),
                document.channel_id
            );
            let _ = tx.send(ProgressEvent::Complete { data: document }).await;
        }
        Ok(None) => {
            info!("Channel ingestion aborted: client disconnected");
        }
        Err(e) => {
            error!("Channel ingestion failed: {e:?}");
            let _ = tx
                .send(ProgressEvent::Error {
                    error: e.to_string(),
                })
                .await;
        }
    }
}

async fn send_progress(
    tx: &Sender<ProgressEvent>,
    step: ProgressStep,
    current: usize,
    total: usize,
) -> bool {
    tx.send(ProgressEvent::Progress {
        step,
        current,
        total,
    })
    .await
    .is_ok()
}

/// Resolve the channel, page through its uploads, fetch metadata in
/// batches, then fetch transcripts one by one. `Ok(None)` means the
/// consumer hung up; in-flight work stops and no terminal event is owed
/// since nobody is listening.
async fn ingest(
    http: &Client,
    channel_url: &str,
    max_videos: usize,
    tx: &Sender<ProgressEvent>,
) -> Result<Option<ChannelDocument>> {
    if !send_progress(tx, ProgressStep::Channel, 0, max_videos).await {
        return Ok(None);
    }

    let reference = youtube_service::parse_channel_reference(channel_url)?;
    let channel = youtube_service::resolve_channel(http, &reference).await?;
    info!(
        "Resolved channel {} ({}), uploads playlist {}",
        channel.title, channel.channel_id, channel.uploads_playlist_id
    );

    let video_ids =
        youtube_service::list_upload_video_ids(http, &channel.uploads_playlist_id, max_videos)
            .await?;
    let total = video_ids.len();

    let mut videos: Vec<VideoRecord> = Vec::with_capacity(total);
    for chunk in video_ids.chunks(youtube_service::PAGE_SIZE) {
        if !send_progress(tx, ProgressStep::Videos, videos.len(), total).await {
            return Ok(None);
        }
        let items = youtube_service::fetch_videos_metadata(http, chunk).await?;
        for item in &items {
            // 1-based position for the video whose transcript comes next.
            if !send_progress(tx, ProgressStep::Transcript, videos.len() + 1, total).await {
                return Ok(None);
            }
            let video_id = item["id"].as_str().unwrap_or("");
            let transcript = transcript_service::fetch_transcript_text(video_id).await;
            videos.push(youtube_service::video_record_from_item(item, transcript));
        }
    }

    Ok(Some(ChannelDocument {
        channel_id: channel.channel_id,
        channel_title: channel.title,
        videos,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn max_videos_clamped_with_default() {
        assert_eq!(clamp_max_videos(None), 10);
        assert_eq!(clamp_max_videos(Some(0)), 1);
        assert_eq!(clamp_max_videos(Some(-5)), 1);
        assert_eq!(clamp_max_videos(Some(25)), 25);
        assert_eq!(clamp_max_videos(Some(1000)), 100);
    }
}
