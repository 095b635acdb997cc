use crate::config::YOUTUBE_API_KEY;
use crate::models::{Transcript, VideoRecord};
use anyhow::{anyhow, Context, Result};
use lazy_static::lazy_static;
use regex::Regex;
use reqwest::Client;
use serde_json::Value;

const API_BASE: &str = "https://www.googleapis.com/youtube/v3";

/// Upstream page and batch limit for playlistItems/videos calls.
pub const PAGE_SIZE: usize = 50;

lazy_static! {
    static ref CHANNEL_ID_RE: Regex =
        Regex::new(r"youtube\.com/channel/([a-zA-Z0-9_-]+)").unwrap();
    static ref HANDLE_RE: Regex = Regex::new(r"youtube\.com/@([a-zA-Z0-9_.-]+)").unwrap();
    static ref USERNAME_RE: Regex = Regex::new(r"youtube\.com/user/([a-zA-Z0-9_-]+)").unwrap();
    static ref CUSTOM_RE: Regex = Regex::new(r"youtube\.com/c/([a-zA-Z0-9_-]+)").unwrap();
    static ref PATH_RE: Regex = Regex::new(r"youtube\.com/([a-zA-Z0-9_-]+)(?:/|$|\?)").unwrap();
    static ref RESERVED_PATHS: Regex =
        Regex::new(r"(?i)^(watch|playlist|results|channel|user|feed|shorts|live|embed|v)$")
            .unwrap();
}

/// A user-supplied channel reference, one of the URL shapes YouTube uses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelRef {
    Id(String),
    Handle(String),
    Username(String),
    Custom(String),
}

pub fn parse_channel_reference(channel_url: &str) -> Result<ChannelRef> {
    let url = channel_url.trim();
    if let Some(c) = CHANNEL_ID_RE.captures(url) {
        return Ok(ChannelRef::Id(c[1].to_string()));
    }
    if let Some(c) = HANDLE_RE.captures(url) {
        return Ok(ChannelRef::Handle(c[1].to_string()));
    }
    if let Some(c) = USERNAME_RE.captures(url) {
        return Ok(ChannelRef::Username(c[1].to_string()));
    }
    if let Some(c) = CUSTOM_RE.captures(url) {
        return Ok(ChannelRef::Custom(c[1].to_string()));
    }
    if let Some(c) = PATH_RE.captures(url) {
        if !RESERVED_PATHS.is_match(&c[1]) {
            return Ok(ChannelRef::Custom(c[1].to_string()));
        }
    }
    Err(anyhow!(
        "Invalid YouTube channel URL. Use format: https://www.youtube.com/@channelname, \
         https://www.youtube.com/channel/CHANNEL_ID, or https://www.youtube.com/PewDiePie"
    ))
}

#[derive(Debug, Clone)]
pub struct ResolvedChannel {
    pub channel_id: String,
    pub uploads_playlist_id: String,
    pub title: String,
}

async fn fetch_youtube_json(
    http: &Client,
    endpoint: &str,
    params: &[(&str, &str)],
) -> Result<Value> {
    let api_key = &*YOUTUBE_API_KEY;
    let url = format!("{API_BASE}/{endpoint}");

    let response = http
        .get(&url)
        .query(params)
        .query(&[("key", api_key.as_str())])
        .send()
        .await
        .with_context(|| format!("YouTube API request to {endpoint} failed"))?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        return Err(anyhow!("YouTube API: {status} {body}"));
    }

    response
        .json::<Value>()
        .await
        .context("Failed to parse YouTube API response as JSON")
}

/// Resolve a channel reference to its id, uploads playlist and display
/// title. Handles, legacy usernames and custom slugs go through channel
/// search first.
pub async fn resolve_channel(http: &Client, reference: &ChannelRef) -> Result<ResolvedChannel> {
    let channel_id = match reference {
        ChannelRef::Id(id) => id.clone(),
        ChannelRef::Handle(handle) => search_channel_id(http, &format!("@{handle}")).await?,
        ChannelRef::Username(name) | ChannelRef::Custom(name) => {
            search_channel_id(http, name).await?
        }
    };
    fetch_channel(http, &channel_id).await
}

async fn search_channel_id(http: &Client, query: &str) -> Result<String> {
    let data = fetch_youtube_json(
        http,
        "search",
        &[("part", "snippet"), ("type", "channel"), ("q", query)],
    )
    .await?;
    data["items"][0]["snippet"]["channelId"]
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| anyhow!("Channel not found"))
}

async fn fetch_channel(http: &Client, channel_id: &str) -> Result<ResolvedChannel> {
    let data = fetch_youtube_json(
        http,
        "channels",
        &[("part", "contentDetails,snippet"), ("id", channel_id)],
    )
    .await?;
    let item = &data["items"][0];
    if item.is_null() {
        return Err(anyhow!("Channel not found"));
    }
    let uploads = item["contentDetails"]["relatedPlaylists"]["uploads"]
        .as_str()
        .ok_or_else(|| anyhow!("Uploads playlist not found"))?;

    Ok(ResolvedChannel {
        channel_id: item["id"].as_str().unwrap_or(channel_id).to_string(),
        uploads_playlist_id: uploads.to_string(),
        title: item["snippet"]["title"].as_str().unwrap_or("").to_string(),
    })
}

/// Page through the uploads playlist until `max` ids are collected or the
/// listing runs out. An empty page or a missing continuation token ends the
/// listing even under max; partial results are expected here.
pub async fn list_upload_video_ids(
    http: &Client,
    uploads_playlist_id: &str,
    max: usize,
) -> Result<Vec<String>> {
    let mut video_ids: Vec<String> = Vec::new();
    let mut page_token = String::new();

    loop {
        let page_size = PAGE_SIZE.min(max - video_ids.len()).to_string();
        let data = fetch_youtube_json(
            http,
            "playlistItems",
            &[
                ("part", "contentDetails"),
                ("playlistId", uploads_playlist_id),
                ("maxResults", &page_size),
                ("pageToken", &page_token),
            ],
        )
        .await?;

        match accumulate_page(&mut video_ids, &data, max) {
            Some(token) => page_token = token,
            None => break,
        }
    }

    Ok(video_ids)
}

/// Fold one playlistItems page into the id accumulator, skipping ids
/// already seen so document ids stay unique. Returns the continuation
/// token for the next page, or `None` when the listing is done: max ids
/// collected, an empty page, or a missing token (the latter two end a
/// listing early with a partial result).
fn accumulate_page(video_ids: &mut Vec<String>, page: &Value, max: usize) -> Option<String> {
    let items = page["items"].as_array().cloned().unwrap_or_default();
    for item in &items {
        if let Some(id) = item["contentDetails"]["videoId"].as_str() {
            if video_ids.len() < max && !video_ids.iter().any(|v| v == id) {
                video_ids.push(id.to_string());
            }
        }
    }

    let token = page["nextPageToken"].as_str().unwrap_or("");
    if token.is_empty() || items.is_empty() || video_ids.len() >= max {
        return None;
    }
    Some(token.to_string())
}

/// Fetch metadata for one batch of ids (at most `PAGE_SIZE`).
pub async fn fetch_videos_metadata(http: &Client, ids: &[String]) -> Result<Vec<Value>> {
    let joined = ids.join(",");
    let data = fetch_youtube_json(
        http,
        "videos",
        &[
            ("part", "snippet,contentDetails,statistics"),
            ("id", &joined),
        ],
    )
    .await?;
    Ok(data["items"].as_array().cloned().unwrap_or_default())
}

/// Build a record from one item of the videos endpoint. Statistics arrive
/// as strings; absent counters default to 0.
pub fn video_record_from_item(item: &Value, transcript: String) -> VideoRecord {
    let video_id = item["id"].as_str().unwrap_or("").to_string();
    let snippet = &item["snippet"];
    let statistics = &item["statistics"];
    let content = &item["contentDetails"];

    let thumbnail_url = ["high", "medium", "default"]
        .into_iter()
        .find_map(|size| snippet["thumbnails"][size]["url"].as_str())
        .map(str::to_string);

    VideoRecord {
        video_url: format!("https://www.youtube.com/watch?v={video_id}"),
        video_id,
        title: snippet["title"].as_str().unwrap_or("").to_string(),
        description: snippet["description"].as_str().unwrap_or("").to_string(),
        transcript: Some(Transcript::Text(transcript)),
        duration: content["duration"].as_str().map(str::to_string),
        release_date: snippet["publishedAt"].as_str().map(str::to_string),
        view_count: counter(statistics, "viewCount"),
        like_count: counter(statistics, "likeCount"),
        comment_count: counter(statistics, "commentCount"),
        thumbnail_url,
        extra: Default::default(),
    }
}

fn counter(statistics: &Value, name: &str) -> i64 {
    statistics[name]
        .as_str()
        .unwrap_or("0")
        .parse()
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn channel_reference_shapes() {
        assert_eq!(
            parse_channel_reference("https://www.youtube.com/channel/UCabc_-123").unwrap(),
            ChannelRef::Id("UCabc_-123".into())
        );
        assert_eq!(
            parse_channel_reference("https://www.youtube.com/@veritasium").unwrap(),
            ChannelRef::Handle("veritasium".into())
        );
        assert_eq!(
            parse_channel_reference("https://www.youtube.com/user/oldname").unwrap(),
            ChannelRef::Username("oldname".into())
        );
        assert_eq!(
            parse_channel_reference("https://www.youtube.com/c/SomeSlug").unwrap(),
            ChannelRef::Custom("SomeSlug".into())
        );
        assert_eq!(
            parse_channel_reference("https://www.youtube.com/PewDiePie").unwrap(),
            ChannelRef::Custom("PewDiePie".into())
        );
    }

    #[test]
    fn reserved_paths_are_not_channels() {
        for url in [
            "https://www.youtube.com/watch?v=dQw4w9WgXcQ",
            "https://www.youtube.com/results?search_query=x",
            "https://www.youtube.com/feed/subscriptions",
        ] {
            assert!(parse_channel_reference(url).is_err(), "{url}");
        }
        assert!(parse_channel_reference("not a url at all").is_err());
    }

    fn page(ids: &[&str], next_token: Option<&str>) -> Value {
        let items: Vec<Value> = ids
            .iter()
            .map(|id| json!({"contentDetails": {"videoId": id}}))
            .collect();
        match next_token {
            Some(token) => json!({"items": items, "nextPageToken": token}),
            None => json!({"items": items}),
        }
    }

    #[test]
    fn listing_deduplicates_ids() {
        let mut ids = Vec::new();
        let token = accumulate_page(&mut ids, &page(&["a", "b", "a"], Some("t1")), 10);
        assert_eq!(ids, vec!["a", "b"]);
        assert_eq!(token.as_deref(), Some("t1"));

        // A repeat across pages is dropped too.
        accumulate_page(&mut ids, &page(&["b", "c"], Some("t2")), 10);
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[test]
    fn listing_stops_at_max_even_with_a_token() {
        let mut ids = Vec::new();
        let token = accumulate_page(&mut ids, &page(&["a", "b", "c"], Some("t1")), 2);
        assert_eq!(ids, vec!["a", "b"]);
        assert_eq!(token, None);
    }

    #[test]
    fn listing_ends_early_on_missing_token_or_empty_page() {
        let mut ids = Vec::new();
        assert_eq!(accumulate_page(&mut ids, &page(&["a"], None), 10), None);
        assert_eq!(ids, vec!["a"]);

        // An empty page ends the listing even if a token is present.
        let mut ids = Vec::new();
        assert_eq!(accumulate_page(&mut ids, &page(&[], Some("t1")), 10), None);
        assert!(ids.is_empty());
    }

    #[test]
    fn record_built_from_videos_item() {
        let item = json!({
            "id": "vid123",
            "snippet": {
                "title": "A Video",
                "description": "About things",
                "publishedAt": "2024-01-02T03:04:05Z",
                "thumbnails": {
                    "medium": {"url": "https://i.ytimg.com/m.jpg"},
                    "default": {"url": "https://i.ytimg.com/d.jpg"}
                }
            },
            "contentDetails": {"duration": "PT15M33S"},
            "statistics": {"viewCount": "1234", "likeCount": "56"}
        });
        let record = video_record_from_item(&item, "words words".to_string());
        assert_eq!(record.video_id, "vid123");
        assert_eq!(record.video_url, "https://www.youtube.com/watch?v=vid123");
        assert_eq!(record.view_count, 1234);
        assert_eq!(record.like_count, 56);
        assert_eq!(record.comment_count, 0); // absent counter defaults
        assert_eq!(record.duration.as_deref(), Some("PT15M33S"));
        // high is missing, medium wins over default
        assert_eq!(record.thumbnail_url.as_deref(), Some("https://i.ytimg.com/m.jpg"));
    }
}
