use crate::models::{
    MetricSeries, PlaybackCard, SeriesPoint, ToolOutcome, ToolPayload, TranscriptResult,
    VideoRecord,
};
use crate::services::{fields, image_service, selector, stats};
use crate::utils::{millis_to_utc_day, parse_iso8601_duration_to_seconds};
use reqwest::Client;
use rocket::serde::Serialize;
use serde_json::{json, Map, Value};

const FIELD_NOTE: &str = "Use the exact field name from the channel JSON. Common fields: \
    view_count, like_count, comment_count, duration (ISO 8601), release_date. For duration \
    you may need to parse to seconds.";

/// JSON-schema-style declaration an agent's function-calling layer binds
/// against. Names and required argument names are load-bearing; existing
/// agent configurations depend on them.
#[derive(Debug, Clone, Serialize)]
pub struct ToolDeclaration {
    pub name: &'static str,
    pub description: String,
    pub parameters: Value,
}

fn declaration(
    name: &'static str,
    description: &str,
    arg: &str,
    arg_description: &str,
) -> ToolDeclaration {
    ToolDeclaration {
        name,
        description: description.to_string(),
        parameters: json!({
            "type": "OBJECT",
            "properties": {
                arg: { "type": "STRING", "description": arg_description }
            },
            "required": [arg],
        }),
    }
}

pub fn tool_declarations() -> Vec<ToolDeclaration> {
    vec![
        declaration(
            "generate_image",
            "Generate an image from a text prompt. Use when the user asks to generate, \
             create, or make an image.",
            "prompt",
            "Detailed text prompt describing the image to generate.",
        ),
        declaration(
            "plot_metric_vs_time",
            "Plot any numeric field (view_count, like_count, comment_count, etc.) vs time \
             (release_date) for the loaded channel videos. Use when the user asks to plot, \
             graph, or visualize a metric over time.",
            "metric",
            &format!("Numeric field to plot on y-axis. {FIELD_NOTE}"),
        ),
        declaration(
            "play_video",
            "Open/play a video from the loaded channel data, shown as a clickable card \
             with title and thumbnail.",
            "selector",
            "How to pick the video: \"first\", \"second\", \"third\", \"1\", \"2\", etc. \
             for ordinal; \"most viewed\" for highest views; or a partial title match.",
        ),
        declaration(
            "get_transcript",
            "Get the transcript/captions of a video from the loaded channel data. Use when \
             the user asks for transcript, captions, or what was said in a video.",
            "selector",
            "How to pick the video: \"first\", \"second\", \"third\", \"1\", \"2\", etc., \
             or \"most viewed\".",
        ),
        declaration(
            "compute_stats_json",
            "Compute mean, median, std, min, max for any numeric field in the channel \
             JSON. Use when the user asks for statistics, average, distribution, or \
             summary of a numeric column.",
            "field",
            &format!("Exact field name from channel JSON. {FIELD_NOTE}"),
        ),
    ]
}

/// The channel document lives client-side, so invocations carry it along:
/// either the full document or a bare video array.
pub fn records_from_data(data: &Value) -> Vec<VideoRecord> {
    let list = match data {
        Value::Array(items) => items.as_slice(),
        Value::Object(map) => match map.get("videos").and_then(Value::as_array) {
            Some(items) => items.as_slice(),
            None => return Vec::new(),
        },
        _ => return Vec::new(),
    };
    list.iter()
        .filter_map(|item| serde_json::from_value(item.clone()).ok())
        .collect()
}

fn arg_string(args: &Map<String, Value>, name: &str) -> Option<String> {
    match args.get(name)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn missing_argument(tool: &str, name: &str) -> ToolOutcome {
    ToolOutcome::error(format!("Missing required argument \"{name}\" for {tool}"))
}

/// Route one named-tool invocation. Every path returns a `ToolOutcome`;
/// nothing here panics on user input.
pub async fn execute_tool(
    http: &Client,
    tool: &str,
    args: &Map<String, Value>,
    videos: &[VideoRecord],
) -> ToolOutcome {
    match tool {
        "compute_stats_json" => {
            let Some(field) = arg_string(args, "field") else {
                return missing_argument(tool, "field");
            };
            compute_stats(videos, &field)
        }
        "plot_metric_vs_time" => {
            let Some(metric) = arg_string(args, "metric") else {
                return missing_argument(tool, "metric");
            };
            plot_metric_vs_time(videos, &metric)
        }
        "play_video" => {
            let Some(sel) = arg_string(args, "selector") else {
                return missing_argument(tool, "selector");
            };
            play_video(videos, &sel)
        }
        "get_transcript" => {
            let Some(sel) = arg_string(args, "selector") else {
                return missing_argument(tool, "selector");
            };
            get_transcript(videos, &sel)
        }
        // The original agent configuration declared this one camelCase;
        // both spellings dispatch identically.
        "generate_image" | "generateImage" => {
            let Some(prompt) = arg_string(args, "prompt") else {
                return missing_argument(tool, "prompt");
            };
            match image_service::generate_image(http, &prompt, None).await {
                Ok(image) => ToolOutcome::Success(ToolPayload::Image(image)),
                Err(e) => ToolOutcome::error(format!("Image generation failed: {e}")),
            }
        }
        other => ToolOutcome::error(format!("Unknown tool: {other}")),
    }
}

fn compute_stats(videos: &[VideoRecord], field_arg: &str) -> ToolOutcome {
    let field = fields::resolve_field(videos, field_arg);
    match stats::summarize(videos, &field) {
        Ok(summary) => ToolOutcome::Success(ToolPayload::Stats(summary)),
        Err(error) => ToolOutcome::Error { error },
    }
}

fn plot_metric_vs_time(videos: &[VideoRecord], metric_arg: &str) -> ToolOutcome {
    let metric = fields::resolve_field(videos, metric_arg);

    let mut points: Vec<(i64, f64)> = videos
        .iter()
        .filter_map(|video| {
            let x = fields::date_millis(video)?;
            let y = plot_value(video, &metric)?;
            Some((x, y))
        })
        .collect();
    points.sort_by_key(|(x, _)| *x);

    if points.is_empty() {
        return ToolOutcome::error(format!(
            "No valid data for metric \"{metric}\" vs time. Check field name."
        ));
    }

    let data = points
        .into_iter()
        .filter_map(|(x, y)| millis_to_utc_day(x).map(|date| SeriesPoint { date, value: y }))
        .collect();
    ToolOutcome::Success(ToolPayload::Chart(MetricSeries {
        chart_type: "metric_vs_time",
        metric,
        data,
    }))
}

fn plot_value(video: &VideoRecord, metric: &str) -> Option<f64> {
    let raw = fields::metric_value(video, metric)?;
    let y = if metric == "duration" {
        raw.as_str().and_then(parse_iso8601_duration_to_seconds)?
    } else if let Some(n) = raw.as_f64() {
        n
    } else {
        raw.as_str()?.trim().parse::<f64>().ok()?
    };
    y.is_finite().then_some(y)
}

fn play_video(videos: &[VideoRecord], sel: &str) -> ToolOutcome {
    match selector::select_video(videos, sel) {
        Ok(video) => ToolOutcome::Success(ToolPayload::Playback(PlaybackCard {
            play_video: true,
            video_id: video.video_id.clone(),
            title: video.title.clone(),
            thumbnail_url: video.thumbnail_url.clone(),
            video_url: video.video_url.clone(),
        })),
        Err(error) => ToolOutcome::Error { error },
    }
}

fn get_transcript(videos: &[VideoRecord], sel: &str) -> ToolOutcome {
    match selector::select_video(videos, sel) {
        Ok(video) => match &video.transcript {
            Some(transcript) if !transcript.is_empty() => {
                ToolOutcome::Success(ToolPayload::Transcript(TranscriptResult {
                    video_id: video.video_id.clone(),
                    title: video.title.clone(),
                    transcript: Some(transcript.flatten()),
                    error: None,
                }))
            }
            // Partial success: the video was found, only its captions are
            // missing.
            _ => ToolOutcome::Success(ToolPayload::Transcript(TranscriptResult {
                video_id: video.video_id.clone(),
                title: video.title.clone(),
                transcript: None,
                error: Some("No transcript available for this video.".to_string()),
            })),
        },
        Err(error) => ToolOutcome::Error { error },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Transcript;

    fn videos() -> Vec<VideoRecord> {
        vec![
            VideoRecord {
                video_id: "v1".into(),
                title: "Intro".into(),
                view_count: 10,
                release_date: Some("2024-03-01T00:00:00Z".into()),
                transcript: Some(Transcript::Text("hello world".into())),
                video_url: "https://www.youtube.com/watch?v=v1".into(),
                ..Default::default()
            },
            VideoRecord {
                video_id: "v2".into(),
                title: "Deep Dive".into(),
                view_count: 50,
                release_date: Some("2024-01-15T00:00:00Z".into()),
                video_url: "https://www.youtube.com/watch?v=v2".into(),
                ..Default::default()
            },
            VideoRecord {
                video_id: "v3".into(),
                title: "Finale".into(),
                view_count: 5,
                // No release date: must be dropped from the time series.
                transcript: Some(Transcript::Segments(vec![])),
                video_url: "https://www.youtube.com/watch?v=v3".into(),
                ..Default::default()
            },
        ]
    }

    fn args(key: &str, value: &str) -> Map<String, Value> {
        let mut map = Map::new();
        map.insert(key.to_string(), json!(value));
        map
    }

    fn exactly_one_shape(outcome: &ToolOutcome) {
        let value = serde_json::to_value(outcome).unwrap();
        let has_error = value.get("error").is_some();
        let is_object = value.is_object();
        assert!(is_object);
        if has_error {
            assert_eq!(value.as_object().unwrap().len(), 1, "{value}");
        }
    }

    #[rocket::async_test]
    async fn dispatcher_covers_every_tool() {
        let http = Client::new();
        let videos = videos();
        let cases = [
            ("compute_stats_json", args("field", "views")),
            ("plot_metric_vs_time", args("metric", "view_count")),
            ("play_video", args("selector", "first")),
            ("get_transcript", args("selector", "1")),
            ("generate_image", args("prompt", "a tiny boat")),
        ];
        for (tool, a) in cases {
            let outcome = execute_tool(&http, tool, &a, &videos).await;
            exactly_one_shape(&outcome);
        }
    }

    #[rocket::async_test]
    async fn unknown_tool_and_missing_argument() {
        let http = Client::new();
        let videos = videos();
        let outcome = execute_tool(&http, "frobnicate", &Map::new(), &videos).await;
        let value = serde_json::to_value(&outcome).unwrap();
        assert_eq!(value["error"], json!("Unknown tool: frobnicate"));

        let outcome = execute_tool(&http, "compute_stats_json", &Map::new(), &videos).await;
        let value = serde_json::to_value(&outcome).unwrap();
        assert!(value["error"]
            .as_str()
            .unwrap()
            .contains("Missing required argument \"field\""));
    }

    #[test]
    fn stats_resolves_aliases() {
        let outcome = compute_stats(&videos(), "views");
        let value = serde_json::to_value(&outcome).unwrap();
        assert_eq!(value["field"], json!("view_count"));
        assert_eq!(value["count"], json!(3));
    }

    #[test]
    fn plot_sorts_buckets_and_drops_dateless_records() {
        let outcome = plot_metric_vs_time(&videos(), "views");
        let value = serde_json::to_value(&outcome).unwrap();
        assert_eq!(value["_chartType"], json!("metric_vs_time"));
        assert_eq!(value["metric"], json!("view_count"));
        // v3 has no date; v2 predates v1 so it comes first.
        assert_eq!(
            value["data"],
            json!([
                {"date": "2024-01-15", "value": 50.0},
                {"date": "2024-03-01", "value": 10.0},
            ])
        );
    }

    #[test]
    fn plot_duration_parses_to_seconds() {
        let mut videos = videos();
        videos[0].duration = Some("PT1M".into());
        videos[1].duration = Some("PT2M".into());
        let outcome = plot_metric_vs_time(&videos, "duration");
        let value = serde_json::to_value(&outcome).unwrap();
        assert_eq!(value["data"][0]["value"], json!(120.0));
        assert_eq!(value["data"][1]["value"], json!(60.0));
    }

    #[test]
    fn plot_with_no_points_names_the_metric() {
        let outcome = plot_metric_vs_time(&videos(), "description");
        let value = serde_json::to_value(&outcome).unwrap();
        assert!(value["error"].as_str().unwrap().contains("description"));
    }

    #[test]
    fn play_video_builds_a_card() {
        let outcome = play_video(&videos(), "most viewed");
        let value = serde_json::to_value(&outcome).unwrap();
        assert_eq!(value["_playVideo"], json!(true));
        assert_eq!(value["video_id"], json!("v2"));
    }

    #[test]
    fn transcript_partial_success_when_captions_missing() {
        let outcome = get_transcript(&videos(), "finale");
        let value = serde_json::to_value(&outcome).unwrap();
        assert_eq!(value["video_id"], json!("v3"));
        assert_eq!(value["transcript"], json!(null));
        assert_eq!(value["error"], json!("No transcript available for this video."));

        let outcome = get_transcript(&videos(), "first");
        let value = serde_json::to_value(&outcome).unwrap();
        assert_eq!(value["transcript"], json!("hello world"));
        assert!(value.get("error").is_none());
    }

    #[test]
    fn declarations_keep_required_argument_names() {
        let decls = tool_declarations();
        let required: Vec<(&str, String)> = decls
            .iter()
            .map(|d| {
                (
                    d.name,
                    d.parameters["required"][0].as_str().unwrap().to_string(),
                )
            })
            .collect();
        assert!(required.contains(&("compute_stats_json", "field".into())));
        assert!(required.contains(&("plot_metric_vs_time", "metric".into())));
        assert!(required.contains(&("play_video", "selector".into())));
        assert!(required.contains(&("get_transcript", "selector".into())));
        assert!(required.contains(&("generate_image", "prompt".into())));
    }

    #[test]
    fn records_from_document_or_bare_list() {
        let doc = json!({"channel_id": "c", "channel_title": "C", "videos": [{"video_id": "a"}]});
        assert_eq!(records_from_data(&doc).len(), 1);
        let bare = json!([{"video_id": "a"}, {"video_id": "b"}]);
        assert_eq!(records_from_data(&bare).len(), 2);
        assert!(records_from_data(&json!("nope")).is_empty());
    }
}
