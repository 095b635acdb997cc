use crate::models::VideoRecord;
use crate::utils::{normalize_key, parse_iso8601_to_millis};
use serde_json::Value;

/// Canonical names for the metric shorthands users actually type.
fn metric_alias(normalized: &str) -> Option<&'static str> {
    match normalized {
        "views" | "viewcount" | "viewcounts" => Some("view_count"),
        "likes" | "likecount" | "likecounts" => Some("like_count"),
        "comments" | "commentcount" | "commentcounts" => Some("comment_count"),
        _ => None,
    }
}

/// Known snake_case persisted names and their camelCase display twins.
const SNAKE_TO_CAMEL: &[(&str, &str)] = &[
    ("view_count", "viewCount"),
    ("like_count", "likeCount"),
    ("comment_count", "commentCount"),
    ("release_date", "releaseDate"),
];

/// Resolve a user-supplied field name against the keys actually present on
/// the records: verbatim match, then alias table, then normalized key scan,
/// then the unverified alias, and finally the request echoed back unchanged
/// (downstream extraction fails gracefully on a bad name).
pub fn resolve_field(videos: &[VideoRecord], name: &str) -> String {
    let Some(first) = videos.first() else {
        return name.to_string();
    };
    let keys = first.field_keys();

    if keys.iter().any(|k| k == name) {
        return name.to_string();
    }

    let target = normalize_key(name);
    let aliased = metric_alias(&target);
    if let Some(alias) = aliased {
        if keys.iter().any(|k| k == alias) {
            return alias.to_string();
        }
    }
    if let Some(found) = keys.iter().find(|k| normalize_key(k) == target) {
        return found.clone();
    }
    if let Some(alias) = aliased {
        return alias.to_string();
    }
    name.to_string()
}

/// Look up a field value, bridging snake_case and camelCase spellings for
/// the known counter/date synonyms.
pub fn metric_value(record: &VideoRecord, field: &str) -> Option<Value> {
    if let Some(value) = record.field(field) {
        return Some(value);
    }
    if let Some((_, camel)) = SNAKE_TO_CAMEL.iter().find(|(snake, _)| *snake == field) {
        if let Some(value) = record.field(camel) {
            return Some(value);
        }
    }
    if let Some((snake, _)) = SNAKE_TO_CAMEL.iter().find(|(_, camel)| *camel == field) {
        if let Some(value) = record.field(snake) {
            return Some(value);
        }
    }
    None
}

/// Release timestamp in Unix milliseconds, trying the date spellings seen
/// in the wild.
pub fn date_millis(record: &VideoRecord) -> Option<i64> {
    for key in ["release_date", "releaseDate", "publishedAt", "published_at"] {
        if let Some(value) = record.field(key) {
            if let Some(millis) = value.as_str().and_then(parse_iso8601_to_millis) {
                return Some(millis);
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn records() -> Vec<VideoRecord> {
        vec![VideoRecord {
            video_id: "a".into(),
            title: "Intro".into(),
            view_count: 10,
            release_date: Some("2024-01-02T00:00:00Z".into()),
            ..Default::default()
        }]
    }

    #[test]
    fn verbatim_key_passes_through() {
        assert_eq!(resolve_field(&records(), "view_count"), "view_count");
        assert_eq!(resolve_field(&records(), "title"), "title");
    }

    #[test]
    fn alias_pairs_resolve_to_canonical_key() {
        let videos = records();
        for requested in ["views", "Views", "view count", "viewCount", "view-count"] {
            assert_eq!(resolve_field(&videos, requested), "view_count", "{requested}");
        }
        assert_eq!(resolve_field(&videos, "likes"), "like_count");
        assert_eq!(resolve_field(&videos, "comments"), "comment_count");
    }

    #[test]
    fn normalized_extension_key_matches() {
        let mut videos = records();
        videos[0]
            .extra
            .insert("favorite_count".into(), serde_json::json!(3));
        assert_eq!(resolve_field(&videos, "Favorite Count"), "favorite_count");
    }

    #[test]
    fn unknown_name_is_echoed() {
        assert_eq!(resolve_field(&records(), "nonsense"), "nonsense");
        assert_eq!(resolve_field(&[], "views"), "views");
    }

    #[test]
    fn camel_case_value_bridging() {
        let mut videos = records();
        videos[0].extra.insert("likeCount".into(), serde_json::json!(7));
        // like_count is a typed field (0), so the typed value wins; an
        // unknown camel spelling still resolves through the bridge.
        assert_eq!(
            metric_value(&videos[0], "likeCount").and_then(|v| v.as_i64()),
            Some(7)
        );
    }

    #[test]
    fn date_millis_prefers_release_date_then_camel() {
        let videos = records();
        assert_eq!(date_millis(&videos[0]), Some(1_704_153_600_000));

        let mut no_snake = VideoRecord::default();
        no_snake
            .extra
            .insert("publishedAt".into(), serde_json::json!("1970-01-01T00:00:01Z"));
        assert_eq!(date_millis(&no_snake), Some(1000));
    }
}
