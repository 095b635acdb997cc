use chrono::{DateTime, Utc};

/// Parse an ISO8601 duration string (PT1H2M3S) to total seconds. Strings
/// without the PT prefix are not durations and yield None so callers can
/// exclude them instead of counting them as zero.
pub fn parse_iso8601_duration_to_seconds(duration_str: &str) -> Option<f64> {
    if !duration_str.starts_with("PT") {
        return None;
    }

    let duration_part = &duration_str[2..]; // Remove "PT"
    let mut total_seconds = 0.0;
    let mut current_number = String::new();

    for ch in duration_part.chars() {
        if ch.is_ascii_digit() || ch == '.' {
            current_number.push(ch);
        } else {
            if let Ok(num) = current_number.parse::<f64>() {
                match ch {
                    'H' => total_seconds += num * 3600.0, // Hours
                    'M' => total_seconds += num * 60.0,   // Minutes
                    'S' => total_seconds += num,          // Seconds
                    _ => {}
                }
            }
            current_number.clear();
        }
    }

    Some(total_seconds)
}

/// Parse an ISO8601/RFC3339 date string to Unix milliseconds.
pub fn parse_iso8601_to_millis(date_str: &str) -> Option<i64> {
    if date_str.is_empty() {
        return None;
    }

    if let Ok(dt) = date_str.parse::<DateTime<Utc>>() {
        return Some(dt.timestamp_millis());
    }

    None
}

/// Format Unix milliseconds as a UTC calendar day (YYYY-MM-DD).
pub fn millis_to_utc_day(millis: i64) -> Option<String> {
    DateTime::<Utc>::from_timestamp_millis(millis).map(|dt| dt.format("%Y-%m-%d").to_string())
}

/// Lowercase and strip whitespace/underscores/hyphens, so "View Count",
/// "view_count" and "view-count" all compare equal.
pub fn normalize_key(name: &str) -> String {
    name.chars()
        .filter(|c| !c.is_whitespace() && *c != '_' && *c != '-')
        .collect::<String>()
        .to_lowercase()
}

pub fn extract_youtube_video_id(url: &str) -> Option<String> {
    if let Some(captures) = regex::Regex::new(
        r"(?:youtube\.com/watch\?v=|youtu\.be/|youtube\.com/embed/)([a-zA-Z0-9_-]{11})",
    )
    .ok()?
    .captures(url)
    {
        return captures.get(1).map(|m| m.as_str().to_string());
    }
    None
}
