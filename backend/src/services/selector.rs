use crate::models::VideoRecord;

/// Resolve a selector string to exactly one record. Resolution order:
/// "most viewed", ordinal words, a positive integer position, then a
/// case-insensitive title substring; anything else is an error. Both the
/// transcript and playback tools go through here so they cannot drift.
pub fn select_video<'a>(
    videos: &'a [VideoRecord],
    selector: &str,
) -> Result<&'a VideoRecord, String> {
    let sel = selector.trim().to_lowercase();

    if is_most_viewed(&sel) {
        // Stable sort keeps list order among tied view counts.
        let mut ordered: Vec<&VideoRecord> = videos.iter().collect();
        ordered.sort_by(|a, b| b.view_count.cmp(&a.view_count));
        if let Some(video) = ordered.first() {
            return Ok(video);
        }
    } else {
        let index = match sel.as_str() {
            "first" | "1st" | "1" => Some(0),
            "second" | "2nd" | "2" => Some(1),
            "third" | "3rd" | "3" => Some(2),
            _ => sel.parse::<usize>().ok().filter(|n| *n >= 1).map(|n| n - 1),
        };
        if let Some(idx) = index {
            if let Some(video) = videos.get(idx) {
                return Ok(video);
            }
        } else if let Some(video) = videos
            .iter()
            .find(|v| v.title.to_lowercase().contains(&sel))
        {
            return Ok(video);
        }
    }

    Err(format!(
        "Could not find video for selector \"{selector}\""
    ))
}

fn is_most_viewed(sel: &str) -> bool {
    sel.strip_prefix("most")
        .map(|rest| rest.trim_start() == "viewed")
        .unwrap_or(false)
}
