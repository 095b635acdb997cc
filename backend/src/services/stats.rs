use crate::models::{StatsSummary, VideoRecord};
use crate::utils::{parse_iso8601_duration_to_seconds, parse_iso8601_to_millis};

/// Extract the numeric series for a resolved field. Numbers pass through;
/// durations become seconds, release dates become epoch millis; anything
/// unparseable is excluded rather than counted as zero.
pub fn numeric_values(videos: &[VideoRecord], field: &str) -> Vec<f64> {
    videos
        .iter()
        .filter_map(|record| extract_numeric(record, field))
        .collect()
}

fn extract_numeric(record: &VideoRecord, field: &str) -> Option<f64> {
    let value = record.field(field)?;
    if let Some(n) = value.as_f64() {
        return Some(n);
    }
    let s = value.as_str()?;
    if field == "duration" {
        return parse_iso8601_duration_to_seconds(s);
    }
    if field == "release_date" {
        return parse_iso8601_to_millis(s).map(|ms| ms as f64);
    }
    s.trim().parse::<f64>().ok()
}

pub fn round4(n: f64) -> f64 {
    (n * 10_000.0).round() / 10_000.0
}

/// Descriptive statistics over a resolved field: count, mean, median,
/// population standard deviation, min, max. Zero extractable values is an
/// error naming the field and the keys that were available.
pub fn summarize(videos: &[VideoRecord], field: &str) -> Result<StatsSummary, String> {
    let values = numeric_values(videos, field);
    if values.is_empty() {
        let available = videos
            .first()
            .map(|v| v.field_keys().join(", "))
            .unwrap_or_default();
        return Err(format!(
            "No numeric values for field \"{field}\". Available: {available}"
        ));
    }

    let count = values.len();
    let mean = values.iter().sum::<f64>() / count as f64;

    let mut sorted = values.clone();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let median = if count % 2 == 0 {
        (sorted[count / 2 - 1] + sorted[count / 2]) / 2.0
    } else {
        sorted[count / 2]
    };

    // Population variance: divide by count, not count - 1.
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / count as f64;

    Ok(StatsSummary {
        field: field.to_string(),
        count,
        mean: round4(mean),
        median: round4(median),
        std: round4(variance.sqrt()),
        min: sorted[0],
        max: sorted[count - 1],
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record_with_views(views: i64) -> VideoRecord {
        VideoRecord {
            view_count: views,
            ..Default::default()
        }
    }

    #[test]
    fn summary_over_one_to_four() {
        let videos: Vec<VideoRecord> = [1, 2, 3, 4].iter().map(|v| record_with_views(*v)).collect();
        let stats = summarize(&videos, "view_count").unwrap();
        assert_eq!(stats.count, 4);
        assert_eq!(stats.mean, 2.5);
        assert_eq!(stats.median, 2.5);
        assert_eq!(stats.std, 1.118); // sqrt(1.25) rounded to 4 decimals
        assert_eq!(stats.min, 1.0);
        assert_eq!(stats.max, 4.0);
    }

    #[test]
    fn odd_count_median() {
        let videos: Vec<VideoRecord> = [5, 1, 9].iter().map(|v| record_with_views(*v)).collect();
        let stats = summarize(&videos, "view_count").unwrap();
        assert_eq!(stats.median, 5.0);
    }

    #[test]
    fn durations_become_seconds_and_junk_is_excluded() {
        let videos = vec![
            VideoRecord {
                duration: Some("PT1H2M3S".into()),
                ..Default::default()
            },
            VideoRecord {
                duration: Some("PT45S".into()),
                ..Default::default()
            },
            VideoRecord {
                duration: Some("1:02:03".into()),
                ..Default::default()
            },
            VideoRecord::default(), // no duration at all
        ];
        assert_eq!(numeric_values(&videos, "duration"), vec![3723.0, 45.0]);
    }

    #[test]
    fn release_dates_become_millis() {
        let videos = vec![
            VideoRecord {
                release_date: Some("1970-01-01T00:00:01Z".into()),
                ..Default::default()
            },
            VideoRecord {
                release_date: Some("never".into()),
                ..Default::default()
            },
        ];
        assert_eq!(numeric_values(&videos, "release_date"), vec![1000.0]);
    }

    #[test]
    fn generic_string_numbers_parse() {
        let mut video = VideoRecord::default();
        video.extra.insert("score".into(), serde_json::json!("12.5"));
        let mut junk = VideoRecord::default();
        junk.extra.insert("score".into(), serde_json::json!("high"));
        assert_eq!(numeric_values(&[video, junk], "score"), vec![12.5]);
    }

    #[test]
    fn empty_extraction_is_an_error_naming_the_field() {
        let videos = vec![VideoRecord::default()];
        let err = summarize(&videos, "description").unwrap_err();
        assert!(err.contains("No numeric values for field \"description\""));
        assert!(err.contains("view_count"));
    }
}
