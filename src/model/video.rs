use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// A video record with the detail fields needed for filtering and display.
/// Snapshot data owned by the sync pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Video {
    pub video_id: String,
    pub title: String,
    #[serde(default)]
    pub thumbnail: String,
    pub channel_id: String,
    #[serde(default)]
    pub channel_title: String,
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
    /// ISO-8601 duration as returned by the API, e.g. `PT4M13S`.
    #[serde(default)]
    pub duration: String,
    #[serde(default)]
    pub view_count: u64,
}

impl Video {
    pub fn duration_secs(&self) -> u64 {
        parse_iso8601_duration(&self.duration)
    }

    /// Short-form clip: at most 60 seconds, or tagged `#shorts` in the title.
    pub fn is_short(&self) -> bool {
        self.duration_secs() <= 60 || self.title.to_lowercase().contains("#shorts")
    }
}

fn duration_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"PT(?:(\d+)H)?(?:(\d+)M)?(?:(\d+)S)?").expect("valid regex"))
}

/// Parse an ISO-8601 duration of the `PT#H#M#S` form into seconds.
/// Anything unparseable counts as zero seconds.
pub fn parse_iso8601_duration(iso: &str) -> u64 {
    let Some(caps) = duration_re().captures(iso) else {
        return 0;
    };
    let field = |i: usize| {
        caps.get(i)
            .and_then(|m| m.as_str().parse::<u64>().ok())
            .unwrap_or(0)
    };
    field(1) * 3600 + field(2) * 60 + field(3)
}

/// Render an ISO-8601 duration as `m:ss` or `h:mm:ss`.
pub fn format_duration(iso: &str) -> String {
    let total = parse_iso8601_duration(iso);
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let seconds = total % 60;
    if hours > 0 {
        format!("{hours}:{minutes:02}:{seconds:02}")
    } else {
        format!("{minutes}:{seconds:02}")
    }
}

/// Render a view count as `1.2M views` / `3.4K views` / `512 views`.
pub fn format_view_count(count: u64) -> String {
    if count >= 1_000_000 {
        format!("{:.1}M views", count as f64 / 1_000_000.0)
    } else if count >= 1_000 {
        format!("{:.1}K views", count as f64 / 1_000.0)
    } else {
        format!("{count} views")
    }
}
