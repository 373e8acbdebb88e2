use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::platform::Platform;

/// A single search hit in the shape every platform is normalized into.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrichedResult {
    pub url: String,
    pub title: String,
    pub thumbnail: Option<String>,
    pub author: Option<String>,
    pub platform: Platform,
    pub published_at: Option<DateTime<Utc>>,
    /// UI-transient flags, always written as `false`.
    #[serde(default)]
    pub is_saved: bool,
    #[serde(default)]
    pub is_saving: bool,
}

impl EnrichedResult {
    #[must_use]
    pub fn new(platform: Platform, url: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: title.into(),
            thumbnail: None,
            author: None,
            platform,
            published_at: None,
            is_saved: false,
            is_saving: false,
        }
    }

    #[must_use]
    pub fn with_thumbnail(mut self, thumbnail: Option<String>) -> Self {
        self.thumbnail = thumbnail.filter(|t| !t.trim().is_empty());
        self
    }

    #[must_use]
    pub fn with_author(mut self, author: Option<String>) -> Self {
        self.author = author.filter(|a| !a.trim().is_empty());
        self
    }

    #[must_use]
    pub const fn with_published_at(mut self, published_at: Option<DateTime<Utc>>) -> Self {
        self.published_at = published_at;
        self
    }
}

/// Parses the timestamp formats providers hand back (RFC 3339, RFC 2822, unix seconds).
#[must_use]
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }

    if let Ok(dt) = DateTime::parse_from_rfc2822(raw) {
        return Some(dt.with_timezone(&Utc));
    }

    // Twitter style: "Wed Oct 10 20:19:24 +0000 2018"
    if let Ok(dt) = DateTime::parse_from_str(raw, "%a %b %d %H:%M:%S %z %Y") {
        return Some(dt.with_timezone(&Utc));
    }

    raw.parse::<i64>()
        .ok()
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_result_starts_unsaved() {
        let result = EnrichedResult::new(Platform::Youtube, "https://youtu.be/x", "title");
        assert!(!result.is_saved);
        assert!(!result.is_saving);
        assert!(result.thumbnail.is_none());
    }

    #[test]
    fn test_blank_optionals_become_none() {
        let result = EnrichedResult::new(Platform::Theqoo, "u", "t")
            .with_author(Some("  ".to_string()))
            .with_thumbnail(Some(String::new()));
        assert!(result.author.is_none());
        assert!(result.thumbnail.is_none());
    }

    #[test]
    fn test_parse_timestamp_formats() {
        assert!(parse_timestamp("2024-05-01T10:00:00Z").is_some());
        assert!(parse_timestamp("Wed Oct 10 20:19:24 +0000 2018").is_some());
        assert_eq!(
            parse_timestamp("1700000000").map(|d| d.timestamp()),
            Some(1_700_000_000)
        );
        assert!(parse_timestamp("yesterday").is_none());
        assert!(parse_timestamp("").is_none());
    }
}
