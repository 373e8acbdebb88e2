use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use url::Url;

use super::{ProviderError, ProviderPage, SearchProvider, check_status, request_error};
use crate::config::ProviderConfig;
use crate::models::result::parse_timestamp;
use crate::models::{ContinuationToken, EnrichedResult, Platform};

const YOUTUBE_API: &str = "https://www.googleapis.com/youtube/v3";
const MAX_RESULTS: u32 = 50;

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<YoutubeItem>,
    #[serde(rename = "nextPageToken")]
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct YoutubeItem {
    pub id: YoutubeId,
    pub snippet: Option<Snippet>,
}

#[derive(Debug, Deserialize)]
pub struct YoutubeId {
    #[serde(rename = "videoId")]
    pub video_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Snippet {
    pub title: Option<String>,
    #[serde(rename = "channelTitle")]
    pub channel_title: Option<String>,
    #[serde(rename = "publishedAt")]
    pub published_at: Option<String>,
    pub thumbnails: Option<Thumbnails>,
}

#[derive(Debug, Deserialize)]
pub struct Thumbnails {
    pub high: Option<Thumbnail>,
    pub medium: Option<Thumbnail>,
    pub default: Option<Thumbnail>,
}

#[derive(Debug, Deserialize)]
pub struct Thumbnail {
    pub url: String,
}

/// Items without a video id (channels, playlists) have no archivable URL and are dropped.
#[must_use]
pub fn normalize_youtube(item: YoutubeItem) -> Option<EnrichedResult> {
    let video_id = item.id.video_id.filter(|id| !id.is_empty())?;
    let snippet = item.snippet;

    let title = snippet
        .as_ref()
        .and_then(|s| s.title.as_deref())
        .map(|t| html_escape::decode_html_entities(t).to_string())
        .unwrap_or_else(|| video_id.clone());

    let thumbnail = snippet
        .as_ref()
        .and_then(|s| s.thumbnails.as_ref())
        .and_then(|t| t.high.as_ref().or(t.medium.as_ref()).or(t.default.as_ref()))
        .map(|t| t.url.clone());

    let author = snippet.as_ref().and_then(|s| s.channel_title.clone());
    let published_at = snippet
        .as_ref()
        .and_then(|s| s.published_at.as_deref())
        .and_then(parse_timestamp);

    Some(
        EnrichedResult::new(
            Platform::Youtube,
            format!("https://www.youtube.com/watch?v={video_id}"),
            title,
        )
        .with_thumbnail(thumbnail)
        .with_author(author)
        .with_published_at(published_at),
    )
}

#[derive(Clone)]
pub struct YoutubeClient {
    client: Client,
    config: ProviderConfig,
}

impl YoutubeClient {
    #[must_use]
    pub const fn new(client: Client, config: ProviderConfig) -> Self {
        Self { client, config }
    }

    fn search_url(
        &self,
        query: &str,
        page_token: Option<&str>,
        page_size: u32,
    ) -> Result<Url, ProviderError> {
        let base = format!("{}/search", self.config.base_url_or(YOUTUBE_API));
        let mut url = Url::parse(&base)
            .map_err(|e| ProviderError::permanent(Platform::Youtube, e.to_string()))?;

        {
            let mut pairs = url.query_pairs_mut();
            pairs
                .append_pair("part", "snippet")
                .append_pair("type", "video")
                .append_pair("q", query)
                .append_pair("maxResults", &page_size.to_string())
                .append_pair("key", self.config.api_key().unwrap_or_default());
            if let Some(token) = page_token {
                pairs.append_pair("pageToken", token);
            }
        }

        Ok(url)
    }
}

#[async_trait]
impl SearchProvider for YoutubeClient {
    fn platform(&self) -> Platform {
        Platform::Youtube
    }

    fn is_configured(&self) -> bool {
        self.config.enabled && self.config.api_key().is_some()
    }

    fn max_page_size(&self) -> u32 {
        MAX_RESULTS
    }

    fn timeout(&self) -> Duration {
        self.config.timeout()
    }

    async fn request_page(
        &self,
        query: &str,
        continuation: Option<&ContinuationToken>,
        page_size: u32,
    ) -> Result<ProviderPage, ProviderError> {
        let page_token = continuation.and_then(ContinuationToken::as_text);
        let url = self.search_url(query, page_token, page_size)?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| request_error(Platform::Youtube, &e))?;
        let response = check_status(Platform::Youtube, response).await?;
        let body: SearchResponse = response
            .json()
            .await
            .map_err(|e| request_error(Platform::Youtube, &e))?;

        let items: Vec<EnrichedResult> =
            body.items.into_iter().filter_map(normalize_youtube).collect();
        let next = body
            .next_page_token
            .filter(|t| !t.is_empty())
            .map(ContinuationToken::PageToken);

        Ok(ProviderPage {
            has_more: next.is_some(),
            items,
            next,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_full_item() {
        let item: YoutubeItem = serde_json::from_value(serde_json::json!({
            "id": {"kind": "youtube#video", "videoId": "abc123"},
            "snippet": {
                "title": "IVE &#39;I AM&#39; 직캠",
                "channelTitle": "fancam channel",
                "publishedAt": "2024-05-01T10:00:00Z",
                "thumbnails": {"default": {"url": "https://i.ytimg.com/d.jpg"},
                               "high": {"url": "https://i.ytimg.com/h.jpg"}}
            }
        }))
        .unwrap();

        let result = normalize_youtube(item).unwrap();
        assert_eq!(result.url, "https://www.youtube.com/watch?v=abc123");
        assert_eq!(result.title, "IVE 'I AM' 직캠");
        assert_eq!(result.thumbnail.as_deref(), Some("https://i.ytimg.com/h.jpg"));
        assert_eq!(result.author.as_deref(), Some("fancam channel"));
        assert!(result.published_at.is_some());
        assert!(!result.is_saved);
    }

    #[test]
    fn test_normalize_tolerates_missing_snippet() {
        let item: YoutubeItem =
            serde_json::from_value(serde_json::json!({"id": {"videoId": "xyz"}})).unwrap();
        let result = normalize_youtube(item).unwrap();
        assert_eq!(result.title, "xyz");
        assert!(result.thumbnail.is_none());
        assert!(result.author.is_none());
    }

    #[test]
    fn test_normalize_skips_channels() {
        let item: YoutubeItem = serde_json::from_value(
            serde_json::json!({"id": {"kind": "youtube#channel", "channelId": "c"}}),
        )
        .unwrap();
        assert!(normalize_youtube(item).is_none());
    }

    #[test]
    fn test_search_url_carries_page_token() {
        let config = ProviderConfig {
            api_key: Some("k".to_string()),
            ..Default::default()
        };
        let client = YoutubeClient::new(Client::new(), config);
        let url = client.search_url("ive 직캠", Some("abc"), 25).unwrap();
        let query = url.query().unwrap();
        assert!(query.contains("pageToken=abc"));
        assert!(query.contains("maxResults=25"));
        assert!(client.is_configured());
    }

    #[test]
    fn test_missing_key_is_unconfigured() {
        let client = YoutubeClient::new(Client::new(), ProviderConfig::default());
        assert!(!client.is_configured());
    }
}
