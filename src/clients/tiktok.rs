use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use url::Url;

use super::{
    ProviderError, ProviderPage, SearchProvider, check_status, request_error, truncate_chars,
};
use crate::config::ProviderConfig;
use crate::models::{ContinuationToken, EnrichedResult, Platform};

/// TikTok scraper API; keyword search paginated by item offset.
const TIKTOK_API: &str = "https://tiktok-scraper7.p.rapidapi.com";
const MAX_RESULTS: u32 = 30;

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    code: i32,
    #[serde(default)]
    msg: String,
    data: Option<SearchData>,
}

#[derive(Debug, Default, Deserialize)]
struct SearchData {
    #[serde(default)]
    videos: Vec<TiktokVideo>,
    cursor: Option<u32>,
    #[serde(rename = "hasMore", default)]
    has_more: bool,
}

#[derive(Debug, Deserialize)]
pub struct TiktokVideo {
    pub video_id: Option<String>,
    pub title: Option<String>,
    pub cover: Option<String>,
    pub create_time: Option<i64>,
    pub author: Option<TiktokAuthor>,
}

#[derive(Debug, Deserialize)]
pub struct TiktokAuthor {
    pub unique_id: Option<String>,
}

#[must_use]
pub fn normalize_tiktok(video: TiktokVideo) -> Option<EnrichedResult> {
    let video_id = video.video_id.filter(|id| !id.is_empty())?;
    let author = video
        .author
        .and_then(|a| a.unique_id)
        .filter(|a| !a.is_empty());

    let url = match &author {
        Some(handle) => format!("https://www.tiktok.com/@{handle}/video/{video_id}"),
        None => format!("https://www.tiktok.com/video/{video_id}"),
    };

    let title = video
        .title
        .map(|t| truncate_chars(&t, 200))
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| url.clone());

    let published_at = video
        .create_time
        .and_then(|secs| chrono::DateTime::from_timestamp(secs, 0));

    Some(
        EnrichedResult::new(Platform::Tiktok, url, title)
            .with_thumbnail(video.cover)
            .with_author(author)
            .with_published_at(published_at),
    )
}

#[derive(Clone)]
pub struct TiktokClient {
    client: Client,
    config: ProviderConfig,
}

impl TiktokClient {
    #[must_use]
    pub const fn new(client: Client, config: ProviderConfig) -> Self {
        Self { client, config }
    }

    fn search_url(&self, query: &str, offset: u32, count: u32) -> Result<Url, ProviderError> {
        let base = format!("{}/feed/search", self.config.base_url_or(TIKTOK_API));
        let mut url = Url::parse(&base)
            .map_err(|e| ProviderError::permanent(Platform::Tiktok, e.to_string()))?;

        url.query_pairs_mut()
            .append_pair("keywords", query)
            .append_pair("count", &count.to_string())
            .append_pair("cursor", &offset.to_string());

        Ok(url)
    }
}

#[async_trait]
impl SearchProvider for TiktokClient {
    fn platform(&self) -> Platform {
        Platform::Tiktok
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
        let offset = continuation
            .and_then(ContinuationToken::as_number)
            .unwrap_or(0);
        let url = self.search_url(query, offset, page_size)?;

        let response = self
            .client
            .get(url)
            .header("x-rapidapi-key", self.config.api_key().unwrap_or_default())
            .send()
            .await
            .map_err(|e| request_error(Platform::Tiktok, &e))?;
        let response = check_status(Platform::Tiktok, response).await?;
        let body: SearchResponse = response
            .json()
            .await
            .map_err(|e| request_error(Platform::Tiktok, &e))?;

        if body.code != 0 {
            return Err(ProviderError::permanent(
                Platform::Tiktok,
                format!("code {}: {}", body.code, body.msg),
            ));
        }

        let data = body.data.unwrap_or_default();
        let fetched = u32::try_from(data.videos.len()).unwrap_or(u32::MAX);
        let items: Vec<EnrichedResult> =
            data.videos.into_iter().filter_map(normalize_tiktok).collect();

        let next_offset = data
            .cursor
            .unwrap_or_else(|| offset.saturating_add(fetched));
        let has_more = data.has_more && fetched > 0;

        Ok(ProviderPage {
            items,
            next: has_more.then_some(ContinuationToken::Offset(next_offset)),
            has_more,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_video() {
        let video: TiktokVideo = serde_json::from_value(serde_json::json!({
            "video_id": "7300000000000000000",
            "title": "leeseo fancam #ive",
            "cover": "https://p16-sign.tiktokcdn.com/c.jpg",
            "create_time": 1_700_000_000,
            "author": {"unique_id": "ivestarship"}
        }))
        .unwrap();

        let result = normalize_tiktok(video).unwrap();
        assert_eq!(
            result.url,
            "https://www.tiktok.com/@ivestarship/video/7300000000000000000"
        );
        assert_eq!(result.author.as_deref(), Some("ivestarship"));
        assert!(result.thumbnail.is_some());
    }

    #[test]
    fn test_normalize_requires_video_id() {
        let video: TiktokVideo =
            serde_json::from_value(serde_json::json!({"title": "no id"})).unwrap();
        assert!(normalize_tiktok(video).is_none());
    }

    #[test]
    fn test_search_url_uses_offset() {
        let client = TiktokClient::new(Client::new(), ProviderConfig::default());
        let url = client.search_url("aespa", 60, 30).unwrap();
        let query = url.query().unwrap();
        assert!(query.contains("cursor=60"));
        assert!(query.contains("count=30"));
    }
}
