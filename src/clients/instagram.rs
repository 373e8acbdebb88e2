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

/// Instagram scraper API; hashtag feed paginated by `max_id`.
const INSTAGRAM_API: &str = "https://instagram-scraper-api2.p.rapidapi.com";
const MAX_RESULTS: u32 = 30;

#[derive(Debug, Deserialize)]
struct HashtagResponse {
    data: Option<HashtagData>,
    pagination_token: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct HashtagData {
    #[serde(default)]
    items: Vec<InstagramPost>,
}

#[derive(Debug, Deserialize)]
pub struct InstagramPost {
    pub code: Option<String>,
    pub caption: Option<Caption>,
    pub user: Option<InstagramUser>,
    pub taken_at: Option<i64>,
    pub thumbnail_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Caption {
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct InstagramUser {
    pub username: Option<String>,
}

/// Instagram hashtags cannot contain whitespace or the leading `#`.
#[must_use]
pub fn hashtag_for(query: &str) -> String {
    query
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '#')
        .collect()
}

#[must_use]
pub fn normalize_instagram(post: InstagramPost) -> Option<EnrichedResult> {
    let code = post.code.filter(|c| !c.is_empty())?;
    let url = format!("https://www.instagram.com/p/{code}/");

    let title = post
        .caption
        .and_then(|c| c.text)
        .map(|t| truncate_chars(&t, 200))
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| url.clone());

    let published_at = post
        .taken_at
        .and_then(|secs| chrono::DateTime::from_timestamp(secs, 0));

    Some(
        EnrichedResult::new(Platform::Instagram, url, title)
            .with_thumbnail(post.thumbnail_url)
            .with_author(post.user.and_then(|u| u.username))
            .with_published_at(published_at),
    )
}

#[derive(Clone)]
pub struct InstagramClient {
    client: Client,
    config: ProviderConfig,
}

impl InstagramClient {
    #[must_use]
    pub const fn new(client: Client, config: ProviderConfig) -> Self {
        Self { client, config }
    }

    fn hashtag_url(&self, hashtag: &str, max_id: Option<&str>) -> Result<Url, ProviderError> {
        let base = format!("{}/v1/hashtag", self.config.base_url_or(INSTAGRAM_API));
        let mut url = Url::parse(&base)
            .map_err(|e| ProviderError::permanent(Platform::Instagram, e.to_string()))?;

        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("hashtag", hashtag);
            if let Some(max_id) = max_id {
                pairs.append_pair("max_id", max_id);
            }
        }

        Ok(url)
    }
}

#[async_trait]
impl SearchProvider for InstagramClient {
    fn platform(&self) -> Platform {
        Platform::Instagram
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
        _page_size: u32,
    ) -> Result<ProviderPage, ProviderError> {
        let hashtag = hashtag_for(query);
        if hashtag.is_empty() {
            return Err(ProviderError::permanent(
                Platform::Instagram,
                "query has no usable hashtag characters",
            ));
        }

        let max_id = continuation.and_then(ContinuationToken::as_text);
        let url = self.hashtag_url(&hashtag, max_id)?;

        let response = self
            .client
            .get(url)
            .header("x-rapidapi-key", self.config.api_key().unwrap_or_default())
            .send()
            .await
            .map_err(|e| request_error(Platform::Instagram, &e))?;
        let response = check_status(Platform::Instagram, response).await?;
        let body: HashtagResponse = response
            .json()
            .await
            .map_err(|e| request_error(Platform::Instagram, &e))?;

        let items: Vec<EnrichedResult> = body
            .data
            .unwrap_or_default()
            .items
            .into_iter()
            .filter_map(normalize_instagram)
            .collect();

        let next = body
            .pagination_token
            .filter(|t| !t.is_empty() && !items.is_empty())
            .map(ContinuationToken::MaxTimeId);

        Ok(ProviderPage {
            has_more: next.is_some(),
            items,
            next,
        })
    }
}
