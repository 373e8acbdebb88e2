use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use url::Url;

use super::{
    ProviderError, ProviderPage, SearchProvider, check_status, request_error, truncate_chars,
};
use crate::config::ProviderConfig;
use crate::models::result::parse_timestamp;
use crate::models::{ContinuationToken, EnrichedResult, Platform};

/// Twitter-compatible search API (RapidAPI style, cursor paginated).
const TWITTER_API: &str = "https://twitter-api45.p.rapidapi.com";
const MAX_RESULTS: u32 = 20;

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    timeline: Vec<Tweet>,
    next_cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Tweet {
    pub tweet_id: Option<String>,
    pub screen_name: Option<String>,
    pub text: Option<String>,
    pub created_at: Option<String>,
    pub media: Option<TweetMedia>,
}

#[derive(Debug, Default, Deserialize)]
pub struct TweetMedia {
    #[serde(default)]
    pub photo: Vec<MediaUrl>,
    #[serde(default)]
    pub video: Vec<MediaUrl>,
}

#[derive(Debug, Deserialize)]
pub struct MediaUrl {
    pub media_url_https: Option<String>,
}

#[must_use]
pub fn normalize_tweet(tweet: Tweet) -> Option<EnrichedResult> {
    let tweet_id = tweet.tweet_id.filter(|id| !id.is_empty())?;
    let screen_name = tweet.screen_name.filter(|s| !s.is_empty());

    let url = match &screen_name {
        Some(name) => format!("https://x.com/{name}/status/{tweet_id}"),
        None => format!("https://x.com/i/status/{tweet_id}"),
    };

    let title = tweet
        .text
        .as_deref()
        .map(|t| truncate_chars(&html_escape::decode_html_entities(t), 200))
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| url.clone());

    let thumbnail = tweet.media.and_then(|m| {
        m.photo
            .into_iter()
            .chain(m.video)
            .find_map(|u| u.media_url_https)
    });

    let published_at = tweet.created_at.as_deref().and_then(parse_timestamp);

    Some(
        EnrichedResult::new(Platform::Twitter, url, title)
            .with_thumbnail(thumbnail)
            .with_author(screen_name)
            .with_published_at(published_at),
    )
}

#[derive(Clone)]
pub struct TwitterClient {
    client: Client,
    config: ProviderConfig,
}

impl TwitterClient {
    #[must_use]
    pub const fn new(client: Client, config: ProviderConfig) -> Self {
        Self { client, config }
    }

    fn search_url(&self, query: &str, cursor: Option<&str>) -> Result<Url, ProviderError> {
        let base = format!("{}/search.php", self.config.base_url_or(TWITTER_API));
        let mut url = Url::parse(&base)
            .map_err(|e| ProviderError::permanent(Platform::Twitter, e.to_string()))?;

        {
            let mut pairs = url.query_pairs_mut();
            pairs
                .append_pair("query", query)
                .append_pair("search_type", "Latest");
            if let Some(cursor) = cursor {
                pairs.append_pair("cursor", cursor);
            }
        }

        Ok(url)
    }
}

#[async_trait]
impl SearchProvider for TwitterClient {
    fn platform(&self) -> Platform {
        Platform::Twitter
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
        // Fixed-size pages; the cursor addresses the provider's page, not an item.
        let cursor = continuation.and_then(ContinuationToken::as_text);
        let url = self.search_url(query, cursor)?;

        let response = self
            .client
            .get(url)
            .header("x-rapidapi-key", self.config.api_key().unwrap_or_default())
            .send()
            .await
            .map_err(|e| request_error(Platform::Twitter, &e))?;
        let response = check_status(Platform::Twitter, response).await?;
        let body: SearchResponse = response
            .json()
            .await
            .map_err(|e| request_error(Platform::Twitter, &e))?;

        let items: Vec<EnrichedResult> = body
            .timeline
            .into_iter()
            .filter_map(normalize_tweet)
            .collect();

        let next = if items.is_empty() {
            None
        } else {
            body.next_cursor
                .filter(|c| !c.is_empty())
                .map(ContinuationToken::Cursor)
        };

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
    fn test_normalize_tweet_with_media() {
        let tweet: Tweet = serde_json::from_value(serde_json::json!({
            "tweet_id": "1790000000000000000",
            "screen_name": "ive_official",
            "text": "오늘 무대 &amp; 직캠",
            "created_at": "Wed Oct 10 20:19:24 +0000 2018",
            "media": {"photo": [{"media_url_https": "https://pbs.twimg.com/media/a.jpg"}]}
        }))
        .unwrap();

        let result = normalize_tweet(tweet).unwrap();
        assert_eq!(result.url, "https://x.com/ive_official/status/1790000000000000000");
        assert_eq!(result.title, "오늘 무대 & 직캠");
        assert_eq!(result.thumbnail.as_deref(), Some("https://pbs.twimg.com/media/a.jpg"));
        assert_eq!(result.author.as_deref(), Some("ive_official"));
        assert!(result.published_at.is_some());
    }

    #[test]
    fn test_normalize_tweet_without_optionals() {
        let tweet: Tweet = serde_json::from_value(serde_json::json!({"tweet_id": "42"})).unwrap();
        let result = normalize_tweet(tweet).unwrap();
        assert_eq!(result.url, "https://x.com/i/status/42");
        assert!(result.author.is_none());
        assert!(result.thumbnail.is_none());
        assert!(result.published_at.is_none());
    }

    #[test]
    fn test_search_url_carries_cursor() {
        let client = TwitterClient::new(Client::new(), ProviderConfig::default());
        let url = client.search_url("aespa", Some("DAACCgAC")).unwrap();
        assert!(url.as_str().contains("cursor=DAACCgAC"));
        assert!(!client.is_configured());
    }
}
