//! Search provider adapters.
//!
//! Every adapter wraps one external source and one pagination scheme. The
//! shared [`SearchProvider::fetch_page`] entry point handles the rules common
//! to all of them (credential check, query validation, page-size clamping,
//! continuation ownership and the per-provider timeout) before the adapter
//! builds its request.

pub mod board;
pub mod instagram;
pub mod tiktok;
pub mod twitter;
pub mod youtube;

use async_trait::async_trait;
use reqwest::{Response, StatusCode};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::debug;

use crate::config::ProvidersConfig;
use crate::models::{ContinuationToken, EnrichedResult, Platform};

pub use board::{BoardClient, BoardSite};
pub use instagram::InstagramClient;
pub use tiktok::TiktokClient;
pub use twitter::TwitterClient;
pub use youtube::YoutubeClient;

const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) Fanvault/0.1";

/// Failures an adapter reports for a configured provider.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProviderError {
    /// Timeouts, rate limits, 5xx. Worth retrying later with the same query.
    #[error("{platform} temporarily unavailable: {message}")]
    Transient { platform: Platform, message: String },

    /// Bad query shape, not found, rejected credentials. Retrying will not help.
    #[error("{platform} rejected the search: {message}")]
    Permanent { platform: Platform, message: String },
}

impl ProviderError {
    pub fn transient(platform: Platform, message: impl Into<String>) -> Self {
        Self::Transient {
            platform,
            message: message.into(),
        }
    }

    pub fn permanent(platform: Platform, message: impl Into<String>) -> Self {
        Self::Permanent {
            platform,
            message: message.into(),
        }
    }

    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Transient { .. })
    }

    #[must_use]
    pub const fn platform(&self) -> Platform {
        match self {
            Self::Transient { platform, .. } | Self::Permanent { platform, .. } => *platform,
        }
    }
}

/// One page of normalized results.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProviderPage {
    pub items: Vec<EnrichedResult>,
    pub next: Option<ContinuationToken>,
    pub has_more: bool,
}

impl ProviderPage {
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            items: Vec::new(),
            next: None,
            has_more: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Credential missing or provider disabled; no request was made.
    Unconfigured,
    Page(ProviderPage),
}

#[async_trait]
pub trait SearchProvider: Send + Sync {
    fn platform(&self) -> Platform;

    fn is_configured(&self) -> bool;

    fn max_page_size(&self) -> u32;

    fn timeout(&self) -> Duration;

    /// Performs the request. `query` is trimmed and non-empty, `page_size` is
    /// clamped and `continuation`, if any, belongs to this platform.
    async fn request_page(
        &self,
        query: &str,
        continuation: Option<&ContinuationToken>,
        page_size: u32,
    ) -> Result<ProviderPage, ProviderError>;

    async fn fetch_page(
        &self,
        query: &str,
        continuation: Option<&ContinuationToken>,
        page_size: u32,
    ) -> Result<FetchOutcome, ProviderError> {
        let platform = self.platform();

        if !self.is_configured() {
            debug!(%platform, "Provider not configured, skipping request");
            return Ok(FetchOutcome::Unconfigured);
        }

        let query = query.trim();
        if query.is_empty() {
            return Err(ProviderError::permanent(platform, "query is empty"));
        }

        if let Some(token) = continuation
            && !token.belongs_to(platform)
        {
            return Err(ProviderError::permanent(
                platform,
                format!("continuation {:?} was not issued by {platform}", token.scheme()),
            ));
        }

        let page_size = page_size.clamp(1, self.max_page_size().max(1));
        let timeout = self.timeout();
        let start = Instant::now();

        let result = match tokio::time::timeout(
            timeout,
            self.request_page(query, continuation, page_size),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(ProviderError::transient(
                platform,
                format!("timed out after {}ms", timeout.as_millis()),
            )),
        };

        let outcome = match &result {
            Ok(_) => "ok",
            Err(e) if e.is_retryable() => "transient",
            Err(_) => "permanent",
        };
        metrics::counter!(
            "provider_requests_total",
            "platform" => platform.as_str(),
            "outcome" => outcome
        )
        .increment(1);

        debug!(
            %platform,
            outcome,
            duration_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
            "Provider request finished"
        );

        result.map(FetchOutcome::Page)
    }
}

/// Maps a transport-level failure onto the provider error taxonomy.
pub(crate) fn request_error(platform: Platform, err: &reqwest::Error) -> ProviderError {
    if let Some(status) = err.status() {
        return status_error(platform, status, &err.to_string());
    }

    if err.is_decode() || err.is_builder() {
        ProviderError::permanent(platform, err.to_string())
    } else {
        ProviderError::transient(platform, err.to_string())
    }
}

fn status_error(platform: Platform, status: StatusCode, body: &str) -> ProviderError {
    let snippet: String = body.chars().take(200).collect();
    let message = format!("{status} - {snippet}");

    if status == StatusCode::TOO_MANY_REQUESTS
        || status == StatusCode::REQUEST_TIMEOUT
        || status.is_server_error()
    {
        ProviderError::transient(platform, message)
    } else {
        ProviderError::permanent(platform, message)
    }
}

/// Passes successful responses through, turns everything else into a `ProviderError`.
pub(crate) async fn check_status(
    platform: Platform,
    response: Response,
) -> Result<Response, ProviderError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(status_error(platform, status, &body))
}

pub(crate) fn truncate_chars(text: &str, max: usize) -> String {
    let text = text.trim();
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max).collect();
    out.push('…');
    out
}

/// Builds the shared HTTP client used by every adapter.
pub fn build_http_client() -> anyhow::Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .pool_max_idle_per_host(10)
        .connect_timeout(Duration::from_secs(5))
        .build()
        .map_err(|e| anyhow::anyhow!("Failed to build shared HTTP client: {e}"))
}

/// Platform to adapter lookup.
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    providers: BTreeMap<Platform, Arc<dyn SearchProvider>>,
}

impl ProviderRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn from_config(config: &ProvidersConfig, client: &reqwest::Client) -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(YoutubeClient::new(
            client.clone(),
            config.youtube.clone(),
        )));
        registry.register(Arc::new(TwitterClient::new(
            client.clone(),
            config.twitter.clone(),
        )));
        registry.register(Arc::new(InstagramClient::new(
            client.clone(),
            config.instagram.clone(),
        )));
        registry.register(Arc::new(TiktokClient::new(
            client.clone(),
            config.tiktok.clone(),
        )));
        for site in BoardSite::ALL {
            registry.register(Arc::new(BoardClient::new(
                client.clone(),
                site,
                config.get(site.platform()).clone(),
            )));
        }
        registry
    }

    pub fn register(&mut self, provider: Arc<dyn SearchProvider>) {
        self.providers.insert(provider.platform(), provider);
    }

    #[must_use]
    pub fn get(&self, platform: Platform) -> Option<Arc<dyn SearchProvider>> {
        self.providers.get(&platform).cloned()
    }

    #[must_use]
    pub fn platforms(&self) -> Vec<Platform> {
        self.providers.keys().copied().collect()
    }

    #[must_use]
    pub fn configured_platforms(&self) -> Vec<Platform> {
        self.providers
            .iter()
            .filter(|(_, p)| p.is_configured())
            .map(|(platform, _)| *platform)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct Recording {
        configured: bool,
        delay: Duration,
        seen: Mutex<Vec<(String, Option<ContinuationToken>, u32)>>,
    }

    impl Recording {
        fn new(configured: bool) -> Self {
            Self {
                configured,
                delay: Duration::ZERO,
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl SearchProvider for Recording {
        fn platform(&self) -> Platform {
            Platform::Youtube
        }

        fn is_configured(&self) -> bool {
            self.configured
        }

        fn max_page_size(&self) -> u32 {
            50
        }

        fn timeout(&self) -> Duration {
            Duration::from_millis(50)
        }

        async fn request_page(
            &self,
            query: &str,
            continuation: Option<&ContinuationToken>,
            page_size: u32,
        ) -> Result<ProviderPage, ProviderError> {
            tokio::time::sleep(self.delay).await;
            self.seen
                .lock()
                .unwrap()
                .push((query.to_string(), continuation.cloned(), page_size));
            Ok(ProviderPage::empty())
        }
    }

    #[tokio::test]
    async fn test_unconfigured_is_distinct_from_empty() {
        let unconfigured = Recording::new(false);
        let configured = Recording::new(true);

        let a = unconfigured.fetch_page("aespa", None, 10).await.unwrap();
        let b = configured.fetch_page("aespa", None, 10).await.unwrap();

        assert_eq!(a, FetchOutcome::Unconfigured);
        assert_eq!(b, FetchOutcome::Page(ProviderPage::empty()));
        assert_ne!(a, b);
        assert!(unconfigured.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_page_size_is_clamped_and_query_trimmed() {
        let provider = Recording::new(true);
        provider.fetch_page("  ive  ", None, 500).await.unwrap();
        provider.fetch_page("ive", None, 0).await.unwrap();

        let seen = provider.seen.lock().unwrap();
        assert_eq!(seen[0], ("ive".to_string(), None, 50));
        assert_eq!(seen[1].2, 1);
    }

    #[tokio::test]
    async fn test_blank_query_is_permanent() {
        let err = Recording::new(true).fetch_page("   ", None, 10).await.unwrap_err();
        assert!(!err.is_retryable());
    }

    #[tokio::test]
    async fn test_foreign_continuation_is_rejected() {
        let provider = Recording::new(true);
        let token = ContinuationToken::Cursor("twitter-cursor".to_string());
        let err = provider.fetch_page("ive", Some(&token), 10).await.unwrap_err();

        assert!(matches!(err, ProviderError::Permanent { .. }));
        assert!(provider.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_timeout_surfaces_as_transient() {
        let mut provider = Recording::new(true);
        provider.delay = Duration::from_secs(5);

        let err = provider.fetch_page("ive", None, 10).await.unwrap_err();
        assert!(err.is_retryable());
        assert_eq!(err.platform(), Platform::Youtube);
    }

    #[test]
    fn test_status_classification() {
        let p = Platform::Twitter;
        assert!(status_error(p, StatusCode::TOO_MANY_REQUESTS, "").is_retryable());
        assert!(status_error(p, StatusCode::BAD_GATEWAY, "").is_retryable());
        assert!(!status_error(p, StatusCode::NOT_FOUND, "").is_retryable());
        assert!(!status_error(p, StatusCode::BAD_REQUEST, "").is_retryable());
    }

    #[test]
    fn test_registry_lists_configured_platforms() {
        let mut config = ProvidersConfig::default();
        config.youtube.api_key = Some("key".to_string());
        let client = reqwest::Client::new();

        let registry = ProviderRegistry::from_config(&config, &client);
        assert_eq!(registry.platforms().len(), Platform::ALL.len());

        let configured = registry.configured_platforms();
        assert!(configured.contains(&Platform::Youtube));
        assert!(configured.contains(&Platform::Theqoo));
        assert!(!configured.contains(&Platform::Twitter));
    }
}
