use futures::future::join_all;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

use crate::clients::{FetchOutcome, ProviderError, ProviderRegistry, SearchProvider};
use crate::models::{MergedView, Platform, SearchQuery, UserId};
use crate::services::coordinator::CacheCoordinator;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DispatchError {
    #[error("Search query is empty")]
    EmptyQuery,

    #[error("No provider registered for {0}")]
    UnknownPlatform(Platform),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultSource {
    Cache,
    Provider,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Transient,
    Permanent,
}

/// What one platform tab should show.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PlatformOutcome {
    Ready {
        source: ResultSource,
        view: MergedView,
    },
    /// Hidden from the platform list rather than shown as empty.
    Unconfigured,
    Failed {
        kind: FailureKind,
        message: String,
    },
}

impl PlatformOutcome {
    #[must_use]
    pub const fn view(&self) -> Option<&MergedView> {
        match self {
            Self::Ready { view, .. } => Some(view),
            _ => None,
        }
    }

    fn from_error(err: &ProviderError) -> Self {
        let kind = if err.is_retryable() {
            FailureKind::Transient
        } else {
            FailureKind::Permanent
        };
        Self::Failed {
            kind,
            message: err.to_string(),
        }
    }
}

/// Fans a search out to the cache and the providers, platform by platform.
#[derive(Clone)]
pub struct QueryDispatcher {
    coordinator: Arc<CacheCoordinator>,
    providers: ProviderRegistry,
    page_size: u32,
}

impl QueryDispatcher {
    #[must_use]
    pub const fn new(
        coordinator: Arc<CacheCoordinator>,
        providers: ProviderRegistry,
        page_size: u32,
    ) -> Self {
        Self {
            coordinator,
            providers,
            page_size,
        }
    }

    #[must_use]
    pub const fn coordinator(&self) -> &Arc<CacheCoordinator> {
        &self.coordinator
    }

    #[must_use]
    pub const fn providers(&self) -> &ProviderRegistry {
        &self.providers
    }

    /// Serves each platform from cache when possible, otherwise fetches and
    /// caches its first page. An empty `platforms` list means every registered one.
    pub async fn search(
        &self,
        user: Option<&UserId>,
        raw_query: &str,
        platforms: &[Platform],
    ) -> Result<BTreeMap<Platform, PlatformOutcome>, DispatchError> {
        let query = SearchQuery::normalize(raw_query).ok_or(DispatchError::EmptyQuery)?;

        let requested: BTreeSet<Platform> = if platforms.is_empty() {
            self.providers.platforms().into_iter().collect()
        } else {
            platforms.iter().copied().collect()
        };

        let mut cached = self.coordinator.read_merged(user, query.as_str()).await;

        let query_ref = &query;
        let tasks = requested.into_iter().map(move |platform| {
            let hit = cached.remove(&platform);
            async move {
                let query = query_ref;
                let outcome = match (self.providers.get(platform), hit) {
                    (None, _) => PlatformOutcome::Unconfigured,
                    (Some(provider), _) if !provider.is_configured() => {
                        PlatformOutcome::Unconfigured
                    }
                    (Some(_), Some(view)) => {
                        record_read(platform, "hit");
                        PlatformOutcome::Ready {
                            source: ResultSource::Cache,
                            view,
                        }
                    }
                    (Some(provider), None) => {
                        record_read(platform, "miss");
                        self.fetch_first_page(user, query, provider.as_ref()).await
                    }
                };
                (platform, outcome)
            }
        });

        let outcomes: BTreeMap<_, _> = join_all(tasks).await.into_iter().collect();

        info!(
            query = %query,
            platforms = outcomes.len(),
            ready = outcomes.values().filter(|o| o.view().is_some()).count(),
            "Search dispatched"
        );

        Ok(outcomes)
    }

    /// Fetches the next provider page for `platform` and appends it to the
    /// cached results, keeping the caller's watermark.
    pub async fn load_more(
        &self,
        user: Option<&UserId>,
        raw_query: &str,
        platform: Platform,
    ) -> Result<PlatformOutcome, DispatchError> {
        let query = SearchQuery::normalize(raw_query).ok_or(DispatchError::EmptyQuery)?;
        let provider = self
            .providers
            .get(platform)
            .ok_or(DispatchError::UnknownPlatform(platform))?;

        if !provider.is_configured() {
            return Ok(PlatformOutcome::Unconfigured);
        }

        let Some(current) = self
            .coordinator
            .read_platform(user, query.as_str(), platform)
            .await
        else {
            record_read(platform, "miss");
            return Ok(self.fetch_first_page(user, &query, provider.as_ref()).await);
        };
        record_read(platform, "hit");

        let Some(continuation) = current.continuation.clone().filter(|_| current.has_more) else {
            return Ok(PlatformOutcome::Ready {
                source: ResultSource::Cache,
                view: current,
            });
        };

        let page = match provider
            .fetch_page(query.as_str(), Some(&continuation), self.page_size)
            .await
        {
            Ok(FetchOutcome::Page(page)) => page,
            Ok(FetchOutcome::Unconfigured) => return Ok(PlatformOutcome::Unconfigured),
            Err(e) => {
                warn!(%platform, query = %query, error = %e, "Loading more results failed");
                return Ok(PlatformOutcome::from_error(&e));
            }
        };

        let mut seen: HashSet<String> = current.results.iter().map(|r| r.url.clone()).collect();
        let mut results = current.results;
        results.extend(page.items.into_iter().filter(|r| seen.insert(r.url.clone())));

        let view = MergedView {
            results,
            continuation: page.next,
            has_more: page.has_more,
            displayed_index: current.displayed_index,
        };
        self.coordinator
            .write_through(user, query.as_str(), platform, &view)
            .await;

        Ok(PlatformOutcome::Ready {
            source: ResultSource::Provider,
            view,
        })
    }

    /// Records that the caller has seen the first `displayed_index` results.
    /// Returns `false` without a user.
    pub async fn mark_viewed(
        &self,
        user: Option<&UserId>,
        raw_query: &str,
        platform: Platform,
        displayed_index: usize,
    ) -> Result<bool, DispatchError> {
        let query = SearchQuery::normalize(raw_query).ok_or(DispatchError::EmptyQuery)?;
        let Some(user) = user else {
            return Ok(false);
        };

        self.coordinator
            .mark_viewed(user, query.as_str(), platform, displayed_index)
            .await;
        Ok(true)
    }

    async fn fetch_first_page(
        &self,
        user: Option<&UserId>,
        query: &SearchQuery,
        provider: &dyn SearchProvider,
    ) -> PlatformOutcome {
        let platform = provider.platform();

        match provider.fetch_page(query.as_str(), None, self.page_size).await {
            Ok(FetchOutcome::Unconfigured) => PlatformOutcome::Unconfigured,
            Ok(FetchOutcome::Page(page)) => {
                let view = MergedView {
                    results: page.items,
                    continuation: page.next,
                    has_more: page.has_more,
                    displayed_index: 0,
                };
                self.coordinator
                    .write_through(user, query.as_str(), platform, &view)
                    .await;

                PlatformOutcome::Ready {
                    source: ResultSource::Provider,
                    view,
                }
            }
            Err(e) => {
                warn!(%platform, query = %query, error = %e, "Provider search failed");
                PlatformOutcome::from_error(&e)
            }
        }
    }
}

fn record_read(platform: Platform, outcome: &'static str) {
    metrics::counter!(
        "search_cache_reads_total",
        "platform" => platform.as_str(),
        "outcome" => outcome
    )
    .increment(1);
}
