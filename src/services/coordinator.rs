//! Combines the shared result cache with per-user watermarks.
//!
//! Every store failure stops here: reads degrade to "nothing cached" and
//! writes are logged, so a search can always fall back to the providers.

use chrono::Duration;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::models::{MergedView, Platform, SearchQuery, UserId};
use crate::services::search_cache::{SearchCacheStore, StoreError, ViewedStateStore};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    pub cache_deleted: u64,
    pub viewed_deleted: u64,
}

#[derive(Clone)]
pub struct CacheCoordinator {
    cache: Arc<dyn SearchCacheStore>,
    viewed: Arc<dyn ViewedStateStore>,
}

fn record_store_error(store: &'static str, op: &'static str, err: &StoreError) {
    metrics::counter!("store_errors_total", "store" => store, "op" => op).increment(1);
    warn!(store, op, error = %err, "Search store call failed");
}

impl CacheCoordinator {
    #[must_use]
    pub fn new(cache: Arc<dyn SearchCacheStore>, viewed: Arc<dyn ViewedStateStore>) -> Self {
        Self { cache, viewed }
    }

    /// Live cache entries for `query`, one per platform, each carrying the
    /// caller's watermark. Platforms without a live entry are left out.
    pub async fn read_merged(
        &self,
        user: Option<&UserId>,
        query: &str,
    ) -> BTreeMap<Platform, MergedView> {
        let Some(query) = SearchQuery::normalize(query) else {
            return BTreeMap::new();
        };

        let cache_read = self.cache.get_all_platforms(&query);
        let viewed_read = async {
            match user {
                Some(user) => self.viewed.get_all_platforms(user, &query).await,
                None => Ok(BTreeMap::new()),
            }
        };

        let (cached, viewed) = tokio::join!(cache_read, viewed_read);

        let cached = match cached {
            Ok(cached) => cached,
            Err(e) => {
                record_store_error("cache", "read", &e);
                return BTreeMap::new();
            }
        };
        let viewed = match viewed {
            Ok(viewed) => viewed,
            Err(e) => {
                record_store_error("viewed", "read", &e);
                return BTreeMap::new();
            }
        };

        cached
            .into_iter()
            .map(|(platform, entry)| {
                let watermark = viewed.get(&platform).map_or(0, |v| v.displayed_index);
                let displayed_index = MergedView::clamp_watermark(watermark, entry.results.len());
                if displayed_index != watermark {
                    debug!(%platform, query = %query, watermark, "Watermark overran cached results, reset to 0");
                }

                let view = MergedView {
                    results: entry.results,
                    continuation: entry.continuation,
                    has_more: entry.has_more,
                    displayed_index,
                };
                (platform, view)
            })
            .collect()
    }

    /// Single-platform variant of [`Self::read_merged`].
    pub async fn read_platform(
        &self,
        user: Option<&UserId>,
        query: &str,
        platform: Platform,
    ) -> Option<MergedView> {
        let query = SearchQuery::normalize(query)?;

        let viewed_read = async {
            match user {
                Some(user) => self.viewed.get(user, &query, platform).await,
                None => Ok(None),
            }
        };
        let (cached, viewed) = tokio::join!(self.cache.get(&query, platform), viewed_read);

        let entry = match cached {
            Ok(entry) => entry?,
            Err(e) => {
                record_store_error("cache", "read", &e);
                return None;
            }
        };
        let watermark = match viewed {
            Ok(viewed) => viewed.map_or(0, |v| v.displayed_index),
            Err(e) => {
                record_store_error("viewed", "read", &e);
                return None;
            }
        };

        Some(MergedView {
            displayed_index: MergedView::clamp_watermark(watermark, entry.results.len()),
            results: entry.results,
            continuation: entry.continuation,
            has_more: entry.has_more,
        })
    }

    /// Persists `view` into both stores.
    ///
    /// The two upserts run as separate tasks and are awaited together; one
    /// failing leaves the other in place. Dropping the returned future does
    /// not cancel a write that has already started.
    pub async fn write_through(
        &self,
        user: Option<&UserId>,
        query: &str,
        platform: Platform,
        view: &MergedView,
    ) {
        let Some(query) = SearchQuery::normalize(query) else {
            debug!(%platform, "Skipping write-through for blank query");
            return;
        };

        let cache = Arc::clone(&self.cache);
        let cache_query = query.clone();
        let results = view.results.clone();
        let continuation = view.continuation.clone();
        let has_more = view.has_more;
        let cache_write = tokio::spawn(async move {
            cache
                .put(&cache_query, platform, &results, continuation.as_ref(), has_more)
                .await
        });

        let viewed_write = user.cloned().map(|user| {
            let viewed = Arc::clone(&self.viewed);
            let displayed_index = view.displayed_index;
            tokio::spawn(async move { viewed.put(&user, &query, platform, displayed_index).await })
        });

        match cache_write.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => record_store_error("cache", "write", &e),
            Err(e) => warn!(%platform, error = %e, "Cache write task aborted"),
        }

        if let Some(handle) = viewed_write {
            match handle.await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => record_store_error("viewed", "write", &e),
                Err(e) => warn!(%platform, error = %e, "Viewed-state write task aborted"),
            }
        }
    }

    /// Moves the caller's watermark without touching cached results.
    pub async fn mark_viewed(
        &self,
        user: &UserId,
        query: &str,
        platform: Platform,
        displayed_index: usize,
    ) {
        let Some(query) = SearchQuery::normalize(query) else {
            return;
        };

        let viewed = Arc::clone(&self.viewed);
        let user = user.clone();
        let handle =
            tokio::spawn(async move { viewed.put(&user, &query, platform, displayed_index).await });

        match handle.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => record_store_error("viewed", "write", &e),
            Err(e) => warn!(%platform, error = %e, "Viewed-state write task aborted"),
        }
    }

    /// Deletes rows older than `ttl` from both stores.
    ///
    /// Both sweeps always run; the first failure is returned after they finish.
    pub async fn sweep_expired(&self, ttl: Duration) -> Result<SweepReport, StoreError> {
        let (cache, viewed) = tokio::join!(
            self.cache.delete_expired(ttl),
            self.viewed.delete_expired(ttl)
        );

        if let Err(e) = &cache {
            record_store_error("cache", "sweep", e);
        }
        if let Err(e) = &viewed {
            record_store_error("viewed", "sweep", e);
        }

        Ok(SweepReport {
            cache_deleted: cache?,
            viewed_deleted: viewed?,
        })
    }
}
