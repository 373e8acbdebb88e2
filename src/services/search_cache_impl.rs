//! `SeaORM` implementations of the cache and viewed-state stores.

use async_trait::async_trait;
use chrono::Duration;
use std::collections::BTreeMap;

use crate::db::{CachedSearch, Store, ViewedEntry};
use crate::models::{ContinuationToken, EnrichedResult, Platform, SearchQuery, UserId};
use crate::services::search_cache::{SearchCacheStore, StoreError, ViewedStateStore};

pub struct SeaOrmSearchCache {
    store: Store,
    ttl: Duration,
}

impl SeaOrmSearchCache {
    #[must_use]
    pub const fn new(store: Store, ttl: Duration) -> Self {
        Self { store, ttl }
    }
}

#[async_trait]
impl SearchCacheStore for SeaOrmSearchCache {
    async fn get(
        &self,
        query: &SearchQuery,
        platform: Platform,
    ) -> Result<Option<CachedSearch>, StoreError> {
        Ok(self
            .store
            .get_cached_search(query.as_str(), platform, self.ttl)
            .await?)
    }

    async fn get_all_platforms(
        &self,
        query: &SearchQuery,
    ) -> Result<BTreeMap<Platform, CachedSearch>, StoreError> {
        let entries = self
            .store
            .get_cached_searches(query.as_str(), self.ttl)
            .await?;

        Ok(entries.into_iter().map(|e| (e.platform, e)).collect())
    }

    async fn put(
        &self,
        query: &SearchQuery,
        platform: Platform,
        results: &[EnrichedResult],
        continuation: Option<&ContinuationToken>,
        has_more: bool,
    ) -> Result<(), StoreError> {
        self.store
            .cache_search_results(query.as_str(), platform, results, continuation, has_more)
            .await?;
        Ok(())
    }

    async fn delete_expired(&self, older_than: Duration) -> Result<u64, StoreError> {
        Ok(self.store.delete_expired_searches(older_than).await?)
    }
}

pub struct SeaOrmViewedState {
    store: Store,
    ttl: Duration,
}

impl SeaOrmViewedState {
    #[must_use]
    pub const fn new(store: Store, ttl: Duration) -> Self {
        Self { store, ttl }
    }
}

#[async_trait]
impl ViewedStateStore for SeaOrmViewedState {
    async fn get(
        &self,
        user: &UserId,
        query: &SearchQuery,
        platform: Platform,
    ) -> Result<Option<ViewedEntry>, StoreError> {
        Ok(self
            .store
            .get_viewed(user.as_str(), query.as_str(), platform, self.ttl)
            .await?)
    }

    async fn get_all_platforms(
        &self,
        user: &UserId,
        query: &SearchQuery,
    ) -> Result<BTreeMap<Platform, ViewedEntry>, StoreError> {
        let entries = self
            .store
            .get_viewed_for_query(user.as_str(), query.as_str(), self.ttl)
            .await?;

        Ok(entries.into_iter().map(|e| (e.platform, e)).collect())
    }

    async fn put(
        &self,
        user: &UserId,
        query: &SearchQuery,
        platform: Platform,
        displayed_index: usize,
    ) -> Result<(), StoreError> {
        self.store
            .set_viewed(user.as_str(), query.as_str(), platform, displayed_index)
            .await?;
        Ok(())
    }

    async fn delete_expired(&self, older_than: Duration) -> Result<u64, StoreError> {
        Ok(self.store.delete_expired_viewed(older_than).await?)
    }
}
