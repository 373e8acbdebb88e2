//! Shared search result cache and per-user viewed watermarks.
//!
//! Both stores apply their TTL on every read, so rows the sweep has not
//! removed yet are still treated as absent.

use async_trait::async_trait;
use chrono::Duration;
use std::collections::BTreeMap;
use thiserror::Error;

use crate::db::{CachedSearch, ViewedEntry};
use crate::models::{ContinuationToken, EnrichedResult, Platform, SearchQuery, UserId};

/// Errors raised by either backing store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(String),
}

impl From<sea_orm::DbErr> for StoreError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for StoreError {
    fn from(err: anyhow::Error) -> Self {
        Self::Database(format!("{err:#}"))
    }
}

/// Multi-tenant cache keyed by `(query, platform)`.
#[async_trait]
pub trait SearchCacheStore: Send + Sync {
    async fn get(
        &self,
        query: &SearchQuery,
        platform: Platform,
    ) -> Result<Option<CachedSearch>, StoreError>;

    async fn get_all_platforms(
        &self,
        query: &SearchQuery,
    ) -> Result<BTreeMap<Platform, CachedSearch>, StoreError>;

    /// Full replace of results and continuation; concurrent writers race, last one wins.
    async fn put(
        &self,
        query: &SearchQuery,
        platform: Platform,
        results: &[EnrichedResult],
        continuation: Option<&ContinuationToken>,
        has_more: bool,
    ) -> Result<(), StoreError>;

    async fn delete_expired(&self, older_than: Duration) -> Result<u64, StoreError>;
}

/// Per-user watermark store keyed by `(user, query, platform)`.
#[async_trait]
pub trait ViewedStateStore: Send + Sync {
    async fn get(
        &self,
        user: &UserId,
        query: &SearchQuery,
        platform: Platform,
    ) -> Result<Option<ViewedEntry>, StoreError>;

    async fn get_all_platforms(
        &self,
        user: &UserId,
        query: &SearchQuery,
    ) -> Result<BTreeMap<Platform, ViewedEntry>, StoreError>;

    async fn put(
        &self,
        user: &UserId,
        query: &SearchQuery,
        platform: Platform,
        displayed_index: usize,
    ) -> Result<(), StoreError>;

    async fn delete_expired(&self, older_than: Duration) -> Result<u64, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_conversions_work() {
        let db_err = sea_orm::DbErr::Custom("locked".to_string());
        let err: StoreError = db_err.into();
        assert!(matches!(err, StoreError::Database(_)));

        let err: StoreError = anyhow::anyhow!("boom").context("reading cache").into();
        assert!(err.to_string().contains("reading cache"));
        assert!(err.to_string().contains("boom"));
    }
}
