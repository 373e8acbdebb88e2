use crate::db::{cutoff, timestamp};
use crate::entities::{prelude::*, search_cache};
use crate::models::{ContinuationToken, EnrichedResult, Platform};
use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use sea_orm::sea_query::OnConflict;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set};
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedSearch {
    pub query: String,
    pub platform: Platform,
    pub results: Vec<EnrichedResult>,
    pub continuation: Option<ContinuationToken>,
    pub has_more: bool,
    pub cached_at: String,
}

impl CachedSearch {
    fn from_model(model: search_cache::Model) -> Result<Option<Self>> {
        let Ok(platform) = model.platform.parse::<Platform>() else {
            warn!(platform = %model.platform, "Ignoring cache row for unknown platform");
            return Ok(None);
        };

        let results: Vec<EnrichedResult> = serde_json::from_str(&model.results_json)
            .with_context(|| format!("Corrupt cached results for {}/{}", model.query, platform))?;

        let continuation = model
            .continuation_json
            .as_deref()
            .map(serde_json::from_str::<ContinuationToken>)
            .transpose()
            .with_context(|| format!("Corrupt continuation for {}/{}", model.query, platform))?;

        Ok(Some(Self {
            query: model.query,
            platform,
            results,
            continuation,
            has_more: model.has_more,
            cached_at: model.cached_at,
        }))
    }
}

pub struct CacheRepository {
    conn: DatabaseConnection,
}

impl CacheRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Live entry for `(query, platform)`; rows older than `ttl` read as absent.
    pub async fn get(
        &self,
        query: &str,
        platform: Platform,
        ttl: Duration,
    ) -> Result<Option<CachedSearch>> {
        let row = SearchCache::find()
            .filter(search_cache::Column::Query.eq(query))
            .filter(search_cache::Column::Platform.eq(platform.as_str()))
            .filter(search_cache::Column::CachedAt.gte(cutoff(ttl)))
            .one(&self.conn)
            .await?;

        match row {
            Some(model) => CachedSearch::from_model(model),
            None => Ok(None),
        }
    }

    pub async fn get_all_platforms(&self, query: &str, ttl: Duration) -> Result<Vec<CachedSearch>> {
        let rows = SearchCache::find()
            .filter(search_cache::Column::Query.eq(query))
            .filter(search_cache::Column::CachedAt.gte(cutoff(ttl)))
            .order_by_asc(search_cache::Column::Platform)
            .all(&self.conn)
            .await?;

        let mut entries = Vec::with_capacity(rows.len());
        for model in rows {
            let platform = model.platform.clone();
            match CachedSearch::from_model(model) {
                Ok(Some(entry)) => entries.push(entry),
                Ok(None) => {}
                // A corrupt row only costs its own platform.
                Err(e) => {
                    warn!(query, %platform, error = %format!("{e:#}"), "Skipping undecodable cache row");
                    metrics::counter!("store_errors_total", "store" => "cache", "op" => "decode")
                        .increment(1);
                }
            }
        }

        Ok(entries)
    }

    /// Replaces results and continuation for `(query, platform)`; last write wins.
    pub async fn put(
        &self,
        query: &str,
        platform: Platform,
        results: &[EnrichedResult],
        continuation: Option<&ContinuationToken>,
        has_more: bool,
    ) -> Result<()> {
        let results_json = serde_json::to_string(results)?;
        let continuation_json = continuation.map(serde_json::to_string).transpose()?;

        let active_model = search_cache::ActiveModel {
            query: Set(query.to_string()),
            platform: Set(platform.as_str().to_string()),
            results_json: Set(results_json),
            continuation_json: Set(continuation_json),
            has_more: Set(has_more),
            cached_at: Set(timestamp(Utc::now())),
            ..Default::default()
        };

        SearchCache::insert(active_model)
            .on_conflict(
                OnConflict::columns([search_cache::Column::Query, search_cache::Column::Platform])
                    .update_columns([
                        search_cache::Column::ResultsJson,
                        search_cache::Column::ContinuationJson,
                        search_cache::Column::HasMore,
                        search_cache::Column::CachedAt,
                    ])
                    .to_owned(),
            )
            .exec(&self.conn)
            .await?;

        Ok(())
    }

    pub async fn delete_expired(&self, older_than: Duration) -> Result<u64> {
        let result = SearchCache::delete_many()
            .filter(search_cache::Column::CachedAt.lt(cutoff(older_than)))
            .exec(&self.conn)
            .await?;

        Ok(result.rows_affected)
    }
}
