use crate::models::{ContinuationToken, EnrichedResult, Platform};
use anyhow::Result;
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use std::path::Path;
use tracing::info;

pub mod migrator;
pub mod repositories;

pub use repositories::cache::CachedSearch;
pub use repositories::viewed::ViewedEntry;

/// Fixed-width UTC timestamp so lexical order in SQLite matches time order.
#[must_use]
pub fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Oldest timestamp still inside `ttl`.
#[must_use]
pub fn cutoff(ttl: Duration) -> String {
    Utc::now()
        .checked_sub_signed(ttl)
        .map_or_else(|| "1970-01-01T00:00:00.000000Z".to_string(), timestamp)
}

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        if !db_url.contains(":memory:") {
            let path_str = db_url.trim_start_matches("sqlite:");
            let path_str = path_str.split('?').next().unwrap_or(path_str);
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(std::time::Duration::from_secs(10))
            .acquire_timeout(std::time::Duration::from_secs(10))
            .idle_timeout(std::time::Duration::from_secs(300))
            .max_lifetime(std::time::Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    /// Single-connection in-memory database, used by tests and dry runs.
    pub async fn in_memory() -> Result<Self> {
        Self::with_pool_options("sqlite::memory:", 1, 1).await
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    fn cache_repo(&self) -> repositories::cache::CacheRepository {
        repositories::cache::CacheRepository::new(self.conn.clone())
    }

    fn viewed_repo(&self) -> repositories::viewed::ViewedRepository {
        repositories::viewed::ViewedRepository::new(self.conn.clone())
    }

    // Search cache

    pub async fn get_cached_search(
        &self,
        query: &str,
        platform: Platform,
        ttl: Duration,
    ) -> Result<Option<CachedSearch>> {
        self.cache_repo().get(query, platform, ttl).await
    }

    pub async fn get_cached_searches(&self, query: &str, ttl: Duration) -> Result<Vec<CachedSearch>> {
        self.cache_repo().get_all_platforms(query, ttl).await
    }

    pub async fn cache_search_results(
        &self,
        query: &str,
        platform: Platform,
        results: &[EnrichedResult],
        continuation: Option<&ContinuationToken>,
        has_more: bool,
    ) -> Result<()> {
        self.cache_repo()
            .put(query, platform, results, continuation, has_more)
            .await
    }

    pub async fn delete_expired_searches(&self, older_than: Duration) -> Result<u64> {
        self.cache_repo().delete_expired(older_than).await
    }

    // Viewed state

    pub async fn get_viewed(
        &self,
        user_id: &str,
        query: &str,
        platform: Platform,
        ttl: Duration,
    ) -> Result<Option<ViewedEntry>> {
        self.viewed_repo().get(user_id, query, platform, ttl).await
    }

    pub async fn get_viewed_for_query(
        &self,
        user_id: &str,
        query: &str,
        ttl: Duration,
    ) -> Result<Vec<ViewedEntry>> {
        self.viewed_repo().get_all_platforms(user_id, query, ttl).await
    }

    pub async fn set_viewed(
        &self,
        user_id: &str,
        query: &str,
        platform: Platform,
        displayed_index: usize,
    ) -> Result<()> {
        self.viewed_repo()
            .put(user_id, query, platform, displayed_index)
            .await
    }

    pub async fn delete_expired_viewed(&self, older_than: Duration) -> Result<u64> {
        self.viewed_repo().delete_expired(older_than).await
    }
}
