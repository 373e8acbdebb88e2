use std::sync::Arc;

use crate::clients::{ProviderRegistry, build_http_client};
use crate::config::Config;
use crate::db::Store;
use crate::services::{CacheCoordinator, QueryDispatcher, SeaOrmSearchCache, SeaOrmViewedState};

#[derive(Clone)]
pub struct SharedState {
    pub config: Arc<Config>,

    pub store: Store,

    pub coordinator: Arc<CacheCoordinator>,

    pub dispatcher: Arc<QueryDispatcher>,
}

impl SharedState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let store = Store::with_pool_options(
            &config.general.database_path,
            config.general.max_db_connections,
            config.general.min_db_connections,
        )
        .await?;

        let http_client = build_http_client()?;
        let providers = ProviderRegistry::from_config(&config.providers, &http_client);

        Ok(Self::with_parts(config, store, providers))
    }

    /// Wires the services over an existing store and provider set.
    #[must_use]
    pub fn with_parts(config: Config, store: Store, providers: ProviderRegistry) -> Self {
        let ttl = config.cache.ttl();

        let coordinator = Arc::new(CacheCoordinator::new(
            Arc::new(SeaOrmSearchCache::new(store.clone(), ttl)),
            Arc::new(SeaOrmViewedState::new(store.clone(), ttl)),
        ));

        let dispatcher = Arc::new(QueryDispatcher::new(
            Arc::clone(&coordinator),
            providers,
            config.cache.page_size,
        ));

        Self {
            config: Arc::new(config),
            store,
            coordinator,
            dispatcher,
        }
    }
}
