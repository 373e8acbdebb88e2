pub mod coordinator;
pub use coordinator::{CacheCoordinator, SweepReport};

pub mod dispatcher;
pub use dispatcher::{DispatchError, FailureKind, PlatformOutcome, QueryDispatcher, ResultSource};

pub mod search_cache;
pub mod search_cache_impl;
pub use search_cache::{SearchCacheStore, StoreError, ViewedStateStore};
pub use search_cache_impl::{SeaOrmSearchCache, SeaOrmViewedState};

pub mod scheduler;
pub use scheduler::SweepScheduler;
