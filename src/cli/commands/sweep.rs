use std::sync::Arc;

use crate::config::Config;
use crate::services::SweepScheduler;
use crate::state::SharedState;

pub async fn cmd_sweep(config: &Config) -> anyhow::Result<()> {
    let state = SharedState::new(config.clone()).await?;
    let scheduler = SweepScheduler::new(Arc::clone(&state.coordinator), config.cache.clone());
    let report = scheduler.run_once().await?;

    println!(
        "Removed {} cached searches and {} viewed watermarks older than {}h",
        report.cache_deleted, report.viewed_deleted, config.cache.ttl_hours
    );

    Ok(())
}
