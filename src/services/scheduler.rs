use anyhow::Result;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio::time::Duration;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info};

use crate::config::CacheConfig;
use crate::services::coordinator::{CacheCoordinator, SweepReport};

const JOB_NAME: &str = "sweep_expired";

/// Runs the expiry sweep over both stores on the configured cron.
pub struct SweepScheduler {
    coordinator: Arc<CacheCoordinator>,
    config: CacheConfig,
    running: Arc<RwLock<bool>>,
}

impl SweepScheduler {
    #[must_use]
    pub fn new(coordinator: Arc<CacheCoordinator>, config: CacheConfig) -> Self {
        Self {
            coordinator,
            config,
            running: Arc::new(RwLock::new(false)),
        }
    }

    /// Blocks until [`Self::stop`] is called.
    pub async fn start(&self) -> Result<()> {
        if !self.config.sweep_enabled {
            info!("Expiry sweep is disabled in config");
            return Ok(());
        }

        *self.running.write().await = true;

        let mut sched = JobScheduler::new().await?;

        let coordinator = Arc::clone(&self.coordinator);
        let running = Arc::clone(&self.running);
        let ttl = self.config.ttl();

        let job = Job::new_async(self.config.sweep_cron.as_str(), move |_uuid, _lock| {
            let coordinator = Arc::clone(&coordinator);
            let running = Arc::clone(&running);
            Box::pin(async move {
                if !*running.read().await {
                    return;
                }
                run_sweep(&coordinator, ttl).await;
            })
        })?;

        sched.add(job).await?;
        sched.start().await?;

        info!(cron = %self.config.sweep_cron, ttl_hours = self.config.ttl_hours, "Expiry sweep scheduled");

        loop {
            if !*self.running.read().await {
                break;
            }
            tokio::time::sleep(Duration::from_secs(1)).await;
        }

        sched.shutdown().await?;
        Ok(())
    }

    pub async fn stop(&self) {
        info!("Stopping scheduler...");
        *self.running.write().await = false;
    }

    pub async fn run_once(&self) -> Result<SweepReport> {
        info!("Running manual sweep...");
        let report = self.coordinator.sweep_expired(self.config.ttl()).await?;
        Ok(report)
    }
}

async fn run_sweep(coordinator: &CacheCoordinator, ttl: chrono::Duration) {
    let start = std::time::Instant::now();
    info!(event = "job_started", job_name = JOB_NAME, "Starting scheduled expiry sweep");

    match coordinator.sweep_expired(ttl).await {
        Ok(report) => info!(
            event = "job_finished",
            job_name = JOB_NAME,
            cache_deleted = report.cache_deleted,
            viewed_deleted = report.viewed_deleted,
            duration_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
            "Scheduled expiry sweep finished"
        ),
        Err(e) => {
            error!(event = "job_failed", job_name = JOB_NAME, error = %e, "Scheduled expiry sweep failed");
        }
    }
}
