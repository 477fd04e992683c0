//! Background job scheduler.
//!
//! Runs housekeeping for the detection engine: expired result-cache entries
//! are swept on a fixed schedule so idle cells do not linger in memory.

use std::sync::Arc;

use sailvenue_detect::DetectionEngine;
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};

/// Every minute, on the minute.
const DEFAULT_CACHE_PURGE_CRON: &str = "0 * * * * *";

/// Builds and starts the background job scheduler.
///
/// Returns the running [`JobScheduler`] handle, which must be kept alive for
/// the lifetime of the process. Dropping it shuts down all scheduled jobs.
///
/// # Errors
///
/// Returns [`JobSchedulerError`] if the scheduler cannot be initialised, the
/// purge job cannot be registered, or the scheduler fails to start.
pub async fn build_scheduler(
    engine: Arc<DetectionEngine>,
) -> Result<JobScheduler, JobSchedulerError> {
    let scheduler = JobScheduler::new().await?;
    register_cache_purge_job(&scheduler, engine).await?;
    scheduler.start().await?;
    Ok(scheduler)
}

/// Register the result-cache purge job.
///
/// Schedule can be overridden with `SAILVENUE_CACHE_PURGE_CRON`.
async fn register_cache_purge_job(
    scheduler: &JobScheduler,
    engine: Arc<DetectionEngine>,
) -> Result<(), JobSchedulerError> {
    let cron = std::env::var("SAILVENUE_CACHE_PURGE_CRON")
        .unwrap_or_else(|_| DEFAULT_CACHE_PURGE_CRON.to_string());

    let job = Job::new_async(cron.as_str(), move |_uuid, _lock| {
        let engine = Arc::clone(&engine);
        Box::pin(async move {
            let purged = engine.cache().purge_expired();
            if purged > 0 {
                tracing::debug!(
                    purged,
                    remaining = engine.cache().len(),
                    "scheduler: purged expired detection results"
                );
            }
        })
    })?;

    scheduler.add(job).await?;
    tracing::info!(cron = %cron, "scheduler: registered cache purge job");
    Ok(())
}
