//! Background job scheduler.
//!
//! Initialises a [`JobScheduler`] at server startup and registers the
//! recurring maintenance jobs.

use std::sync::Arc;

use safeway_opendata::InfrastructureCache;
use sqlx::PgPool;
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};

/// Builds and starts the background job scheduler.
///
/// Returns the running [`JobScheduler`] handle, which must be kept alive
/// for the lifetime of the process. Dropping it shuts down all jobs.
///
/// # Errors
///
/// Returns [`JobSchedulerError`] if the scheduler cannot be initialised,
/// a job cannot be registered, or the scheduler fails to start.
pub async fn build_scheduler(
    pool: PgPool,
    infrastructure: Option<Arc<InfrastructureCache>>,
) -> Result<JobScheduler, JobSchedulerError> {
    let scheduler = JobScheduler::new().await?;

    register_session_purge_job(&scheduler, pool).await?;
    if let Some(cache) = infrastructure {
        register_infrastructure_refresh_job(&scheduler, cache).await?;
    }

    scheduler.start().await?;
    Ok(scheduler)
}

/// Hourly (`0 0 * * * *`) removal of expired session tokens.
async fn register_session_purge_job(
    scheduler: &JobScheduler,
    pool: PgPool,
) -> Result<(), JobSchedulerError> {
    let pool = Arc::new(pool);

    let job = Job::new_async("0 0 * * * *", move |_uuid, _lock| {
        let pool = Arc::clone(&pool);

        Box::pin(async move {
            match safeway_db::purge_expired_sessions(&pool).await {
                Ok(0) => tracing::debug!("scheduler: no expired sessions"),
                Ok(purged) => tracing::info!(purged, "scheduler: purged expired sessions"),
                Err(e) => tracing::error!(error = %e, "scheduler: session purge failed"),
            }
        })
    })?;

    scheduler.add(job).await?;
    Ok(())
}

/// Half-hourly (`0 */30 * * * *`) refetch of the CCTV and streetlight
/// datasets, so requests rarely pay for a cold cache.
async fn register_infrastructure_refresh_job(
    scheduler: &JobScheduler,
    cache: Arc<InfrastructureCache>,
) -> Result<(), JobSchedulerError> {
    let job = Job::new_async("0 */30 * * * *", move |_uuid, _lock| {
        let cache = Arc::clone(&cache);

        Box::pin(async move {
            if let Err(e) = cache.refresh().await {
                tracing::error!(error = %e, "scheduler: infrastructure refresh failed");
            }
        })
    })?;

    scheduler.add(job).await?;
    Ok(())
}
