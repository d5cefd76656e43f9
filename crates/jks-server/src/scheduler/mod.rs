//! Background job scheduler.
//!
//! Initialises a [`JobScheduler`] at server startup and registers the
//! lapsed-offer sweep.

use std::sync::Arc;

use chrono::Utc;
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
/// the sweep schedule does not parse, or the scheduler fails to start.
pub async fn build_scheduler(
    pool: PgPool,
    config: Arc<jks_core::AppConfig>,
) -> Result<JobScheduler, JobSchedulerError> {
    let scheduler = JobScheduler::new().await?;

    register_offer_sweep_job(&scheduler, pool, &config.offer_sweep_cron).await?;

    scheduler.start().await?;
    Ok(scheduler)
}

/// Register the job that clears offers whose `sale_end_date` has passed.
///
/// Storefronts expire the offers they are displaying; this sweep covers the
/// products nobody is looking at when their sale ends.
async fn register_offer_sweep_job(
    scheduler: &JobScheduler,
    pool: PgPool,
    schedule: &str,
) -> Result<(), JobSchedulerError> {
    let pool = Arc::new(pool);

    let job = Job::new_async(schedule, move |_uuid, _lock| {
        let pool = Arc::clone(&pool);
        Box::pin(async move {
            run_offer_sweep(&pool).await;
        })
    })?;

    scheduler.add(job).await?;
    tracing::info!(schedule, "scheduler: registered offer sweep");
    Ok(())
}

/// Clears lapsed offers once. Returns how many products were cleared.
pub(crate) async fn run_offer_sweep(pool: &PgPool) -> usize {
    match jks_db::expire_lapsed_offers(pool, Utc::now()).await {
        Ok(ids) => {
            if !ids.is_empty() {
                tracing::info!(count = ids.len(), product_ids = ?ids, "scheduler: cleared lapsed offers");
            }
            ids.len()
        }
        Err(e) => {
            tracing::error!(error = %e, "scheduler: offer sweep failed");
            0
        }
    }
}
