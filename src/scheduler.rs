use crate::audit;
use crate::config::Config;
use crate::store::RestStore;
use anyhow::Result;
use std::sync::Arc;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info};

/// Start the daily content-audit jobs, one per configured `HH:MM` (UTC).
pub async fn start_scheduler(config: Arc<Config>, store: Arc<RestStore>) -> Result<JobScheduler> {
    let scheduler = JobScheduler::new().await?;

    for time in &config.audit_times {
        let cron_expr = time_to_cron(time)?;
        info!("Scheduling content audit for {} UTC (cron: {})", time, cron_expr);

        let store_clone = Arc::clone(&store);

        let job = Job::new_async(cron_expr.as_str(), move |_uuid, _l| {
            let store = Arc::clone(&store_clone);

            Box::pin(async move {
                info!("⏰ Scheduled content audit triggered");
                if let Err(e) = audit::run_audit(&store).await {
                    error!("Scheduled content audit failed: {}", e);
                }
            })
        })?;

        scheduler.add(job).await?;
    }

    scheduler.start().await?;
    info!("✓ Scheduler started");

    Ok(scheduler)
}

/// Convert a UTC time string (HH:MM) to a daily cron expression.
fn time_to_cron(time: &str) -> Result<String> {
    let parts: Vec<&str> = time.split(':').collect();
    if parts.len() != 2 {
        anyhow::bail!("Invalid time format: {}. Expected HH:MM", time);
    }

    let hour: u8 = parts[0].parse()?;
    let minute: u8 = parts[1].parse()?;
    if hour > 23 || minute > 59 {
        anyhow::bail!("Invalid time: {}", time);
    }

    // "second minute hour day month day_of_week"
    Ok(format!("0 {} {} * * *", minute, hour))
}
