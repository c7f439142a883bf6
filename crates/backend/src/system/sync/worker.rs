use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, Utc};
use contracts::enums::RunTrigger;
use tokio::time::{self, MissedTickBehavior};
use tracing::{error, info, warn};

use crate::shared::logger;
use crate::shared::state;

use super::pipeline::{next_run_after, run_pipeline, SyncPipeline};

/// Background scheduler. Every tick it checks which pipelines are due,
/// advances their next-run markers and spawns the runs.
pub struct SyncWorker {
    pipelines: Vec<Arc<dyn SyncPipeline>>,
    interval_seconds: u64,
}

impl SyncWorker {
    pub fn new(pipelines: Vec<Arc<dyn SyncPipeline>>, interval_seconds: u64) -> Self {
        Self {
            pipelines,
            interval_seconds,
        }
    }

    pub async fn run_loop(&self) {
        info!(
            "Sync worker started with interval {} seconds",
            self.interval_seconds
        );
        let mut interval = time::interval(time::Duration::from_secs(self.interval_seconds));
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            interval.tick().await;
            if let Err(e) = self.process_due_pipelines().await {
                error!("Error processing scheduled syncs: {e:?}");
            }
            if let Err(e) = run_daily_log_cleanup().await {
                warn!("Log cleanup failed: {e:?}");
            }
        }
    }

    async fn process_due_pipelines(&self) -> Result<()> {
        let now = Utc::now();

        for pipeline in &self.pipelines {
            let next_run = state::get(pipeline.next_run_key())
                .await?
                .and_then(|raw| DateTime::parse_from_rfc3339(&raw).ok())
                .map(|dt| dt.with_timezone(&Utc));

            let due = match next_run {
                Some(next) => next <= now,
                None => true,
            };
            if !due {
                continue;
            }

            match next_run_after(&pipeline.schedule_code(), now) {
                Some(next) => {
                    state::set(pipeline.next_run_key(), &next.to_rfc3339()).await?;
                    info!(
                        "{} is due, next run planned at {}",
                        pipeline.name(),
                        next.to_rfc3339()
                    );
                }
                None => {
                    warn!(
                        "{} has an invalid schedule '{}', skipping",
                        pipeline.name(),
                        pipeline.schedule_code()
                    );
                    continue;
                }
            }

            let job = Arc::clone(pipeline);
            tokio::spawn(async move {
                run_pipeline(job, RunTrigger::Scheduled).await;
            });
        }

        Ok(())
    }
}

/// Purge old log entries at most once per calendar day.
async fn run_daily_log_cleanup() -> Result<()> {
    let today = Utc::now().format("%Y-%m-%d").to_string();
    if state::get(state::LAST_LOG_CLEANUP).await?.as_deref() == Some(today.as_str()) {
        return Ok(());
    }

    let removed = logger::cleanup_old_logs().await?;
    if removed > 0 {
        info!("Purged {removed} old log entries");
    }
    state::set(state::LAST_LOG_CLEANUP, &today).await?;
    Ok(())
}
