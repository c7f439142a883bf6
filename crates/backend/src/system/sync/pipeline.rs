use std::str::FromStr;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use contracts::enums::{RunStatus, RunTrigger, ScheduleRecurrence};
use tracing::{error, info};

use crate::shared::logger::{self, RunContext};
use crate::shared::state;

/// One schedulable sync job. The worker and the CLI both start jobs
/// through this seam, so both triggers share the same run bookkeeping.
#[async_trait]
pub trait SyncPipeline: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// sync_state key holding the next planned run time.
    fn next_run_key(&self) -> &'static str;

    /// Configured schedule spelling ("hourly", a bare minute count, or
    /// a cron expression).
    fn schedule_code(&self) -> String;

    /// Run the job; returns a one-line summary for the success log.
    async fn execute(&self, ctx: &RunContext) -> Result<String>;

    /// Persist a failed last-run snapshot for a job that died without
    /// reporting one itself (panic).
    async fn record_aborted(&self, ctx: &RunContext);
}

/// Compute when a schedule fires next. Named recurrences advance by a
/// fixed interval; anything else is tried as a cron expression.
pub fn next_run_after(schedule_code: &str, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    if let Some(recurrence) = ScheduleRecurrence::from_code(schedule_code) {
        return Some(now + Duration::seconds(recurrence.interval_secs() as i64));
    }
    cron::Schedule::from_str(schedule_code)
        .ok()
        .and_then(|schedule| schedule.after(&now).next())
}

/// Run a pipeline to completion, turning panics into failed runs so the
/// worker loop survives anything a job does.
pub async fn run_pipeline(pipeline: Arc<dyn SyncPipeline>, trigger: RunTrigger) -> RunStatus {
    let ctx = RunContext::new(trigger);
    info!(
        "Starting {} run {} ({})",
        pipeline.name(),
        ctx.run_id,
        trigger.code()
    );

    // Advisory overlap flag: warned about, never enforced.
    match state::get(state::SYNC_RUNNING).await {
        Ok(Some(other)) => {
            logger::warning(
                Some(&ctx),
                &format!("Another sync run appears to be active ({other})."),
                None,
            )
            .await;
        }
        Ok(None) => {}
        Err(e) => tracing::warn!("failed to read running flag: {e}"),
    }
    if let Err(e) = state::set(state::SYNC_RUNNING, &ctx.run_id).await {
        tracing::warn!("failed to set running flag: {e}");
    }

    let task_ctx = ctx.clone();
    let task_pipeline = Arc::clone(&pipeline);
    let outcome =
        tokio::spawn(async move { task_pipeline.execute(&task_ctx).await }).await;

    if let Err(e) = state::remove(state::SYNC_RUNNING).await {
        tracing::warn!("failed to clear running flag: {e}");
    }

    match outcome {
        Ok(Ok(summary)) => {
            info!("{} run {} finished: {}", pipeline.name(), ctx.run_id, summary);
            RunStatus::Success
        }
        Ok(Err(e)) => {
            error!("{} run {} failed: {e:?}", pipeline.name(), ctx.run_id);
            RunStatus::Failed
        }
        Err(join_error) => {
            error!(
                "{} run {} panicked: {join_error}",
                pipeline.name(),
                ctx.run_id
            );
            logger::error(
                Some(&ctx),
                &format!("{} run aborted unexpectedly.", pipeline.name()),
                None,
            )
            .await;
            pipeline.record_aborted(&ctx).await;
            RunStatus::Failed
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn named_recurrences_advance_by_interval() {
        let now = Utc.with_ymd_and_hms(2025, 3, 7, 9, 0, 0).unwrap();
        assert_eq!(
            next_run_after("hourly", now),
            Some(Utc.with_ymd_and_hms(2025, 3, 7, 10, 0, 0).unwrap())
        );
        assert_eq!(
            next_run_after("15", now),
            Some(Utc.with_ymd_and_hms(2025, 3, 7, 9, 15, 0).unwrap())
        );
    }

    #[test]
    fn cron_expressions_are_honored() {
        let now = Utc.with_ymd_and_hms(2025, 3, 7, 9, 0, 0).unwrap();
        // Every day at 03:00.
        let next = next_run_after("0 0 3 * * *", now).unwrap();
        assert_eq!(next, Utc.with_ymd_and_hms(2025, 3, 8, 3, 0, 0).unwrap());
    }

    #[test]
    fn garbage_schedules_yield_nothing() {
        assert_eq!(next_run_after("sometimes", Utc::now()), None);
    }
}
