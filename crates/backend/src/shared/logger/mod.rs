pub mod repository;

use contracts::enums::{LogLevel, RunTrigger};

/// How long log entries are kept before the daily cleanup removes them.
pub const RETENTION_DAYS: i64 = 30;

/// Identity of one sync run. Passed explicitly to everything that logs
/// on behalf of the run, so concurrent runs cannot mix their entries.
#[derive(Debug, Clone)]
pub struct RunContext {
    pub run_id: String,
    pub trigger: RunTrigger,
}

impl RunContext {
    /// Timestamp plus a random suffix keeps ids unique even when two
    /// runs start within the same second.
    pub fn new(trigger: RunTrigger) -> Self {
        let run_id = format!(
            "{}-{:04x}",
            chrono::Utc::now().format("%Y%m%d%H%M%S"),
            rand::random::<u16>()
        );
        Self { run_id, trigger }
    }
}

/// Mirror the message to `tracing`, then persist it. The insert is
/// awaited so a run's terminal entry is durable before the caller
/// returns; a CLI run would otherwise drop the runtime with the write
/// still pending. Persistence failures are reported but never bubble up.
async fn write(
    ctx: Option<&RunContext>,
    level: LogLevel,
    message: &str,
    context: Option<serde_json::Value>,
) {
    match level {
        LogLevel::Error => tracing::error!("{}", message),
        LogLevel::Warning => tracing::warn!("{}", message),
        _ => tracing::info!("{}", message),
    }

    let run_id = ctx.map(|c| c.run_id.as_str());
    if let Err(e) = repository::insert(level, message, context.as_ref(), run_id).await {
        eprintln!("Failed to write sync log entry: {}", e);
    }
}

pub async fn info(ctx: Option<&RunContext>, message: &str, context: Option<serde_json::Value>) {
    write(ctx, LogLevel::Info, message, context).await;
}

pub async fn success(ctx: Option<&RunContext>, message: &str, context: Option<serde_json::Value>) {
    write(ctx, LogLevel::Success, message, context).await;
}

pub async fn warning(ctx: Option<&RunContext>, message: &str, context: Option<serde_json::Value>) {
    write(ctx, LogLevel::Warning, message, context).await;
}

pub async fn error(ctx: Option<&RunContext>, message: &str, context: Option<serde_json::Value>) {
    write(ctx, LogLevel::Error, message, context).await;
}

/// Purge entries past the retention window.
pub async fn cleanup_old_logs() -> anyhow::Result<u64> {
    let removed = repository::purge_older_than(RETENTION_DAYS).await?;
    if removed > 0 {
        tracing::info!("Removed {} log entries older than {} days", removed, RETENTION_DAYS);
    }
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_ids_are_unique_and_sortable() {
        let a = RunContext::new(RunTrigger::Manual);
        let b = RunContext::new(RunTrigger::Scheduled);
        assert_ne!(a.run_id, b.run_id);
        // timestamp prefix, dash, 4 hex chars
        assert_eq!(a.run_id.len(), 14 + 1 + 4);
        assert!(a.run_id.chars().take(14).all(|c| c.is_ascii_digit()));
    }
}
