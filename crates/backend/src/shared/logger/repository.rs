use std::collections::BTreeMap;

use anyhow::Result;
use chrono::{DateTime, NaiveDateTime, Utc};
use contracts::enums::LogLevel;
use contracts::shared::logger::{LogCounts, LogEntry, RunSummary};
use sea_orm::entity::prelude::*;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set};
use std::io::Write;

use crate::shared::data::db::get_connection;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "system_log")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub created_at: String,
    pub level: String,
    pub message: String,
    pub context: Option<String>,
    pub run_id: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

fn parse_timestamp(raw: &str) -> DateTime<Utc> {
    NaiveDateTime::parse_from_str(raw, TIMESTAMP_FORMAT)
        .map(|n| n.and_utc())
        .unwrap_or_else(|_| Utc::now())
}

impl From<Model> for LogEntry {
    fn from(m: Model) -> Self {
        LogEntry {
            id: m.id,
            created_at: parse_timestamp(&m.created_at),
            level: LogLevel::from_code(&m.level).unwrap_or(LogLevel::Info),
            message: m.message,
            context: m.context.and_then(|c| serde_json::from_str(&c).ok()),
            run_id: m.run_id,
        }
    }
}

fn conn() -> &'static DatabaseConnection {
    get_connection()
}

/// Append one entry to the sync log.
pub async fn insert(
    level: LogLevel,
    message: &str,
    context: Option<&serde_json::Value>,
    run_id: Option<&str>,
) -> Result<()> {
    let now = Utc::now().format(TIMESTAMP_FORMAT).to_string();

    let active = ActiveModel {
        id: sea_orm::ActiveValue::NotSet,
        created_at: Set(now),
        level: Set(level.code().to_string()),
        message: Set(message.to_string()),
        context: Set(context.map(|c| c.to_string())),
        run_id: Set(run_id.map(|r| r.to_string())),
    };

    active.insert(conn()).await?;
    Ok(())
}

/// Latest entries, newest first, optionally narrowed to one level.
pub async fn list_recent(limit: u64, level: Option<LogLevel>) -> Result<Vec<LogEntry>> {
    let mut query = Entity::find();
    if let Some(level) = level {
        query = query.filter(Column::Level.eq(level.code()));
    }
    let logs = query
        .order_by_desc(Column::Id)
        .limit(limit)
        .all(conn())
        .await?;
    Ok(logs.into_iter().map(Into::into).collect())
}

/// All entries of one run, oldest first. `None` selects the orphan
/// entries written outside any run.
pub async fn list_by_run(run_id: Option<&str>) -> Result<Vec<LogEntry>> {
    let filter = match run_id {
        Some(id) => Column::RunId.eq(id),
        None => Column::RunId.is_null(),
    };
    let logs = Entity::find()
        .filter(filter)
        .order_by_asc(Column::Id)
        .all(conn())
        .await?;
    Ok(logs.into_iter().map(Into::into).collect())
}

/// Entry counts per level over the whole log.
pub async fn counts_by_level() -> Result<LogCounts> {
    let mut counts = LogCounts::default();
    for level in LogLevel::all() {
        let n = Entity::find()
            .filter(Column::Level.eq(level.code()))
            .count(conn())
            .await?;
        match level {
            LogLevel::Info => counts.info = n,
            LogLevel::Success => counts.success = n,
            LogLevel::Warning => counts.warning = n,
            LogLevel::Error => counts.error = n,
        }
    }
    Ok(counts)
}

/// Group the log into runs for listings, newest run first. Orphan
/// entries (no run id) are grouped together under `run_id: None`.
pub async fn run_summaries() -> Result<Vec<RunSummary>> {
    let logs = Entity::find()
        .order_by_asc(Column::Id)
        .all(conn())
        .await?;

    let mut groups: BTreeMap<Option<String>, Vec<&Model>> = BTreeMap::new();
    for log in &logs {
        groups.entry(log.run_id.clone()).or_default().push(log);
    }

    let mut summaries: Vec<RunSummary> = groups
        .into_iter()
        .map(|(run_id, entries)| {
            let mut counts = LogCounts::default();
            for e in &entries {
                match LogLevel::from_code(&e.level).unwrap_or(LogLevel::Info) {
                    LogLevel::Info => counts.info += 1,
                    LogLevel::Success => counts.success += 1,
                    LogLevel::Warning => counts.warning += 1,
                    LogLevel::Error => counts.error += 1,
                }
            }
            RunSummary {
                run_id,
                started_at: parse_timestamp(&entries[0].created_at),
                finished_at: parse_timestamp(&entries[entries.len() - 1].created_at),
                counts,
            }
        })
        .collect();

    summaries.sort_by(|a, b| b.started_at.cmp(&a.started_at));
    Ok(summaries)
}

/// Delete entries older than `days`. Returns the number removed.
pub async fn purge_older_than(days: i64) -> Result<u64> {
    let cutoff = (Utc::now() - chrono::Duration::days(days))
        .format(TIMESTAMP_FORMAT)
        .to_string();
    let result = Entity::delete_many()
        .filter(Column::CreatedAt.lt(cutoff))
        .exec(conn())
        .await?;
    Ok(result.rows_affected)
}

/// Remove every entry.
pub async fn clear_all() -> Result<()> {
    Entity::delete_many().exec(conn()).await?;
    Ok(())
}

/// Export the whole log as CSV. A UTF-8 BOM is written first so the
/// file opens cleanly in Excel.
pub async fn export_csv(path: &std::path::Path) -> Result<u64> {
    let logs = Entity::find().order_by_asc(Column::Id).all(conn()).await?;

    let mut file = std::fs::File::create(path)?;
    file.write_all(b"\xEF\xBB\xBF")?;

    let mut writer = csv::Writer::from_writer(file);
    writer.write_record(["id", "timestamp", "level", "message", "context", "run_id"])?;
    let mut written = 0u64;
    for log in logs {
        writer.write_record([
            log.id.to_string(),
            log.created_at,
            log.level,
            log.message,
            log.context.unwrap_or_default(),
            log.run_id.unwrap_or_default(),
        ])?;
        written += 1;
    }
    writer.flush()?;
    Ok(written)
}
