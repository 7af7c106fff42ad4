use chrono::{DateTime, Utc};
use migrun_common::Result;
use serde::Serialize;
use tracing::debug;

use crate::database::Database;
use crate::runner::ApplySummary;

/// Row count for one tracked table. `rows` is `None` when the table could
/// not be counted, which in practice means it does not exist.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableReport {
    pub table: String,
    pub rows: Option<i64>,
}

impl TableReport {
    pub fn exists(&self) -> bool {
        self.rows.is_some()
    }
}

/// Everything one invocation did, in a form that can be printed or
/// serialized.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub summary: ApplySummary,
    pub tables: Vec<TableReport>,
}

/// Count the rows of each table in `tables`. Query failures are recorded as
/// a missing table and never returned as errors.
pub fn report_tables(db: &Database, tables: &[String]) -> Vec<TableReport> {
    tables
        .iter()
        .map(|table| {
            let sql = format!("SELECT COUNT(*) FROM {}", quote_identifier(table));
            let rows = match db.connection().query_row(&sql, [], |row| row.get::<_, i64>(0)) {
                Ok(count) => Some(count),
                Err(e) => {
                    debug!("could not count rows in {table}: {e}");
                    None
                }
            };
            TableReport {
                table: table.clone(),
                rows,
            }
        })
        .collect()
}

/// Pretty-printed JSON for a report or a dry-run plan.
pub fn to_json_pretty<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
