use chrono::Utc;
use migrun_common::Result;
use migrun_config::RunnerConfig;
use tracing::info;

use crate::database::Database;
use crate::migrations::discover;
use crate::report::{RunReport, report_tables};
use crate::runner::{ApplyEvent, Runner};

/// Discover, apply and report in one go.
///
/// The apply phase and the report phase each get their own connection; the
/// first is closed before the second is opened.
pub fn run<F>(config: &RunnerConfig, on_event: F) -> Result<RunReport>
where
    F: FnMut(&ApplyEvent<'_>),
{
    let started_at = Utc::now();
    let files = discover(&config.migrations_dir, &config.extension)?;

    let mut db = Database::open(&config.database_path)?;
    let summary = Runner::from_config(config).apply_with(&mut db, &files, on_event)?;
    db.close()?;

    info!("reporting on {} table(s)", config.report_tables.len());
    let db = Database::open(&config.database_path)?;
    let tables = report_tables(&db, &config.report_tables);
    db.close()?;

    Ok(RunReport {
        started_at,
        finished_at: Utc::now(),
        summary,
        tables,
    })
}
