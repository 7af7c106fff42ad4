//! Applying migration files statement by statement.
//!
//! Statements run inside a transaction the runner opens on demand and
//! commits at the end of each file. SQLite refuses a few statements inside a
//! transaction (`BEGIN`, `VACUUM`, `ATTACH`, `DETACH`, `PRAGMA journal_mode`)
//! or silently ignores them (`PRAGMA foreign_keys`); before one of those the
//! open transaction is committed and the statement runs in autocommit mode.
//! A file may also end the transaction itself with `COMMIT`, `ROLLBACK` or an
//! `OR ROLLBACK` conflict; the runner then starts a new one for the next
//! statement and skips the final commit when nothing is open.

use std::path::PathBuf;

use migrun_common::{Error, Result};
use migrun_config::{OnError, RunnerConfig, SplitStrategy};
use rusqlite::Connection;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::database::Database;
use crate::migrations::MigrationFile;
use crate::splitter::split_statements;

/// A statement that failed and was skipped because the runner continues on
/// error.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SuppressedFailure {
    pub file: String,
    pub path: PathBuf,
    /// 1-based position of the statement within its file.
    pub index: usize,
    pub statement: String,
    pub error: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ApplySummary {
    pub files_applied: usize,
    pub statements_applied: usize,
    pub suppressed: Vec<SuppressedFailure>,
}

/// Progress notifications emitted while migrations are applied.
#[derive(Debug)]
pub enum ApplyEvent<'a> {
    FileStarted {
        name: &'a str,
        statements: usize,
    },
    StatementSuppressed(&'a SuppressedFailure),
    FileCommitted {
        name: &'a str,
        applied: usize,
    },
}

/// What applying a file would do, without touching a database.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilePlan {
    pub name: String,
    pub statements: usize,
}

/// Applies migration files in order, committing after each file.
#[derive(Debug, Clone, Copy, Default)]
pub struct Runner {
    on_error: OnError,
    split: SplitStrategy,
}

impl Runner {
    pub fn new(on_error: OnError, split: SplitStrategy) -> Self {
        Self { on_error, split }
    }

    pub fn from_config(config: &RunnerConfig) -> Self {
        Self::new(config.on_error, config.split)
    }

    pub fn plan(&self, files: &[MigrationFile]) -> Vec<FilePlan> {
        files
            .iter()
            .map(|file| FilePlan {
                name: file.name.clone(),
                statements: split_statements(&file.sql, self.split).len(),
            })
            .collect()
    }

    pub fn apply(&self, db: &mut Database, files: &[MigrationFile]) -> Result<ApplySummary> {
        self.apply_with(db, files, |_| {})
    }

    /// Apply every file in the given order, calling `on_event` as work
    /// progresses.
    ///
    /// Whatever transaction is still open once all statements of a file have
    /// been attempted is committed, whether or not some failed. With
    /// [`OnError::Abort`] the first failure is returned instead; the open
    /// transaction is rolled back and work committed before it stays applied.
    pub fn apply_with<F>(
        &self,
        db: &mut Database,
        files: &[MigrationFile],
        mut on_event: F,
    ) -> Result<ApplySummary>
    where
        F: FnMut(&ApplyEvent<'_>),
    {
        let conn = db.connection();
        let mut summary = ApplySummary::default();

        for file in files {
            let statements = split_statements(&file.sql, self.split);
            info!(
                "applying {} ({} statements)",
                file.path.display(),
                statements.len()
            );
            on_event(&ApplyEvent::FileStarted {
                name: &file.name,
                statements: statements.len(),
            });

            let mut applied = 0;
            for (i, statement) in statements.iter().enumerate() {
                debug!("{} [{}]: {statement}", file.name, i + 1);
                if needs_autocommit(statement) {
                    commit_open(conn, file)?;
                } else if conn.is_autocommit() {
                    conn.execute_batch("BEGIN")
                        .map_err(|e| Error::Database(format!("failed to begin transaction: {e}")))?;
                }

                match conn.execute_batch(statement) {
                    Ok(()) => applied += 1,
                    Err(e) if self.on_error == OnError::Abort => {
                        rollback_open(conn);
                        return Err(Error::Statement {
                            file: file.path.display().to_string(),
                            index: i + 1,
                            statement: statement.clone(),
                            cause: e.to_string(),
                        });
                    }
                    Err(e) => {
                        warn!(
                            "statement {} in {} failed (may be expected): {e}",
                            i + 1,
                            file.path.display()
                        );
                        let failure = SuppressedFailure {
                            file: file.name.clone(),
                            path: file.path.clone(),
                            index: i + 1,
                            statement: statement.clone(),
                            error: e.to_string(),
                        };
                        on_event(&ApplyEvent::StatementSuppressed(&failure));
                        summary.suppressed.push(failure);
                    }
                }
            }

            commit_open(conn, file)?;

            summary.files_applied += 1;
            summary.statements_applied += applied;
            on_event(&ApplyEvent::FileCommitted {
                name: &file.name,
                applied,
            });
        }

        info!(
            "applied {} file(s), {} statement(s), {} suppressed failure(s)",
            summary.files_applied,
            summary.statements_applied,
            summary.suppressed.len()
        );
        Ok(summary)
    }
}

fn commit_open(conn: &Connection, file: &MigrationFile) -> Result<()> {
    if conn.is_autocommit() {
        return Ok(());
    }
    conn.execute_batch("COMMIT")
        .map_err(|e| Error::Database(format!("failed to commit {}: {e}", file.path.display())))
}

fn rollback_open(conn: &Connection) {
    if !conn.is_autocommit() {
        if let Err(e) = conn.execute_batch("ROLLBACK") {
            warn!("rollback after failed statement did not succeed: {e}");
        }
    }
}

/// Statements SQLite rejects or ignores inside a transaction.
fn needs_autocommit(statement: &str) -> bool {
    let mut words = leading_words(statement);
    let Some(first) = words.next() else {
        return false;
    };
    match first.as_str() {
        "BEGIN" | "VACUUM" | "ATTACH" | "DETACH" => true,
        "PRAGMA" => words.next().is_some_and(|name| {
            // Drop an optional schema prefix, e.g. `main.journal_mode`.
            let name = name.rsplit('.').next().unwrap_or(&name);
            matches!(name, "JOURNAL_MODE" | "FOREIGN_KEYS")
        }),
        _ => false,
    }
}

/// Upper-cased words at the start of `statement`, skipping leading comments.
fn leading_words(statement: &str) -> impl Iterator<Item = String> + '_ {
    let mut rest = statement.trim_start();
    loop {
        if let Some(after) = rest.strip_prefix("--") {
            rest = after.split_once('\n').map_or("", |(_, tail)| tail).trim_start();
        } else if let Some(after) = rest.strip_prefix("/*") {
            rest = after.split_once("*/").map_or("", |(_, tail)| tail).trim_start();
        } else {
            break;
        }
    }
    rest.split(|c: char| !(c.is_ascii_alphanumeric() || c == '_' || c == '.'))
        .filter(|w| !w.is_empty())
        .map(str::to_ascii_uppercase)
}
