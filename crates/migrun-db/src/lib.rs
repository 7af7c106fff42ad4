pub mod database;
pub mod migrations;
pub mod report;
pub mod run;
pub mod runner;
pub mod splitter;

pub use database::Database;
pub use migrations::{MigrationFile, discover};
pub use report::{RunReport, TableReport, report_tables, to_json_pretty};
pub use run::run;
pub use runner::{ApplyEvent, ApplySummary, FilePlan, Runner, SuppressedFailure};
pub use splitter::split_statements;
