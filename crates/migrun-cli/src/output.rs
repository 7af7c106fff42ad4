use migrun_db::{ApplyEvent, FilePlan, RunReport};

const WIDTH: usize = 60;

/// Console line for a progress event, if it warrants one.
pub fn progress_line(event: &ApplyEvent<'_>) -> Option<String> {
    match event {
        ApplyEvent::FileStarted { name, statements } => {
            Some(format!("Applying {name} ({statements} statements)"))
        }
        ApplyEvent::StatementSuppressed(failure) => Some(format!(
            "  warning: statement {} failed (may be expected): {}",
            failure.index, failure.error
        )),
        ApplyEvent::FileCommitted { .. } => None,
    }
}

pub fn plan_lines(plans: &[FilePlan]) -> Vec<String> {
    if plans.is_empty() {
        return vec!["No migrations found.".to_string()];
    }
    let mut lines = vec![format!("{} migration(s) would be applied:", plans.len())];
    lines.extend(
        plans
            .iter()
            .map(|p| format!("  {:<40} {:>4} statements", p.name, p.statements)),
    );
    lines
}

/// Success banner followed by the per-table row counts, boxed.
pub fn report_lines(report: &RunReport) -> Vec<String> {
    let summary = &report.summary;
    let title = "Migrations applied";
    let inner = WIDTH - 4; // "│ " + " │"

    let top = format!("╭─ {title} {}╮", "─".repeat(WIDTH - 5 - title.chars().count()));
    let sep = format!("├{}┤", "─".repeat(WIDTH - 2));
    let bottom = format!("╰{}╯", "─".repeat(WIDTH - 2));
    let row = |text: &str| format!("│ {:<inner$} │", text);

    let mut lines = vec![top];
    lines.push(row(&format!(
        "{} file(s), {} statement(s)",
        summary.files_applied, summary.statements_applied
    )));
    if !summary.suppressed.is_empty() {
        lines.push(row(&format!(
            "{} statement(s) failed and were skipped",
            summary.suppressed.len()
        )));
    }

    if !report.tables.is_empty() {
        lines.push(sep);
        for table in &report.tables {
            let status = match table.rows {
                Some(n) => format!("{n} rows"),
                None => "does not exist".to_string(),
            };
            lines.push(row(&format!("{:<30}{status}", table.table)));
        }
    }

    lines.push(bottom);
    lines
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use migrun_db::{ApplySummary, SuppressedFailure, TableReport};

    use super::*;

    fn report(tables: Vec<TableReport>, suppressed: usize) -> RunReport {
        let failure = SuppressedFailure {
            file: "001.sql".into(),
            path: "migrations/001.sql".into(),
            index: 1,
            statement: "bad".into(),
            error: "syntax error".into(),
        };
        RunReport {
            started_at: Utc::now(),
            finished_at: Utc::now(),
            summary: ApplySummary {
                files_applied: 2,
                statements_applied: 5,
                suppressed: vec![failure; suppressed],
            },
            tables,
        }
    }

    #[test]
    fn report_marks_missing_tables() {
        let lines = report_lines(&report(
            vec![
                TableReport { table: "users".into(), rows: Some(4) },
                TableReport { table: "ghosts".into(), rows: None },
            ],
            0,
        ));

        assert!(lines[0].contains("Migrations applied"));
        assert!(lines[1].contains("2 file(s), 5 statement(s)"));
        assert!(lines.iter().any(|l| l.contains("users") && l.contains("4 rows")));
        assert!(lines.iter().any(|l| l.contains("ghosts") && l.contains("does not exist")));
    }

    #[test]
    fn box_lines_share_one_width() {
        let lines = report_lines(&report(
            vec![TableReport { table: "users".into(), rows: Some(1) }],
            2,
        ));
        assert!(lines.iter().any(|l| l.contains("2 statement(s) failed")));
        for line in &lines {
            assert_eq!(line.chars().count(), WIDTH, "{line}");
        }
    }

    #[test]
    fn suppressed_statement_line_says_may_be_expected() {
        let failure = SuppressedFailure {
            file: "002.sql".into(),
            path: "migrations/002.sql".into(),
            index: 3,
            statement: "CREATE TABLE t (x)".into(),
            error: "table t already exists".into(),
        };
        let line = progress_line(&ApplyEvent::StatementSuppressed(&failure)).unwrap();
        assert_eq!(
            line,
            "  warning: statement 3 failed (may be expected): table t already exists"
        );
        assert!(progress_line(&ApplyEvent::FileCommitted { name: "002.sql", applied: 1 }).is_none());
    }

    #[test]
    fn empty_plan() {
        assert_eq!(plan_lines(&[]), vec!["No migrations found."]);
    }
}
