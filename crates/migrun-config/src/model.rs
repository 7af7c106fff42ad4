use std::collections::HashSet;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use migrun_common::{Error, Result};
use serde::{Deserialize, Serialize};

/// Everything a single run needs: where the migrations live, which database
/// to touch, how to treat failing statements and which tables to report on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    pub migrations_dir: PathBuf,
    pub database_path: PathBuf,
    /// File extension (without the dot) that marks a migration file.
    pub extension: String,
    /// Tables whose row counts are printed after the migrations ran.
    pub report_tables: Vec<String>,
    pub on_error: OnError,
    pub split: SplitStrategy,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            migrations_dir: PathBuf::from("migrations"),
            database_path: PathBuf::from("data.db"),
            extension: "sql".to_string(),
            report_tables: Vec::new(),
            on_error: OnError::default(),
            split: SplitStrategy::default(),
        }
    }
}

impl RunnerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.extension.trim().is_empty() {
            return Err(Error::Config("migration extension cannot be empty".into()));
        }
        if self.extension.starts_with('.') {
            return Err(Error::Config(format!(
                "migration extension should not start with a dot: {}",
                self.extension
            )));
        }

        let mut seen = HashSet::new();
        for table in &self.report_tables {
            if table.trim().is_empty() {
                return Err(Error::Config("report table name cannot be empty".into()));
            }
            if !seen.insert(table.as_str()) {
                return Err(Error::Config(format!(
                    "report table listed more than once: {table}"
                )));
            }
        }
        Ok(())
    }
}

/// What to do when a statement inside a migration file fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OnError {
    /// Log the failure as a warning and move on to the next statement.
    #[default]
    Continue,
    /// Stop the run at the first failing statement.
    Abort,
}

impl fmt::Display for OnError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OnError::Continue => f.write_str("continue"),
            OnError::Abort => f.write_str("abort"),
        }
    }
}

impl FromStr for OnError {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "continue" => Ok(OnError::Continue),
            "abort" => Ok(OnError::Abort),
            other => Err(format!("unknown error policy '{other}' (expected continue or abort)")),
        }
    }
}

/// How migration file content is cut into statements.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SplitStrategy {
    /// Split on every `;`, quoting is not understood.
    #[default]
    Naive,
    /// Skip `;` inside quotes and comments.
    Quoted,
}

impl fmt::Display for SplitStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SplitStrategy::Naive => f.write_str("naive"),
            SplitStrategy::Quoted => f.write_str("quoted"),
        }
    }
}

impl FromStr for SplitStrategy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "naive" => Ok(SplitStrategy::Naive),
            "quoted" => Ok(SplitStrategy::Quoted),
            other => Err(format!("unknown split strategy '{other}' (expected naive or quoted)")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_plain_invocation() {
        let config = RunnerConfig::default();
        assert_eq!(config.migrations_dir, PathBuf::from("migrations"));
        assert_eq!(config.database_path, PathBuf::from("data.db"));
        assert_eq!(config.extension, "sql");
        assert!(config.report_tables.is_empty());
        assert_eq!(config.on_error, OnError::Continue);
        assert_eq!(config.split, SplitStrategy::Naive);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_rejects_bad_extension() {
        let mut config = RunnerConfig {
            extension: "  ".into(),
            ..Default::default()
        };
        assert!(config.validate().is_err());

        config.extension = ".sql".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_empty_and_duplicate_tables() {
        let config = RunnerConfig {
            report_tables: vec!["users".into(), "".into()],
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = RunnerConfig {
            report_tables: vec!["users".into(), "users".into()],
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("more than once"));
    }

    #[test]
    fn policies_parse_case_insensitively() {
        assert_eq!("Abort".parse::<OnError>().unwrap(), OnError::Abort);
        assert_eq!("continue".parse::<OnError>().unwrap(), OnError::Continue);
        assert!("retry".parse::<OnError>().is_err());

        assert_eq!("QUOTED".parse::<SplitStrategy>().unwrap(), SplitStrategy::Quoted);
        assert_eq!(SplitStrategy::Naive.to_string(), "naive");
        assert!("smart".parse::<SplitStrategy>().is_err());
    }
}
