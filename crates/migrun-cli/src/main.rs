mod output;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use migrun_config::{ConfigLoader, OnError, RunnerConfig, SplitStrategy};
use migrun_db::{Runner, discover, to_json_pretty};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Apply ordered SQL migration files to a SQLite database and report table
/// row counts. With no arguments it reads `migrations/*.sql` into `data.db`.
#[derive(Parser, Debug)]
#[command(name = "migrun", version, about)]
struct Cli {
    /// Config file (YAML or TOML). Defaults to ./migrun.yml when present.
    #[arg(long, env = "MIGRUN_CONFIG")]
    config: Option<PathBuf>,

    /// Directory holding the migration files
    #[arg(long, env = "MIGRUN_MIGRATIONS_DIR")]
    migrations: Option<PathBuf>,

    /// SQLite database file to migrate
    #[arg(long, env = "MIGRUN_DATABASE")]
    database: Option<PathBuf>,

    /// Table to report a row count for (repeatable, replaces the configured list)
    #[arg(long = "table", value_name = "NAME")]
    tables: Vec<String>,

    /// What to do when a statement fails: continue or abort
    #[arg(long)]
    on_error: Option<OnError>,

    /// Statement splitting: naive (every ';') or quoted
    #[arg(long)]
    split: Option<SplitStrategy>,

    /// Print the run report as JSON
    #[arg(long)]
    json: bool,

    /// List the migrations that would run without opening the database
    #[arg(long)]
    dry_run: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn resolve_config(&self) -> Result<RunnerConfig> {
        let mut config = ConfigLoader::load_or_default(self.config.as_deref())
            .context("failed to load configuration")?;

        if let Some(dir) = &self.migrations {
            config.migrations_dir = dir.clone();
        }
        if let Some(path) = &self.database {
            config.database_path = path.clone();
        }
        if !self.tables.is_empty() {
            config.report_tables = self.tables.clone();
        }
        if let Some(on_error) = self.on_error {
            config.on_error = on_error;
        }
        if let Some(split) = self.split {
            config.split = split;
        }

        config.validate().context("invalid configuration")?;
        Ok(config)
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "migrun=info,migrun_config=info,migrun_db=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = cli.resolve_config()?;
    info!(
        migrations = %config.migrations_dir.display(),
        database = %config.database_path.display(),
        on_error = %config.on_error,
        split = %config.split,
        "starting migration run"
    );

    if cli.dry_run {
        let files = discover(&config.migrations_dir, &config.extension)
            .context("failed to read migrations")?;
        let plans = Runner::from_config(&config).plan(&files);
        if cli.json {
            println!("{}", to_json_pretty(&plans)?);
        } else {
            for line in output::plan_lines(&plans) {
                println!("{line}");
            }
        }
        return Ok(());
    }

    let report = migrun_db::run(&config, |event| {
        if cli.json {
            return;
        }
        if let Some(line) = output::progress_line(event) {
            println!("{line}");
        }
    })
    .with_context(|| format!("migration run against {} failed", config.database_path.display()))?;

    if cli.json {
        println!("{}", to_json_pretty(&report)?);
    } else {
        for line in output::report_lines(&report) {
            println!("{line}");
        }
    }

    Ok(())
}
