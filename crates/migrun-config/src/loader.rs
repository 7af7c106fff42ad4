use std::path::Path;

use migrun_common::{Error, Result};
use tracing::{debug, info};

use crate::model::RunnerConfig;

/// Config file picked up from the working directory when none is given.
pub const DEFAULT_CONFIG_FILE: &str = "migrun.yml";

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load and validate a config file. The parser is chosen by extension.
    pub fn load(path: &Path) -> Result<RunnerConfig> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("failed to read {}: {e}", path.display()))
        })?;

        let config = Self::parse(&contents, path)?;
        config.validate()?;
        info!("config loaded from {}", path.display());
        Ok(config)
    }

    /// Load `path` if given, otherwise `migrun.yml` when it exists, otherwise
    /// fall back to defaults. An explicitly given path must exist.
    pub fn load_or_default(path: Option<&Path>) -> Result<RunnerConfig> {
        match path {
            Some(path) => Self::load(path),
            None => {
                let default_path = Path::new(DEFAULT_CONFIG_FILE);
                if default_path.is_file() {
                    Self::load(default_path)
                } else {
                    debug!("no {DEFAULT_CONFIG_FILE} found, using defaults");
                    Ok(RunnerConfig::default())
                }
            }
        }
    }

    fn parse(contents: &str, path: &Path) -> Result<RunnerConfig> {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        match ext {
            "yml" | "yaml" => serde_yaml::from_str(contents)
                .map_err(|e| Error::Config(format!("YAML parse error: {e}"))),
            "toml" => toml::from_str(contents)
                .map_err(|e| Error::Config(format!("TOML parse error: {e}"))),
            other => Err(Error::Config(format!(
                "unsupported config extension: {other}"
            ))),
        }
    }
}
