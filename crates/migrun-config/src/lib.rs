pub mod loader;
pub mod model;

pub use loader::{ConfigLoader, DEFAULT_CONFIG_FILE};
pub use model::{OnError, RunnerConfig, SplitStrategy};
