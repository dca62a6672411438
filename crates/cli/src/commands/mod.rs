//! Command implementations.

mod batch_size;
mod identity;
mod probe;
mod run;
mod validate;

use std::path::Path;

use anyhow::{Context, Result};
use contracts::CoordinatorConfig;

pub use batch_size::run_batch_size;
pub use identity::run_identity;
pub use probe::run_probe;
pub use run::run_dispatch;
pub use validate::run_validate;

/// Load configuration from `path`, or fall back to defaults
fn load_config(path: Option<&Path>) -> Result<CoordinatorConfig> {
    match path {
        Some(path) => config_loader::ConfigLoader::load_from_path(path)
            .with_context(|| format!("Failed to load config from {}", path.display())),
        None => Ok(CoordinatorConfig::default()),
    }
}
