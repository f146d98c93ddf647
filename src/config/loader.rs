// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::Result;

/// Load a configuration file and return the raw, unvalidated model.
///
/// Use [`load_and_validate`] to also check the template library.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;
    let config: RawConfigFile = toml::from_str(&contents)?;
    debug!(?path, templates = config.template.len(), "config parsed");
    Ok(config)
}

/// Load a configuration file and validate it.
///
/// Rejects files without templates, a zero `propagation_slack`, malformed
/// codes, unknown references, ordering violations and cycles.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let raw_config = load_from_path(&path)?;
    let config = ConfigFile::try_from(raw_config)?;
    Ok(config)
}

/// `Seasonflow.toml` in the current working directory.
pub fn default_config_path() -> PathBuf {
    PathBuf::from("Seasonflow.toml")
}
