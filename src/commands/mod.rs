//! CLI command implementations.

pub mod compile;
pub mod list;
pub mod restore_backup;
pub mod resume;
pub mod start;
pub mod status;
pub mod stop;

use anyhow::Result;
use std::path::Path;

use crate::config::Config;

/// Load the config file (defaults if absent) and apply the `--hosts` override.
pub fn load_config(config_path: &Path, hosts: Option<&Path>) -> Result<Config> {
    let mut config = Config::load_or_default(config_path)?;
    if let Some(hosts) = hosts {
        config.hosts_file = hosts.to_path_buf();
    }
    config.validate()?;
    Ok(config)
}
