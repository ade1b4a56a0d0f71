//! Configuration management for restraint.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::guard::DEFAULT_HOSTS_FILE;
use crate::lock::DEFAULT_LOCK_FILE;
use crate::utils::parse_duration;

/// Default config file location
#[cfg(windows)]
pub const DEFAULT_CONFIG_FILE: &str = "C:\\ProgramData\\restraint\\config.yaml";
#[cfg(not(windows))]
pub const DEFAULT_CONFIG_FILE: &str = "/etc/restraint/config.yaml";

#[cfg(windows)]
const DEFAULT_BLOCKLIST_FILE: &str = "C:\\ProgramData\\restraint\\blocklist";
#[cfg(not(windows))]
const DEFAULT_BLOCKLIST_FILE: &str = "/etc/restraint/blocklist";

const BACKUP_SUFFIX: &str = ".restraint.bak";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    /// Hosts file to manage
    pub hosts_file: PathBuf,

    /// User blocklist, one domain per line
    pub blocklist_file: PathBuf,

    /// Lock file serializing edits across processes (none = in-process only)
    pub lock_file: Option<PathBuf>,

    /// Copy the hosts file aside before each block
    pub backup: bool,

    /// Seconds between countdown updates
    pub tick_interval_secs: u64,

    /// Block length used when none is given (e.g. "45m", "1h30m")
    pub default_duration: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            hosts_file: PathBuf::from(DEFAULT_HOSTS_FILE),
            blocklist_file: PathBuf::from(DEFAULT_BLOCKLIST_FILE),
            lock_file: Some(PathBuf::from(DEFAULT_LOCK_FILE)),
            backup: true,
            tick_interval_secs: 1,
            default_duration: "1h".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from YAML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;
        let config: Config = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path.as_ref()))?;

        config.validate()?;

        Ok(config)
    }

    /// Load the config file if it exists, defaults otherwise
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        if path.as_ref().exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.hosts_file.as_os_str().is_empty() {
            anyhow::bail!("hosts_file cannot be empty");
        }

        if self.blocklist_file.as_os_str().is_empty() {
            anyhow::bail!("blocklist_file cannot be empty");
        }

        if self.tick_interval_secs == 0 {
            anyhow::bail!("tick_interval_secs must be at least 1");
        }

        parse_duration(&self.default_duration).with_context(|| {
            format!(
                "Invalid default_duration '{}'. Use format like '45m', '1h30m', '1d'",
                self.default_duration
            )
        })?;

        Ok(())
    }

    /// Save configuration to YAML file atomically
    ///
    /// Uses tempfile + rename pattern to prevent corruption on crash.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        use std::io::Write;
        use tempfile::NamedTempFile;

        let path = path.as_ref();
        let content = serde_yaml::to_string(self).with_context(|| "Failed to serialize config")?;

        let parent_dir = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(parent_dir)
            .with_context(|| format!("Failed to create config directory: {:?}", parent_dir))?;
        let mut temp_file = NamedTempFile::new_in(parent_dir)
            .context("Failed to create temporary file for config")?;

        temp_file.write_all(content.as_bytes())?;
        temp_file.as_file().sync_all()?;

        temp_file
            .persist(path)
            .with_context(|| format!("Failed to persist config file: {:?}", path))?;

        Ok(())
    }

    /// Where the hosts file is copied before a block
    pub fn backup_path(&self) -> PathBuf {
        let mut name = self.hosts_file.clone().into_os_string();
        name.push(BACKUP_SUFFIX);
        PathBuf::from(name)
    }
}
