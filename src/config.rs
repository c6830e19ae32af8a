//! Application configuration management.
//!
//! Holds the one setting the CLI needs between runs: the default storage
//! root. The `--root` flag and the `GHOSTFS_ROOT` environment variable always
//! take precedence over the config file.

use anyhow::Result;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Default storage root used when no `--root` flag is given.
    #[serde(default)]
    pub root: Option<PathBuf>,
}

impl Config {
    /// Load the configuration from the default platform-specific path.
    pub fn load() -> Self {
        match Self::load_internal() {
            Ok(config) => config,
            Err(e) => {
                log::debug!("Failed to load config, using defaults: {}", e);
                Self::default()
            }
        }
    }

    fn load_internal() -> Result<Self> {
        let path = Self::config_path()?;
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        let config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Save the configuration to the default platform-specific path.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        let project_dirs = project_dirs()?;
        Ok(project_dirs.config_dir().join("config.json"))
    }

    /// Resolve the storage root: explicit flag, then config file, then the
    /// platform data directory.
    pub fn resolve_root(&self, flag: Option<PathBuf>) -> Result<PathBuf> {
        if let Some(root) = flag {
            return Ok(root);
        }
        if let Some(root) = &self.root {
            return Ok(root.clone());
        }
        Ok(project_dirs()?.data_dir().join("store"))
    }
}

fn project_dirs() -> Result<ProjectDirs> {
    ProjectDirs::from("io", "ghostfs", "ghostfs")
        .ok_or_else(|| anyhow::anyhow!("Failed to determine project directories"))
}
