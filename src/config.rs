//! Configuration management

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Directory where snapshot archives are downloaded and kept.
    pub downloads: PathBuf,
    /// Root directory for versioned install trees, `<base_path>/<major>`.
    pub base_path: PathBuf,
    /// Prefer the chromedriver updater over the standalone installer
    /// when `--with-driver` is passed.
    pub prefer_driver_update: bool,
}

impl Default for Config {
    fn default() -> Self {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));

        Self {
            downloads: home.join("Downloads"),
            base_path: home.join("chromium"),
            prefer_driver_update: true,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        let mut config = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)
                .context("Failed to read config file")?;
            serde_json::from_str::<Config>(&content).context("Failed to parse config file")?
        } else {
            Self::default()
        };

        config.downloads = expand_home(&config.downloads);
        config.base_path = expand_home(&config.base_path);
        Ok(config)
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().context("Could not determine config directory")?;
        Ok(config_dir.join("chromium-install").join("config.json"))
    }
}

/// Expand a leading `$HOME` or `~` so config files can stay portable.
pub fn expand_home(path: &Path) -> PathBuf {
    let Some(text) = path.to_str() else {
        return path.to_path_buf();
    };
    let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));

    if let Some(rest) = text.strip_prefix("$HOME") {
        home.join(rest.trim_start_matches('/'))
    } else if let Some(rest) = text.strip_prefix('~') {
        home.join(rest.trim_start_matches('/'))
    } else {
        path.to_path_buf()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expands_home_placeholder() {
        let home = dirs::home_dir().unwrap();
        assert_eq!(expand_home(Path::new("$HOME/chromium")), home.join("chromium"));
        assert_eq!(expand_home(Path::new("~/chromium")), home.join("chromium"));
    }

    #[test]
    fn leaves_plain_paths_alone() {
        assert_eq!(
            expand_home(Path::new("/opt/chromium")),
            PathBuf::from("/opt/chromium")
        );
    }

    #[test]
    fn defaults_point_under_the_home_directory() {
        let config = Config::default();
        assert!(config.base_path.ends_with("chromium"));
        assert!(config.prefer_driver_update);
    }
}
