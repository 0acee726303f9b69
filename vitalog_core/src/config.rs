//! Configuration file support for Vitalog.
//!
//! Configuration is loaded from `$XDG_CONFIG_HOME/vitalog/config.toml`.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub sync: SyncConfig,

    #[serde(default)]
    pub tracking: TrackingConfig,
}

/// Data storage configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

/// Best-effort mirror of the state documents, standing in for a remote
/// store. Absent means local-only.
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct SyncConfig {
    #[serde(default)]
    pub mirror_dir: Option<PathBuf>,
}

/// Tracking defaults applied when the profile leaves them unset
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TrackingConfig {
    #[serde(default = "default_step_goal")]
    pub default_step_goal: u32,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            default_step_goal: default_step_goal(),
        }
    }
}

// Default value functions
fn default_data_dir() -> PathBuf {
    let base = dirs::data_local_dir().unwrap_or_else(|| {
        let home = std::env::var("HOME").expect("HOME environment variable not set");
        PathBuf::from(home).join(".local/share")
    });
    base.join("vitalog")
}

fn default_step_goal() -> u32 {
    10_000
}

impl Config {
    /// Load configuration from the standard config path
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path();
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::info!("No config file found at {:?}, using defaults", config_path);
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        let base = dirs::config_dir().unwrap_or_else(|| {
            let home = std::env::var("HOME").expect("HOME environment variable not set");
            PathBuf::from(home).join(".config")
        });
        base.join("vitalog").join("config.toml")
    }

    /// Save the current configuration to the default path
    pub fn save(&self) -> Result<()> {
        let config_path = Self::default_config_path();
        self.save_to(&config_path)
    }

    /// Save the current configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, contents)?;
        tracing::info!("Saved config to {:?}", path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.tracking.default_step_goal, 10_000);
        assert!(config.sync.mirror_dir.is_none());
        assert!(config.data.data_dir.ends_with("vitalog"));
    }

    #[test]
    fn test_config_roundtrip() {
        let mut config = Config::default();
        config.sync.mirror_dir = Some(PathBuf::from("/tmp/vitalog-mirror"));

        let toml_str = toml::to_string(&config).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();

        assert_eq!(
            config.tracking.default_step_goal,
            parsed.tracking.default_step_goal
        );
        assert_eq!(config.sync.mirror_dir, parsed.sync.mirror_dir);
    }

    #[test]
    fn test_partial_config() {
        let toml_str = r#"
[tracking]
default_step_goal = 8000
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.tracking.default_step_goal, 8000);
        assert!(config.sync.mirror_dir.is_none()); // default
    }
}
