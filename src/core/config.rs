//! Adapter configuration management

use std::path::{Path, PathBuf};

use anyhow::Result;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

/// Adapter configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdapterConfig {
    /// Extension appended to the map title when saving
    pub file_extension: String,
    /// Indentation width of saved JSON, in spaces
    pub indent: usize,
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self {
            file_extension: ".mup".to_string(),
            indent: 2,
        }
    }
}

impl AdapterConfig {
    /// Get the config file path
    fn config_path() -> Option<PathBuf> {
        ProjectDirs::from("com", "mapsource", "Mapsource")
            .map(|dirs| dirs.config_dir().join("config.json"))
    }

    /// Load configuration from the platform config directory
    pub fn load() -> Result<Self> {
        let path = Self::config_path()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;
        Self::load_from(&path)
    }

    /// Load configuration from a file, falling back to defaults if it is missing
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to the platform config directory
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;
        self.save_to(&path)
    }

    /// Save configuration to a file
    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Ensure config directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;

        tracing::info!("Saved config to: {}", path.display());
        Ok(())
    }

    /// Build the file name a map with the given title is saved under
    pub fn file_name_for(&self, title: &str) -> String {
        if self.file_extension.is_empty() || self.file_extension.starts_with('.') {
            format!("{}{}", title, self.file_extension)
        } else {
            format!("{}.{}", title, self.file_extension)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_name_for() {
        let config = AdapterConfig::default();
        assert_eq!(config.file_name_for("abc"), "abc.mup");

        let config = AdapterConfig {
            file_extension: "json".to_string(),
            ..Default::default()
        };
        assert_eq!(config.file_name_for("abc"), "abc.json");
    }

    #[test]
    fn test_load_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = AdapterConfig::load_from(&dir.path().join("config.json")).unwrap();
        assert_eq!(config, AdapterConfig::default());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let config = AdapterConfig {
            file_extension: ".mm.json".to_string(),
            indent: 4,
        };
        config.save_to(&path).unwrap();
        assert_eq!(AdapterConfig::load_from(&path).unwrap(), config);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"indent": 3}"#).unwrap();
        let config = AdapterConfig::load_from(&path).unwrap();
        assert_eq!(config.indent, 3);
        assert_eq!(config.file_extension, ".mup");
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "not json").unwrap();
        assert!(AdapterConfig::load_from(&path).is_err());
    }
}
