use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::{DuetError, DuetResult};
use crate::types::{DisplayType, PlatformId};
use crate::video::VideoContextSettings;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DisplaysConfig {
    /// Displays brought up when dual output is enabled, canonical first.
    pub enabled: Vec<DisplayType>,
    /// Settings a fresh horizontal context starts from.
    pub horizontal: VideoContextSettings,
    /// Settings a fresh vertical context starts from.
    pub vertical: VideoContextSettings,
}

impl Default for DisplaysConfig {
    fn default() -> Self {
        Self {
            enabled: DisplayType::ALL.to_vec(),
            horizontal: VideoContextSettings::defaults_for(DisplayType::Horizontal),
            vertical: VideoContextSettings::defaults_for(DisplayType::Vertical),
        }
    }
}

impl DisplaysConfig {
    pub fn defaults_for(&self, display: DisplayType) -> VideoContextSettings {
        match display {
            DisplayType::Horizontal => self.horizontal,
            DisplayType::Vertical => self.vertical,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PlatformsConfig {
    /// Initial platform to display assignments for a fresh state.
    pub assignments: BTreeMap<PlatformId, DisplayType>,
}

impl Default for PlatformsConfig {
    fn default() -> Self {
        let assignments = ["twitch", "youtube", "facebook", "trovo"]
            .into_iter()
            .map(|p| (PlatformId::new(p), DisplayType::Horizontal))
            .collect();
        Self { assignments }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    /// Directory holding one dual output state file per scene collection.
    pub state_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            state_dir: PathBuf::from(".duet"),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DuetConfig {
    #[serde(default)]
    pub displays: DisplaysConfig,
    #[serde(default)]
    pub platforms: PlatformsConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
}

fn default_log_filter() -> String {
    "info".to_string()
}

impl Default for DuetConfig {
    fn default() -> Self {
        Self {
            displays: DisplaysConfig::default(),
            platforms: PlatformsConfig::default(),
            storage: StorageConfig::default(),
            log_filter: default_log_filter(),
        }
    }
}

impl DuetConfig {
    pub fn load_from_file(path: &Path) -> DuetResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: DuetConfig = toml::from_str(&contents)
            .map_err(|e| DuetError::Config(format!("{}: {e}", path.display())))?;
        config.validate()?;
        Ok(config)
    }

    pub fn save_to_file(&self, path: &Path) -> DuetResult<()> {
        let contents = toml::to_string_pretty(self).map_err(|e| DuetError::Config(e.to_string()))?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// The canonical display must come first and no display may repeat.
    pub fn validate(&self) -> DuetResult<()> {
        if self.displays.enabled.first() != Some(&DisplayType::canonical()) {
            return Err(DuetError::Config(
                "displays.enabled must start with the horizontal display".into(),
            ));
        }
        let mut seen = std::collections::BTreeSet::new();
        for display in &self.displays.enabled {
            if !seen.insert(display) {
                return Err(DuetError::Config(format!(
                    "display '{display}' listed twice in displays.enabled"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = DuetConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.displays.enabled, vec![DisplayType::Horizontal, DisplayType::Vertical]);
        assert_eq!(config.displays.vertical.base.height, 1280);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: DuetConfig = toml::from_str("log_filter = \"debug\"\n").unwrap();
        assert_eq!(config.log_filter, "debug");
        assert_eq!(config.platforms.assignments.len(), 4);
    }

    #[test]
    fn test_rejects_vertical_first() {
        let mut config = DuetConfig::default();
        config.displays.enabled = vec![DisplayType::Vertical, DisplayType::Horizontal];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_toml_roundtrip_through_file() {
        let path = std::env::temp_dir().join(format!("duet-config-{}.toml", std::process::id()));
        let config = DuetConfig::default();
        config.save_to_file(&path).unwrap();
        let loaded = DuetConfig::load_from_file(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(loaded.displays.horizontal, config.displays.horizontal);
        assert_eq!(loaded.storage.state_dir, config.storage.state_dir);
    }
}
