use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use crate::node_map::NodeMaps;
use crate::platform::PlatformAssignments;
use duet_core::{DisplayType, DuetConfig, DuetResult, VideoContextSettings};

/// Everything the coordinator persists between runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DualOutputState {
    pub mode_enabled: bool,
    /// Displays brought up when dual output is on.
    pub displays: BTreeSet<DisplayType>,
    #[serde(default)]
    pub per_display_settings: BTreeMap<DisplayType, VideoContextSettings>,
    /// Absent whenever dual output is off.
    #[serde(default)]
    pub node_maps: Option<NodeMaps>,
    #[serde(default)]
    pub platform_assignments: PlatformAssignments,
    #[serde(default)]
    pub selective_recording: bool,
}

impl DualOutputState {
    /// First-run state: mode off, no node maps, no settings yet.
    pub fn from_config(config: &DuetConfig) -> Self {
        Self {
            mode_enabled: false,
            displays: config.displays.enabled.iter().copied().collect(),
            per_display_settings: BTreeMap::new(),
            node_maps: None,
            platform_assignments: PlatformAssignments::new(config.platforms.assignments.clone()),
            selective_recording: false,
        }
    }
}

impl Default for DualOutputState {
    fn default() -> Self {
        Self::from_config(&DuetConfig::default())
    }
}

/// Persistence for [`DualOutputState`].
pub trait SettingsStore {
    /// `Ok(None)` on first run.
    fn load(&self) -> DuetResult<Option<DualOutputState>>;

    fn save(&mut self, state: &DualOutputState) -> DuetResult<()>;
}

/// Keeps the last saved state in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    saved: Option<DualOutputState>,
    saves: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_state(state: DualOutputState) -> Self {
        Self {
            saved: Some(state),
            saves: 0,
        }
    }

    pub fn saved(&self) -> Option<&DualOutputState> {
        self.saved.as_ref()
    }

    pub fn save_count(&self) -> usize {
        self.saves
    }
}

impl SettingsStore for MemoryStore {
    fn load(&self) -> DuetResult<Option<DualOutputState>> {
        Ok(self.saved.clone())
    }

    fn save(&mut self, state: &DualOutputState) -> DuetResult<()> {
        self.saved = Some(state.clone());
        self.saves += 1;
        Ok(())
    }
}

/// One JSON file per scene collection.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<state_dir>/<collection>.dual-output.json`
    pub fn for_collection(state_dir: &Path, collection: &str) -> Self {
        let file: String = collection
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        Self::new(state_dir.join(format!("{file}.dual-output.json")))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SettingsStore for JsonFileStore {
    fn load(&self) -> DuetResult<Option<DualOutputState>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(&self.path)?;
        Ok(Some(serde_json::from_str(&contents)?))
    }

    fn save(&mut self, state: &DualOutputState) -> DuetResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let contents = serde_json::to_string_pretty(state)?;
        std::fs::write(&self.path, contents)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use duet_core::{PlatformId, SceneId, SceneItemId};

    #[test]
    fn test_first_run_state() {
        let state = DualOutputState::default();
        assert!(!state.mode_enabled);
        assert!(state.node_maps.is_none());
        assert!(state.per_display_settings.is_empty());
        assert_eq!(
            state.platform_assignments.get(&PlatformId::new("twitch")),
            Some(DisplayType::Horizontal)
        );
    }

    #[test]
    fn test_json_file_store_roundtrip() {
        let dir = std::env::temp_dir().join(format!("duet-state-{}", uuid::Uuid::new_v4()));
        let mut store = JsonFileStore::for_collection(&dir, "My Show");
        assert!(store.path().ends_with("My_Show.dual-output.json"));
        assert!(store.load().unwrap().is_none());

        let mut state = DualOutputState::default();
        state.mode_enabled = true;
        state
            .per_display_settings
            .insert(DisplayType::Vertical, VideoContextSettings::portrait_720p());
        let mut maps = NodeMaps::new(Some(SceneId::new("main")));
        maps.put(DisplayType::Vertical, SceneItemId::new("a"), SceneItemId::new("b"));
        state.node_maps = Some(maps);

        store.save(&state).unwrap();
        let loaded = store.load().unwrap().unwrap();
        std::fs::remove_dir_all(&dir).ok();
        assert_eq!(loaded, state);
    }

    #[test]
    fn test_memory_store_counts_saves() {
        let mut store = MemoryStore::new();
        store.save(&DualOutputState::default()).unwrap();
        store.save(&DualOutputState::default()).unwrap();
        assert_eq!(store.save_count(), 2);
        assert!(store.load().unwrap().is_some());
    }
}
