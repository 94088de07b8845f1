use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::path::Path;
use uuid::Uuid;

use crate::graph::{SceneEvent, SceneGraph};
use crate::item::SceneItem;
use crate::scene::Scene;
use crate::validate::validate_collection;
use duet_core::{DuetError, DuetResult, RenderTarget, SceneId, SceneItemId, SourceId};

/// An in-memory scene collection: the root of the scene graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneCollection {
    /// Collection name, also used to scope persisted dual output state.
    pub name: String,
    /// Ordered list of scenes.
    pub scenes: Vec<Scene>,
    /// Active scene id.
    pub active_scene: Option<SceneId>,
    #[serde(skip)]
    events: VecDeque<SceneEvent>,
}

impl SceneCollection {
    /// Create an empty collection.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            scenes: Vec::new(),
            active_scene: None,
            events: VecDeque::new(),
        }
    }

    /// Add a scene. The first scene added becomes active.
    pub fn add_scene(&mut self, scene: Scene) {
        if self.active_scene.is_none() {
            self.active_scene = Some(scene.id.clone());
        }
        self.scenes.push(scene);
    }

    pub fn get_scene(&self, id: &SceneId) -> Option<&Scene> {
        self.scenes.iter().find(|s| &s.id == id)
    }

    pub fn get_scene_mut(&mut self, id: &SceneId) -> Option<&mut Scene> {
        self.scenes.iter_mut().find(|s| &s.id == id)
    }

    /// Total number of items across all scenes.
    pub fn item_count(&self) -> usize {
        self.scenes.iter().map(|s| s.items.len()).sum()
    }

    /// Parse a collection from JSON, validate it and queue `CollectionInitialized`.
    pub fn from_json(json: &str) -> DuetResult<Self> {
        let mut collection: SceneCollection = serde_json::from_str(json)?;
        if let Err(errors) = validate_collection(&collection) {
            let joined: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            return Err(DuetError::InvalidArgument(joined.join("; ")));
        }
        collection.initialized();
        Ok(collection)
    }

    pub fn load_from_file(path: &Path) -> DuetResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    pub fn save_to_file(&self, path: &Path) -> DuetResult<()> {
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Mark the collection as loaded.
    pub fn initialized(&mut self) {
        self.events.push_back(SceneEvent::CollectionInitialized);
    }

    fn item_mut(&mut self, id: &SceneItemId) -> Option<&mut SceneItem> {
        self.scenes.iter_mut().find_map(|s| s.get_item_mut(id))
    }

    fn next_item_id() -> SceneItemId {
        SceneItemId::new(Uuid::new_v4().to_string())
    }
}

impl SceneGraph for SceneCollection {
    fn active_scene(&self) -> Option<SceneId> {
        self.active_scene.clone()
    }

    fn scene_ids(&self) -> Vec<SceneId> {
        self.scenes.iter().map(|s| s.id.clone()).collect()
    }

    fn items_in_scene(&self, scene: &SceneId) -> Option<Vec<SceneItem>> {
        self.get_scene(scene).map(|s| s.items.clone())
    }

    fn item(&self, id: &SceneItemId) -> Option<SceneItem> {
        self.scenes.iter().find_map(|s| s.get_item(id)).cloned()
    }

    fn add_source(&mut self, scene: &SceneId, source: &SourceId) -> DuetResult<SceneItemId> {
        let target = self
            .get_scene_mut(scene)
            .ok_or_else(|| DuetError::SceneNotFound(scene.clone()))?;
        let id = Self::next_item_id();
        target.add_item(SceneItem::new(id.clone(), source.clone()));
        tracing::debug!("Added source {} to scene {} as {}", source, scene, id);
        Ok(id)
    }

    fn duplicate_item(&mut self, scene: &SceneId, item: &SceneItemId) -> DuetResult<SceneItemId> {
        let original = self
            .item(item)
            .ok_or_else(|| DuetError::ItemNotFound(item.clone()))?;
        let target = self
            .get_scene_mut(scene)
            .ok_or_else(|| DuetError::SceneNotFound(scene.clone()))?;
        let id = Self::next_item_id();
        target.add_item(original.duplicate(id.clone()));
        Ok(id)
    }

    fn remove_item(&mut self, item: &SceneItemId) -> DuetResult<()> {
        self.scenes
            .iter_mut()
            .find_map(|s| s.remove_item(item))
            .map(|_| ())
            .ok_or_else(|| DuetError::ItemNotFound(item.clone()))
    }

    fn render_target(&self, item: &SceneItemId) -> Option<RenderTarget> {
        self.item(item).map(|i| i.output)
    }

    fn set_render_target(&mut self, item: &SceneItemId, target: RenderTarget) -> DuetResult<()> {
        let found = self
            .item_mut(item)
            .ok_or_else(|| DuetError::ItemNotFound(item.clone()))?;
        found.output = target;
        Ok(())
    }

    fn is_visible(&self, item: &SceneItemId) -> Option<bool> {
        self.item(item).map(|i| i.visible)
    }

    fn set_active_scene(&mut self, scene: &SceneId) -> DuetResult<()> {
        if self.get_scene(scene).is_none() {
            return Err(DuetError::SceneNotFound(scene.clone()));
        }
        if self.active_scene.as_ref() == Some(scene) {
            return Ok(());
        }
        let previous = self.active_scene.replace(scene.clone());
        self.events.push_back(SceneEvent::SceneSwitched {
            previous,
            current: scene.clone(),
        });
        Ok(())
    }

    fn remove_scene(&mut self, scene: &SceneId) -> DuetResult<()> {
        let index = self
            .scenes
            .iter()
            .position(|s| &s.id == scene)
            .ok_or_else(|| DuetError::SceneNotFound(scene.clone()))?;
        self.scenes.remove(index);

        let was_active = self.active_scene.as_ref() == Some(scene);
        self.events.push_back(SceneEvent::SceneRemoved {
            scene: scene.clone(),
            was_active,
        });

        if was_active {
            self.active_scene = self.scenes.first().map(|s| s.id.clone());
            if let Some(current) = self.active_scene.clone() {
                self.events.push_back(SceneEvent::SceneSwitched {
                    previous: Some(scene.clone()),
                    current,
                });
            }
        }
        Ok(())
    }

    fn take_events(&mut self) -> Vec<SceneEvent> {
        self.events.drain(..).collect()
    }
}
