use serde::{Deserialize, Serialize};

use crate::item::SceneItem;
use duet_core::{SceneId, SceneItemId};

/// A scene: an ordered list of items (bottom to top).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scene {
    /// Unique scene identifier.
    pub id: SceneId,
    /// Display name.
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub items: Vec<SceneItem>,
}

impl Scene {
    /// Create a new empty scene.
    pub fn new(id: SceneId) -> Self {
        let name = id.to_string();
        Self {
            id,
            name,
            items: Vec::new(),
        }
    }

    /// Add an item on top of the scene.
    pub fn add_item(&mut self, item: SceneItem) {
        self.items.push(item);
    }

    /// Get an item by its ID.
    pub fn get_item(&self, id: &SceneItemId) -> Option<&SceneItem> {
        self.items.iter().find(|i| &i.id == id)
    }

    /// Get a mutable reference to an item by its ID.
    pub fn get_item_mut(&mut self, id: &SceneItemId) -> Option<&mut SceneItem> {
        self.items.iter_mut().find(|i| &i.id == id)
    }

    /// Remove an item, returning it if it was present.
    pub fn remove_item(&mut self, id: &SceneItemId) -> Option<SceneItem> {
        let index = self.items.iter().position(|i| &i.id == id)?;
        Some(self.items.remove(index))
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use duet_core::SourceId;

    #[test]
    fn test_scene_creation() {
        let scene = Scene::new(SceneId::new("intro"));
        assert_eq!(scene.name, "intro");
        assert!(scene.is_empty());
    }

    #[test]
    fn test_scene_add_get_remove_item() {
        let mut scene = Scene::new(SceneId::new("main"));
        scene.add_item(SceneItem::new(SceneItemId::new("cam"), SourceId::new("webcam")));
        assert!(scene.get_item(&SceneItemId::new("cam")).is_some());
        assert!(scene.get_item(&SceneItemId::new("nope")).is_none());

        let removed = scene.remove_item(&SceneItemId::new("cam")).unwrap();
        assert_eq!(removed.source_id, SourceId::new("webcam"));
        assert!(scene.is_empty());
        assert!(scene.remove_item(&SceneItemId::new("cam")).is_none());
    }
}
