use crate::collection::SceneCollection;
use crate::item::SceneItem;
use crate::scene::Scene;
use duet_core::{SceneId, SceneItemId, SourceId};

/// A builder for constructing a scene collection programmatically.
/// Useful for fixtures and unit testing.
pub struct CollectionBuilder {
    collection: SceneCollection,
}

impl CollectionBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            collection: SceneCollection::new(name),
        }
    }

    /// Add a scene with `(item id, source id)` pairs, bottom to top.
    pub fn scene(mut self, id: &str, items: &[(&str, &str)]) -> Self {
        let mut scene = Scene::new(SceneId::new(id));
        for (item, source) in items {
            scene.add_item(SceneItem::new(SceneItemId::new(*item), SourceId::new(*source)));
        }
        self.collection.add_scene(scene);
        self
    }

    /// Override which scene is active.
    pub fn active(mut self, id: &str) -> Self {
        self.collection.active_scene = Some(SceneId::new(id));
        self
    }

    /// Build the collection without queueing any events.
    pub fn build(self) -> SceneCollection {
        self.collection
    }
}
