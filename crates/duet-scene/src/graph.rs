use serde::{Deserialize, Serialize};

use crate::item::SceneItem;
use duet_core::{DuetResult, RenderTarget, SceneId, SceneItemId, SourceId};

/// Notification queued by a [`SceneGraph`] after it applied a change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SceneEvent {
    /// A scene collection finished loading.
    CollectionInitialized,
    /// The active scene changed from `previous` to `current`.
    SceneSwitched {
        previous: Option<SceneId>,
        current: SceneId,
    },
    /// A scene was removed from the collection.
    SceneRemoved { scene: SceneId, was_active: bool },
}

/// The scene graph service the coordinator consumes.
///
/// Implementations must queue events only after the change they describe
/// is fully applied, so a hook never sees a half-updated scene.
pub trait SceneGraph {
    /// Currently active scene, if any.
    fn active_scene(&self) -> Option<SceneId>;

    /// All scenes in collection order.
    fn scene_ids(&self) -> Vec<SceneId>;

    /// Snapshot of a scene's items, `None` if the scene does not exist.
    fn items_in_scene(&self, scene: &SceneId) -> Option<Vec<SceneItem>>;

    /// Whether the scene exists and has at least one item.
    fn has_items(&self, scene: &SceneId) -> bool {
        self.items_in_scene(scene)
            .map(|items| !items.is_empty())
            .unwrap_or(false)
    }

    /// Look up an item anywhere in the collection.
    fn item(&self, id: &SceneItemId) -> Option<SceneItem>;

    /// Add a new item for `source` on top of `scene`.
    fn add_source(&mut self, scene: &SceneId, source: &SourceId) -> DuetResult<SceneItemId>;

    /// Add a copy of `item` (same source, same settings) to `scene`.
    fn duplicate_item(&mut self, scene: &SceneId, item: &SceneItemId) -> DuetResult<SceneItemId>;

    fn remove_item(&mut self, item: &SceneItemId) -> DuetResult<()>;

    fn render_target(&self, item: &SceneItemId) -> Option<RenderTarget>;

    fn set_render_target(&mut self, item: &SceneItemId, target: RenderTarget) -> DuetResult<()>;

    fn is_visible(&self, item: &SceneItemId) -> Option<bool>;

    fn set_active_scene(&mut self, scene: &SceneId) -> DuetResult<()>;

    fn remove_scene(&mut self, scene: &SceneId) -> DuetResult<()>;

    /// Drain queued notifications, oldest first.
    fn take_events(&mut self) -> Vec<SceneEvent>;
}
