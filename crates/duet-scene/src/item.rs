use serde::{Deserialize, Serialize};

use duet_core::{RenderTarget, SceneItemId, SourceId};

/// Position, scale and rotation of an item on its canvas.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ItemTransform {
    pub x: f64,
    pub y: f64,
    pub scale_x: f64,
    pub scale_y: f64,
    /// Rotation in degrees.
    pub rotation: f64,
}

impl Default for ItemTransform {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            scale_x: 1.0,
            scale_y: 1.0,
            rotation: 0.0,
        }
    }
}

/// A node in a scene: one placement of a source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneItem {
    /// Unique item identifier.
    pub id: SceneItemId,
    /// Source this item renders. Duplicates share the source.
    pub source_id: SourceId,
    #[serde(default = "default_visible")]
    pub visible: bool,
    #[serde(default)]
    pub transform: ItemTransform,
    /// Context this item renders into.
    #[serde(default)]
    pub output: RenderTarget,
}

fn default_visible() -> bool {
    true
}

impl SceneItem {
    /// Create a visible item rendering into the default context.
    pub fn new(id: SceneItemId, source_id: SourceId) -> Self {
        Self {
            id,
            source_id,
            visible: true,
            transform: ItemTransform::default(),
            output: RenderTarget::Default,
        }
    }

    /// Copy of this item under a new id. Settings are carried over.
    pub fn duplicate(&self, id: SceneItemId) -> Self {
        Self {
            id,
            ..self.clone()
        }
    }
}
