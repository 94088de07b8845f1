//! # duet-output
//!
//! The dual-output coordinator. A single authored scene is rendered into a
//! horizontal and a vertical context at the same time; this crate owns the
//! contexts, keeps their video settings timing-consistent, and maintains the
//! per-display node maps that tie every vertical duplicate back to its
//! canonical horizontal item.

pub mod backend;
pub mod context;
pub mod coordinator;
pub mod node_map;
pub mod platform;
pub mod state;
pub mod synchronizer;

pub use backend::{HeadlessBackend, RenderBackend};
pub use context::ContextStore;
pub use coordinator::{DualOutputCoordinator, Phase};
pub use node_map::{NodeMap, NodeMaps};
pub use platform::PlatformAssignments;
pub use state::{DualOutputState, JsonFileStore, MemoryStore, SettingsStore};
pub use synchronizer::{ResolvedSettings, SettingsSource};
