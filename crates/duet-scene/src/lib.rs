//! # duet-scene
//!
//! The scene graph the dual-output coordinator works against: scenes made of
//! scene items, the [`SceneGraph`] collaborator trait, and an in-memory
//! [`SceneCollection`] that implements it.
//!
//! The collaborator queues a [`SceneEvent`] after every state change it
//! makes (scene switched, scene removed, collection loaded). The coordinator
//! drains the queue, so hooks always observe a fully updated graph.

pub mod builder;
pub mod collection;
pub mod graph;
pub mod item;
pub mod scene;
pub mod validate;

pub use builder::CollectionBuilder;
pub use collection::SceneCollection;
pub use graph::{SceneEvent, SceneGraph};
pub use item::{ItemTransform, SceneItem};
pub use scene::Scene;
