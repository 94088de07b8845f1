use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use duet_core::DuetConfig;
use duet_output::{DualOutputCoordinator, HeadlessBackend, JsonFileStore};
use duet_scene::SceneCollection;

pub type Coordinator = DualOutputCoordinator<SceneCollection, HeadlessBackend, JsonFileStore>;

/// One CLI invocation: a loaded collection driven by a coordinator whose
/// state lives next to it on disk.
pub struct Session {
    collection_path: PathBuf,
    pub coordinator: Coordinator,
}

impl Session {
    pub fn open(collection_path: &Path, config: &DuetConfig, state_dir: &Path) -> Result<Self> {
        let collection = SceneCollection::load_from_file(collection_path)
            .with_context(|| format!("failed to load collection: {}", collection_path.display()))?;
        let store = JsonFileStore::for_collection(state_dir, &collection.name);
        tracing::debug!("Dual output state file: {}", store.path().display());

        let backend = HeadlessBackend::new(config.displays.clone());
        let coordinator = DualOutputCoordinator::new(collection, backend, store, config)
            .context("failed to start the dual output coordinator")?;

        Ok(Self {
            collection_path: collection_path.to_path_buf(),
            coordinator,
        })
    }

    /// Write the collection back and release every context.
    pub fn close(mut self) -> Result<()> {
        self.coordinator
            .graph()
            .save_to_file(&self.collection_path)
            .with_context(|| format!("failed to write collection: {}", self.collection_path.display()))?;
        self.coordinator
            .shutdown()
            .context("failed to persist dual output state")?;
        Ok(())
    }
}
